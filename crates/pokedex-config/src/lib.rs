//! Shared configuration for Pokedex tools.
//!
//! TOML file + `POKEDEX_*` environment overrides, anon-key resolution
//! (env + keyring + plaintext), the remembered session token, and
//! translation to `pokedex_core::{BackendConfig, CoreConfig}`.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use pokedex_core::{BackendConfig, CoreConfig, TransportConfig};

const KEYRING_SERVICE: &str = "pokedex";
const ANON_KEY_ENTRY: &str = "backend/anon-key";
const REFRESH_TOKEN_ENTRY: &str = "session/refresh-token";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("backend URL and anon key are required")]
    MissingBackend,

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSection,

    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub routes: RoutesSection,

    #[serde(default)]
    pub defaults: Defaults,
}

/// Where the hosted backend lives and how to reach it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendSection {
    /// Project URL (e.g. "https://xyzcompany.supabase.co").
    pub url: Option<String>,

    /// Anon key in plaintext. Prefer the keyring or an env var.
    pub anon_key: Option<String>,

    /// Environment variable name containing the anon key.
    pub anon_key_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the default request timeout.
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSection {
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u32,

    /// Serialize concurrent favorite toggles per pokemon.
    #[serde(default)]
    pub serialize_toggles: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            serialize_toggles: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutesSection {
    #[serde(default = "default_public_routes")]
    pub public: Vec<String>,

    #[serde(default = "default_login_route")]
    pub login: String,

    /// Give up waiting for auth after this many seconds.
    pub guard_timeout_secs: Option<u64>,
}

impl Default for RoutesSection {
    fn default() -> Self {
        Self {
            public: default_public_routes(),
            login: default_login_route(),
            guard_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Keep the refresh token in the system keyring between runs.
    #[serde(default = "default_true")]
    pub remember_session: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            remember_session: true,
        }
    }
}

fn default_items_per_page() -> u32 {
    CoreConfig::default().items_per_page.get()
}
fn default_public_routes() -> Vec<String> {
    CoreConfig::default().public_routes
}
fn default_login_route() -> String {
    CoreConfig::default().login_route
}
fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `POKEDEX_CONFIG`, else platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("POKEDEX_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "pokedex", "pokedex").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("pokedex");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the config file, then `POKEDEX_*` env vars
/// (`POKEDEX_BACKEND__URL` sets `backend.url`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("POKEDEX_").split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_from(figment_for(&config_path()))
}

/// Extract a Config from an arbitrary figment.
pub fn load_from(figment: Figment) -> Result<Config, ConfigError> {
    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the anon key: named env var, then keyring, then plaintext.
pub fn resolve_anon_key(backend: &BackendSection) -> Option<SecretString> {
    if let Some(ref env_name) = backend.anon_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, ANON_KEY_ENTRY) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    backend
        .anon_key
        .as_ref()
        .map(|key| SecretString::from(key.clone()))
}

/// Store the anon key in the system keyring.
pub fn store_anon_key(key: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, ANON_KEY_ENTRY)?.set_password(key)?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

/// Build the backend client config. Fails unless both the URL and an
/// anon key are available.
pub fn backend_config(cfg: &Config) -> Result<BackendConfig, ConfigError> {
    let (Some(raw_url), Some(anon_key)) = (
        cfg.backend.url.as_deref(),
        resolve_anon_key(&cfg.backend),
    ) else {
        return Err(ConfigError::MissingBackend);
    };

    let url: url::Url = raw_url.parse().map_err(|_| ConfigError::Validation {
        field: "backend.url".into(),
        reason: format!("invalid URL: {raw_url}"),
    })?;

    let timeout = Duration::from_secs(cfg.backend.timeout.unwrap_or(cfg.defaults.timeout));
    Ok(BackendConfig {
        url,
        anon_key,
        transport: TransportConfig {
            timeout,
            ca_cert: cfg.backend.ca_cert.clone(),
            ..TransportConfig::default()
        },
    })
}

/// Build the state-layer config, validating page size and routes.
pub fn core_config(cfg: &Config) -> Result<CoreConfig, ConfigError> {
    let items_per_page =
        NonZeroU32::new(cfg.catalog.items_per_page).ok_or_else(|| ConfigError::Validation {
            field: "catalog.items_per_page".into(),
            reason: "must be at least 1".into(),
        })?;

    for route in cfg
        .routes
        .public
        .iter()
        .chain(std::iter::once(&cfg.routes.login))
    {
        if !route.starts_with('/') {
            return Err(ConfigError::Validation {
                field: "routes".into(),
                reason: format!("'{route}' must start with '/'"),
            });
        }
    }

    Ok(CoreConfig {
        items_per_page,
        public_routes: cfg.routes.public.clone(),
        login_route: cfg.routes.login.clone(),
        guard_timeout: cfg.routes.guard_timeout_secs.map(Duration::from_secs),
        serialize_toggles: cfg.catalog.serialize_toggles,
    })
}

// ── Remembered session ──────────────────────────────────────────────

/// The refresh token saved by the last sign-in, if any.
pub fn load_refresh_token() -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, REFRESH_TOKEN_ENTRY).ok()?;
    match entry.get_password() {
        Ok(token) => Some(SecretString::from(token)),
        Err(e) => {
            debug!(error = %e, "no remembered session");
            None
        }
    }
}

pub fn store_refresh_token(token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, REFRESH_TOKEN_ENTRY)?.set_password(token)?;
    Ok(())
}

/// Forget the remembered session. Missing entries are not an error.
pub fn clear_refresh_token() -> Result<(), ConfigError> {
    match keyring::Entry::new(KEYRING_SERVICE, REFRESH_TOKEN_ENTRY)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
