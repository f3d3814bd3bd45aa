//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use pokedex_config::ConfigError;
use pokedex_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const CANCELLED: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Setup ────────────────────────────────────────────────────────

    #[error("Backend is not configured")]
    #[diagnostic(
        code(pokedex::no_config),
        help(
            "Create a config with: pokedex config init\n\
             Or set POKEDEX_URL and POKEDEX_ANON_KEY.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(pokedex::config))]
    Config(ConfigError),

    // ── Authentication ───────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(pokedex::auth_failed),
        help("Check the email and password, then try: pokedex login")
    )]
    AuthFailed { message: String },

    #[error("Sign-in required to {operation}")]
    #[diagnostic(code(pokedex::not_signed_in), help("Sign in first with: pokedex login"))]
    NotSignedIn { operation: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(pokedex::not_found),
        help("Run: pokedex list to browse the catalog")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(pokedex::validation))]
    Validation { field: String, reason: String },

    // ── Remote ───────────────────────────────────────────────────────

    #[error("Backend request failed: {message}")]
    #[diagnostic(
        code(pokedex::remote),
        help("Check that the backend URL is reachable. Re-run with -v for details.")
    )]
    Remote {
        message: String,
        status: Option<u16>,
    },

    #[error("{operation} was cancelled")]
    #[diagnostic(code(pokedex::cancelled))]
    Cancelled { operation: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(pokedex::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NotSignedIn { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::Remote { status: None, .. } => exit_code::CONNECTION,
            Self::Cancelled { .. } => exit_code::CANCELLED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::Unauthenticated { operation } => CliError::NotSignedIn { operation },
            CoreError::RemoteFailure { message, status } => CliError::Remote { message, status },
            CoreError::ValidationFailure { field, reason } => CliError::Validation { field, reason },
            CoreError::Cancelled { operation } => CliError::Cancelled { operation },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingBackend => CliError::NoConfig {
                path: pokedex_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
