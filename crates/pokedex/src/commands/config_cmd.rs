//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "[backend]");
    if let Some(ref url) = cfg.backend.url {
        let _ = writeln!(out, "url = \"{url}\"");
    }
    if cfg.backend.anon_key.is_some() {
        let _ = writeln!(out, "anon_key = \"****\"");
    }
    if let Some(ref env) = cfg.backend.anon_key_env {
        let _ = writeln!(out, "anon_key_env = \"{env}\"");
    }
    if let Some(ref ca) = cfg.backend.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
    }
    if let Some(timeout) = cfg.backend.timeout {
        let _ = writeln!(out, "timeout = {timeout}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[catalog]");
    let _ = writeln!(out, "items_per_page = {}", cfg.catalog.items_per_page);
    let _ = writeln!(out, "serialize_toggles = {}", cfg.catalog.serialize_toggles);

    let _ = writeln!(out);
    let _ = writeln!(out, "[routes]");
    let public: Vec<String> = cfg.routes.public.iter().map(|r| format!("\"{r}\"")).collect();
    let _ = writeln!(out, "public = [{}]", public.join(", "));
    let _ = writeln!(out, "login = \"{}\"", cfg.routes.login);
    if let Some(secs) = cfg.routes.guard_timeout_secs {
        let _ = writeln!(out, "guard_timeout_secs = {secs}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = write!(out, "remember_session = {}", cfg.defaults.remember_session);

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub(crate) fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Offer to store the anon key in the system keyring.
///
/// Returns `Some(key)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(key: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the anon key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        pokedex_config::store_anon_key(key)?;
        eprintln!("   ✓ anon key stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(key.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let config_path = config::config_path();
    eprintln!("Pokedex CLI configuration");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Backend URL
    let mut url_prompt = Input::<String>::new().with_prompt("Backend URL");
    if let Some(url) = global.url.clone().or_else(|| cfg.backend.url.clone()) {
        url_prompt = url_prompt.default(url);
    }
    let url = url_prompt.interact_text().map_err(prompt_err)?;
    if url::Url::parse(&url).is_err() {
        return Err(CliError::Validation {
            field: "backend.url".into(),
            reason: format!("invalid URL: {url}"),
        });
    }
    cfg.backend.url = Some(url);

    // 2. Anon key
    let key = match global.anon_key {
        Some(ref key) => key.clone(),
        None => rpassword::prompt_password("Anon key: ").map_err(prompt_err)?,
    };
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "anon_key".into(),
            reason: "anon key cannot be empty".into(),
        });
    }
    cfg.backend.anon_key = prompt_keyring_storage(&key)?;

    // 3. Page size
    cfg.catalog.items_per_page = Input::new()
        .with_prompt("Entries per page")
        .default(cfg.catalog.items_per_page)
        .validate_with(|n: &u32| if *n == 0 { Err("must be at least 1") } else { Ok(()) })
        .interact_text()
        .map_err(prompt_err)?;

    // 4. Remember sign-in
    cfg.defaults.remember_session = Confirm::new()
        .with_prompt("Remember sign-in between runs (system keyring)?")
        .default(cfg.defaults.remember_session)
        .interact()
        .map_err(prompt_err)?;

    let path = config::save_config(&cfg)?;
    eprintln!("\n   ✓ Configuration saved to {}", path.display());
    eprintln!("   Try: pokedex list");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_output_masks_anon_key() {
        let mut cfg = Config::default();
        cfg.backend.url = Some("https://abc.supabase.co".into());
        cfg.backend.anon_key = Some("super-secret".into());

        let text = format_config_redacted(&cfg);
        assert!(text.contains("url = \"https://abc.supabase.co\""));
        assert!(text.contains("anon_key = \"****\""));
        assert!(!text.contains("super-secret"));
        assert!(text.contains("items_per_page = 30"));
    }
}
