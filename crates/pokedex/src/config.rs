//! CLI configuration: thin wrapper around `pokedex_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --anon-key, --timeout, --output).

use clap::ValueEnum;
use secrecy::SecretString;

use pokedex_core::{BackendConfig, CoreConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use pokedex_config::{Config, config_path, load_config, load_config_or_default, save_config};

/// Everything a backend-backed command needs, flags applied.
#[derive(Debug)]
pub struct Resolved {
    pub backend: BackendConfig,
    pub core: CoreConfig,
    pub output: OutputFormat,
    pub remember_session: bool,
}

/// Load the config file + env and layer the global flags on top.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let mut cfg = load_config()?;
    apply_overrides(&mut cfg, global);

    let mut backend = pokedex_config::backend_config(&cfg)?;
    if let Some(ref key) = global.anon_key {
        backend.anon_key = SecretString::from(key.clone());
    }

    Ok(Resolved {
        backend,
        core: pokedex_config::core_config(&cfg)?,
        output: output_format(global, &cfg),
        remember_session: cfg.defaults.remember_session,
    })
}

/// Flag > config default > table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref url) = global.url {
        cfg.backend.url = Some(url.clone());
    }
    // The flag wins over the keyring; plaintext here only satisfies the
    // presence check, `resolve` swaps the real value in afterwards.
    if let Some(ref key) = global.anon_key {
        cfg.backend.anon_key = Some(key.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.backend.timeout = Some(timeout);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["pokedex"];
        argv.extend_from_slice(args);
        argv.push("logout");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn output_flag_beats_config_default() {
        let mut cfg = Config::default();
        cfg.defaults.output = "plain".into();

        assert_eq!(output_format(&global(&[]), &cfg), OutputFormat::Plain);
        assert_eq!(
            output_format(&global(&["-o", "json"]), &cfg),
            OutputFormat::Json
        );
    }

    #[test]
    fn unknown_config_output_falls_back_to_table() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();
        assert_eq!(output_format(&global(&[]), &cfg), OutputFormat::Table);
    }

    #[test]
    fn flags_override_backend_section() {
        let mut cfg = Config::default();
        cfg.backend.url = Some("https://old.example".into());
        apply_overrides(
            &mut cfg,
            &global(&["--url", "https://new.example", "--timeout", "5"]),
        );
        assert_eq!(cfg.backend.url.as_deref(), Some("https://new.example"));
        assert_eq!(cfg.backend.timeout, Some(5));
    }
}
