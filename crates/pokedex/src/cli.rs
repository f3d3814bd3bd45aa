//! Clap derive structures for the `pokedex` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// pokedex -- browse the catalog and keep a list of favorites
#[derive(Debug, Parser)]
#[command(
    name = "pokedex",
    version,
    about = "Browse the Pokedex catalog from the command line",
    long_about = "Page through the catalog, look up individual entries, and manage\n\
        favorites for a signed-in account.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend URL (overrides config)
    #[arg(long, env = "POKEDEX_URL", global = true)]
    pub url: Option<String>,

    /// Backend anon key (overrides config and keyring)
    #[arg(long, env = "POKEDEX_ANON_KEY", global = true, hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "POKEDEX_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "POKEDEX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List one page of the catalog
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a single catalog entry
    Show(ShowArgs),

    /// Sign in with email and password
    Login(CredentialArgs),

    /// Create an account
    Signup(CredentialArgs),

    /// Sign out and forget the remembered session
    Logout,

    /// Inspect or change favorites (requires sign-in)
    #[command(alias = "fav")]
    Favorites(FavoritesArgs),

    /// Check whether a route would be allowed or redirected to login
    Visit(VisitArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Catalog id (national dex number)
    pub id: String,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Args)]
pub struct CredentialArgs {
    /// Account email (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(long, env = "POKEDEX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

// ── Favorites ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FavoritesArgs {
    #[command(subcommand)]
    pub command: FavoritesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorited entries
    #[command(alias = "ls")]
    List,

    /// Add an entry to favorites, or remove it if already present
    Toggle {
        /// Catalog id
        id: String,
    },
}

// ── Routing ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VisitArgs {
    /// Route path, e.g. /favorites
    pub path: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
