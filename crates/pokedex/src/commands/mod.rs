//! Command dispatch and the per-invocation session.

pub mod auth;
pub mod catalog;
pub mod config_cmd;
pub mod favorites;
pub mod visit;

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, warn};

use pokedex_core::{AppContext, SupabaseClient};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

/// State shared by every backend-backed command.
pub struct Session {
    pub app: AppContext,
    pub client: Arc<SupabaseClient>,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub remember_session: bool,
}

impl Session {
    /// Build the backend client and, when enabled, resume the session
    /// remembered by the last sign-in.
    pub async fn connect(resolved: Resolved, global: &GlobalOpts) -> Result<Self, CliError> {
        let client = Arc::new(
            SupabaseClient::new(&resolved.backend).map_err(pokedex_core::CoreError::from)?,
        );

        if resolved.remember_session {
            if let Some(token) = pokedex_config::load_refresh_token() {
                match client.restore_session(&token).await {
                    Ok(_) => {
                        debug!("resumed remembered session");
                        remember(&client);
                    }
                    Err(e) => {
                        warn!(error = %e, "remembered session rejected, discarding it");
                        if let Err(e) = pokedex_config::clear_refresh_token() {
                            warn!(error = %e, "failed to clear remembered session");
                        }
                    }
                }
            }
        }

        Ok(Self {
            app: AppContext::from_client(resolved.core, Arc::clone(&client)),
            client,
            output: resolved.output,
            color: output::should_color(global.color),
            quiet: global.quiet,
            remember_session: resolved.remember_session,
        })
    }

    /// Persist the client's current refresh token, if remembering is on.
    pub fn remember_current(&self) {
        if self.remember_session {
            remember(&self.client);
        }
    }

    pub fn status(&self, message: &str) {
        output::status(message, self.quiet);
    }

    /// Bring auth and the catalog up together, then load favorites for a
    /// signed-in user. A favorites failure only costs the star markers.
    pub async fn bootstrap(&self) -> Result<(), CliError> {
        let (snapshot, catalog) = tokio::join!(
            self.app.auth().initialize(),
            self.app.catalog().initialize_store()
        );
        catalog?;
        if snapshot.is_authenticated() {
            if let Err(e) = self.app.favorites().load().await {
                warn!(error = %e, "could not load favorites");
            }
        }
        Ok(())
    }
}

fn remember(client: &SupabaseClient) {
    let Some(session) = client.session() else {
        return;
    };
    if let Err(e) = pokedex_config::store_refresh_token(session.refresh_token.expose_secret()) {
        warn!(error = %e, "could not remember session");
    }
}

/// Route a backend-backed command to its handler.
pub async fn dispatch(cmd: Command, session: &Session) -> Result<(), CliError> {
    let result = match cmd {
        Command::List(args) => catalog::list(session, &args).await,
        Command::Show(args) => catalog::show(session, &args).await,
        Command::Login(args) => auth::login(session, args).await,
        Command::Signup(args) => auth::signup(session, args).await,
        Command::Logout => auth::logout(session).await,
        Command::Favorites(args) => favorites::handle(session, args).await,
        Command::Visit(args) => visit::handle(session, &args).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before a backend session is built")
        }
    };
    session.app.shutdown().await;
    result
}
