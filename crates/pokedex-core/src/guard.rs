// ── Route guard ──
//
// Decides whether a navigation proceeds or is sent to the login route.
// Public routes never wait on auth; everything else waits for the auth
// gate, optionally bounded by a timeout or a cancellation token. There is
// no error outcome: anything short of a confirmed session redirects.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::auth::AuthSessionManager;
use crate::config::CoreConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect { to: String },
}

impl Navigation {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

#[derive(Debug)]
pub struct RouteGuard {
    auth: Arc<AuthSessionManager>,
    public_routes: Vec<String>,
    login_route: String,
    timeout: Option<Duration>,
}

impl RouteGuard {
    pub fn new(auth: Arc<AuthSessionManager>, config: &CoreConfig) -> Self {
        Self {
            auth,
            public_routes: config.public_routes.clone(),
            login_route: config.login_route.clone(),
            timeout: config.guard_timeout,
        }
    }

    /// Path matches the allow-list. Query string, fragment and trailing
    /// slash are ignored; an entry ending in `/*` covers its subtree.
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public_routes.iter().any(|route| {
            if let Some(prefix) = route.strip_suffix("/*") {
                let prefix = prefix.trim_end_matches('/');
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            } else {
                path == normalize(route)
            }
        })
    }

    pub async fn check(&self, path: &str) -> Navigation {
        self.check_with_cancel(path, &CancellationToken::new())
            .await
    }

    /// Like [`check`](Self::check); a fired `cancel` ends the wait with
    /// a redirect.
    pub async fn check_with_cancel(&self, path: &str, cancel: &CancellationToken) -> Navigation {
        if self.is_public(path) {
            debug!(path, "public route");
            return Navigation::Proceed;
        }

        let wait = self.auth.wait_for_initialization_with(cancel);
        let ready = match self.timeout {
            Some(limit) => {
                let Ok(ready) = tokio::time::timeout(limit, wait).await else {
                    warn!(path, ?limit, "auth not ready in time, redirecting");
                    return self.redirect(path);
                };
                ready
            }
            None => wait.await,
        };

        match ready {
            Ok(_) if self.auth.is_authenticated() => Navigation::Proceed,
            Ok(_) => {
                debug!(path, "not signed in, redirecting");
                self.redirect(path)
            }
            Err(e) => {
                warn!(path, error = %e, "auth wait abandoned, redirecting");
                self.redirect(path)
            }
        }
    }

    /// `<login>?redirect=<percent-encoded path>`.
    pub fn login_redirect(&self, path: &str) -> String {
        let target = path.split(['?', '#']).next().unwrap_or(path);
        let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}?redirect={encoded}", self.login_route)
    }

    fn redirect(&self, path: &str) -> Navigation {
        Navigation::Redirect {
            to: self.login_redirect(path),
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
