use thiserror::Error;

/// Top-level error type for the `pokedex-api` crate.
///
/// Covers every failure mode of the backend surfaces: auth, row queries,
/// transport and decoding. `pokedex-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credential exchange rejected (wrong password, unconfirmed email, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The operation needs a held session but none is present.
    #[error("No active session")]
    SessionMissing,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Rows ────────────────────────────────────────────────────────
    /// Structured error returned by the REST layer.
    #[error("Backend error (HTTP {status}): {message}")]
    Rest {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A single-row query matched nothing.
    #[error("{resource} {identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Rest { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Rest { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::SessionMissing
                | Self::Rest {
                    status: 401 | 403,
                    ..
                }
        )
    }

    /// Extract the backend error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Rest { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
