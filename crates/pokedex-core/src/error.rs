// ── Core error types ──
//
// User-facing errors from pokedex-core. Consumers never see HTTP status
// codes or JSON decode failures directly; `From<pokedex_api::Error>`
// folds transport-layer errors into this taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested entity or page is absent.
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// The operation needs a signed-in user id and none is available.
    #[error("Sign-in required to {operation}")]
    Unauthenticated { operation: String },

    /// Network or service error from any remote client.
    #[error("Remote service error: {message}")]
    RemoteFailure {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    /// Malformed input (non-numeric id, bad email, ...).
    #[error("Invalid {field}: {reason}")]
    ValidationFailure { field: String, reason: String },

    /// The caller gave up waiting.
    #[error("{operation} was cancelled")]
    Cancelled { operation: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteFailure {
            message: message.into(),
            status: None,
        }
    }

    pub fn unauthenticated(operation: impl Into<String>) -> Self {
        Self::Unauthenticated {
            operation: operation.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationFailure {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pokedex_api::Error> for CoreError {
    fn from(err: pokedex_api::Error) -> Self {
        match err {
            pokedex_api::Error::NotFound {
                resource,
                identifier,
            } => CoreError::NotFound {
                entity_type: resource.into(),
                identifier,
            },
            pokedex_api::Error::SessionMissing => CoreError::Unauthenticated {
                operation: "use the current session".into(),
            },
            pokedex_api::Error::Authentication { message } => CoreError::RemoteFailure {
                message,
                status: None,
            },
            pokedex_api::Error::Rest {
                status: 404,
                message,
                ..
            } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            pokedex_api::Error::Rest {
                status, message, ..
            } => CoreError::RemoteFailure {
                message,
                status: Some(status),
            },
            pokedex_api::Error::Transport(ref e) => CoreError::RemoteFailure {
                message: err.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            pokedex_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            pokedex_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            pokedex_api::Error::Deserialization { message, body: _ } => {
                CoreError::RemoteFailure {
                    message: format!("Unexpected response: {message}"),
                    status: None,
                }
            }
        }
    }
}
