// Backend HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, the `apikey` /
// bearer header pair, and error-body decoding. Endpoint groups
// (pokemon rows, auth, favorites) are inherent methods implemented in
// sibling modules to keep this file focused on transport mechanics.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{SessionEvent, SessionEventKind};
use crate::error::Error;
use crate::models::SessionData;
use crate::transport::TransportConfig;

const SESSION_EVENT_CAPACITY: usize = 32;

/// Error body shapes used by the REST (`code`, `message`) and auth
/// (`error_description`, `msg`) layers.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub(crate) fn code_string(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub(crate) fn best_message(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
    }
}

/// Where the backend lives and how to reach it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL (e.g. `https://xyzcompany.supabase.co`).
    pub url: Url,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: SecretString,
    pub transport: TransportConfig,
}

/// Raw HTTP client for the hosted backend.
///
/// Holds the current auth session (if any) and broadcasts every session
/// transition to subscribers. Row requests carry the session's access
/// token so row-level security sees the signed-in user.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: ArcSwapOption<SessionData>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseClient {
    /// Build a client from a `BackendConfig`.
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self::with_client(http, config.url.clone(), config.anon_key.clone()))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, anon_key: SecretString) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            http,
            base_url: normalize_base_url(base_url),
            anon_key,
            session: ArcSwapOption::empty(),
            events,
        }
    }

    /// The project base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The currently held session, without refreshing it.
    pub fn session(&self) -> Option<Arc<SessionData>> {
        self.session.load_full()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ── Session bookkeeping ──────────────────────────────────────────

    /// Replace the held session and notify subscribers.
    pub(crate) fn set_session(&self, session: Option<SessionData>, kind: SessionEventKind) {
        let session = session.map(Arc::new);
        self.session.store(session.clone());
        debug!(event = %kind, "session changed");
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(SessionEvent {
            kind,
            session: session.map(|s| (*s).clone()),
        });
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}rest/v1/{table}`
    pub(crate) fn rest_url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("rest/v1/{table}"))?)
    }

    /// `{base}auth/v1/{path}`
    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("auth/v1/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request with `apikey` and the best available bearer token.
    pub(crate) fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        debug!("{method} {url}");
        let bearer = match &*self.session.load() {
            Some(s) => format!("Bearer {}", s.access_token.expose_secret()),
            None => format!("Bearer {}", self.anon_key.expose_secret()),
        };
        let builder = self
            .http
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret());
        match HeaderValue::from_str(&bearer) {
            Ok(mut value) => {
                value.set_sensitive(true);
                builder.header(AUTHORIZATION, value)
            }
            Err(_) => builder,
        }
    }

    // ── Response handling ────────────────────────────────────────────

    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            trace!(len = body.len(), "response body");
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    pub(crate) async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    pub(crate) async fn parse_error(
        &self,
        status: reqwest::StatusCode,
        resp: reqwest::Response,
    ) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();

        Error::Rest {
            status: status.as_u16(),
            code: body.code_string(),
            message: body.best_message().unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            }),
        }
    }
}

/// Make sure the base URL ends with `/` so relative joins append.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
