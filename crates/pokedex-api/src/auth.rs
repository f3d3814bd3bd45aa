// Auth API
//
// Password sign-in/sign-up, sign-out, token refresh and session
// restoration. Every successful transition replaces the held session
// and is broadcast as a `SessionEvent`.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use tracing::debug;

use crate::client::SupabaseClient;
use crate::error::Error;
use crate::models::{AuthResponse, SessionData, UserRecord};

/// Refresh this long before the access token actually expires.
const REFRESH_MARGIN_SECS: i64 = 10;

/// Kind of session transition, named the way the auth service names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// A session transition as seen by subscribers.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    /// The new session; `None` after sign-out.
    pub session: Option<SessionData>,
}

impl SupabaseClient {
    /// Exchange email + password for a session.
    ///
    /// `POST auth/v1/token?grant_type=password`
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, Error> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let body = json!({ "email": email, "password": password.expose_secret() });
        let resp = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let session: SessionData = self.handle_auth_response(resp).await?;

        debug!(user_id = %session.user.id, "signed in");
        self.set_session(Some(session.clone()), SessionEventKind::SignedIn);
        Ok(AuthResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        })
    }

    /// Register a new account.
    ///
    /// `POST auth/v1/signup`. When the project requires email
    /// confirmation the response carries only the user and no session.
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<AuthResponse, Error> {
        let url = self.auth_url("signup")?;
        let body = json!({ "email": email, "password": password.expose_secret() });
        let resp = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let value: Value = self.handle_auth_response(resp).await?;

        if value.get("access_token").is_some() {
            let session: SessionData = decode(value)?;
            debug!(user_id = %session.user.id, "signed up with immediate session");
            self.set_session(Some(session.clone()), SessionEventKind::SignedIn);
            return Ok(AuthResponse {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        // The user is either nested under `user` or is the body itself.
        let nested = value.get("user").filter(|u| !u.is_null()).cloned();
        let user: UserRecord = decode(nested.unwrap_or(value))?;
        debug!(user_id = %user.id, "signed up; email confirmation pending");
        Ok(AuthResponse {
            user: Some(user),
            session: None,
        })
    }

    /// End the current session.
    ///
    /// `POST auth/v1/logout`. Without a held session this only clears
    /// local state. On remote failure the held session is kept.
    pub async fn sign_out(&self) -> Result<(), Error> {
        if self.session().is_some() {
            let url = self.auth_url("logout")?;
            let resp = self.request(reqwest::Method::POST, url).send().await?;
            self.handle_empty(resp).await?;
        }
        self.set_session(None, SessionEventKind::SignedOut);
        Ok(())
    }

    /// Exchange the held refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<SessionData, Error> {
        let current = self.session().ok_or(Error::SessionMissing)?;
        let session = self.exchange_refresh_token(&current.refresh_token).await?;
        self.set_session(Some(session.clone()), SessionEventKind::TokenRefreshed);
        Ok(session)
    }

    /// Rebuild a session from a persisted refresh token (process start).
    pub async fn restore_session(&self, refresh_token: &SecretString) -> Result<SessionData, Error> {
        let session = self.exchange_refresh_token(refresh_token).await?;
        debug!(user_id = %session.user.id, "session restored");
        self.set_session(Some(session.clone()), SessionEventKind::SignedIn);
        Ok(session)
    }

    /// The held session, refreshed first when its access token is expired.
    pub async fn current_session(&self) -> Result<Option<SessionData>, Error> {
        let Some(session) = self.session() else {
            return Ok(None);
        };
        if session.is_expired(Utc::now(), chrono::Duration::seconds(REFRESH_MARGIN_SECS)) {
            debug!("access token expired; refreshing");
            return self.refresh_session().await.map(Some);
        }
        Ok(Some((*session).clone()))
    }

    // ── Helpers ──────────────────────────────────────────────────────

    async fn exchange_refresh_token(&self, refresh_token: &SecretString) -> Result<SessionData, Error> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let body = json!({ "refresh_token": refresh_token.expose_secret() });
        let resp = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        self.handle_auth_response(resp).await
    }

    /// Like `handle_response`, but credential rejections become
    /// `Error::Authentication` with the service's message.
    async fn handle_auth_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        match self.handle_response(resp).await {
            Err(Error::Rest {
                status: 400 | 401 | 403 | 422,
                message,
                ..
            }) => Err(Error::Authentication { message }),
            other => other,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}
