// Wire types for the backend's row and auth payloads.
//
// Field names follow the backend's column / JSON names; `pokedex-core`
// converts these into its domain model.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ── Rows ────────────────────────────────────────────────────────────

/// Projection of the `pokemon` table used by list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSummaryRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub japanese_name: Option<String>,
    #[serde(default)]
    pub sprite_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
}

/// Full `pokemon` row as returned by `select=*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub japanese_name: Option<String>,
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub sprite_url: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub stats: PokemonStats,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One row of `user_favorites` when only `pokemon_id` is selected.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct FavoriteRow {
    pub pokemon_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct FavoriteInsert {
    pub user_id: Uuid,
    pub pokemon_id: i64,
}

// ── Auth ────────────────────────────────────────────────────────────

/// Identity record attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// A live session as issued by the token endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionData {
    #[serde(deserialize_with = "secret_string")]
    pub access_token: SecretString,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry, seconds since the epoch.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(deserialize_with = "secret_string")]
    pub refresh_token: SecretString,
    pub user: UserRecord,
}

impl SessionData {
    /// Expiry as a timestamp. Falls back to `expires_in` relative to `now`
    /// when the backend omits the absolute value.
    pub fn expires_at_utc(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.expires_at, self.expires_in) {
            (Some(at), _) => DateTime::from_timestamp(at, 0),
            (None, Some(secs)) => Some(now + chrono::Duration::seconds(secs)),
            (None, None) => None,
        }
    }

    /// Whether the access token is expired (or within `margin` of expiring).
    pub fn is_expired(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at
            .and_then(|at| DateTime::from_timestamp(at, 0))
            .is_some_and(|at| at <= now + margin)
    }
}

/// Result of a sign-in or sign-up call.
///
/// Sign-up returns a user without a session while email confirmation
/// is pending.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub user: Option<UserRecord>,
    pub session: Option<SessionData>,
}

fn bearer() -> String {
    "bearer".into()
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}
