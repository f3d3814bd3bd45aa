// ── Remote boundary ──
//
// The three typed interfaces the stores consume, plus their production
// implementation on top of `pokedex_api::SupabaseClient`. Tests swap in
// in-memory fakes.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use secrecy::SecretString;
use tokio_stream::wrappers::BroadcastStream;

use pokedex_api::SupabaseClient;

use crate::error::CoreError;
use crate::model::{Pokemon, PokemonId, PokemonSummary, Session, SessionChange, User, UserId};

/// Stream of session-change notifications. An `Err` item is a
/// notification that could not be delivered.
pub type SessionChanges = BoxStream<'static, Result<SessionChange, CoreError>>;

/// Outcome of a credential call.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: Option<User>,
    /// `None` when sign-up still awaits email confirmation.
    pub session: Option<Session>,
}

#[async_trait]
pub trait CatalogRemote: Send + Sync {
    async fn count(&self) -> Result<u64, CoreError>;

    /// Entities `offset..=end_inclusive`, ordered by id ascending.
    async fn list_page(
        &self,
        offset: u64,
        end_inclusive: u64,
    ) -> Result<Vec<PokemonSummary>, CoreError>;

    async fn get_by_id(&self, id: PokemonId) -> Result<Pokemon, CoreError>;
}

#[async_trait]
pub trait AuthRemote: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString)
    -> Result<AuthResult, CoreError>;

    async fn sign_up(&self, email: &str, password: &SecretString)
    -> Result<AuthResult, CoreError>;

    async fn sign_out(&self) -> Result<(), CoreError>;

    async fn current_session(&self) -> Result<Option<Session>, CoreError>;

    /// Subscribe to session changes from this point on.
    fn session_changes(&self) -> SessionChanges;
}

#[async_trait]
pub trait FavoritesRemote: Send + Sync {
    async fn favorite_ids(&self, user: UserId) -> Result<Vec<PokemonId>, CoreError>;

    async fn add_favorite(&self, user: UserId, id: PokemonId) -> Result<(), CoreError>;

    async fn remove_favorite(&self, user: UserId, id: PokemonId) -> Result<(), CoreError>;
}

// ── Backend implementation ───────────────────────────────────────────

#[async_trait]
impl CatalogRemote for SupabaseClient {
    async fn count(&self) -> Result<u64, CoreError> {
        Ok(self.count_pokemon().await?)
    }

    async fn list_page(
        &self,
        offset: u64,
        end_inclusive: u64,
    ) -> Result<Vec<PokemonSummary>, CoreError> {
        let rows = self.list_pokemon(offset, end_inclusive).await?;
        Ok(rows.into_iter().map(PokemonSummary::from).collect())
    }

    async fn get_by_id(&self, id: PokemonId) -> Result<Pokemon, CoreError> {
        Ok(self.get_pokemon(id).await?.into())
    }
}

#[async_trait]
impl AuthRemote for SupabaseClient {
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResult, CoreError> {
        let resp = self.sign_in_with_password(email, password).await?;
        Ok(AuthResult {
            user: resp.user.map(User::from),
            session: resp.session.map(Session::from),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResult, CoreError> {
        let resp = SupabaseClient::sign_up(self, email, password).await?;
        Ok(AuthResult {
            user: resp.user.map(User::from),
            session: resp.session.map(Session::from),
        })
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        Ok(SupabaseClient::sign_out(self).await?)
    }

    async fn current_session(&self) -> Result<Option<Session>, CoreError> {
        Ok(SupabaseClient::current_session(self)
            .await?
            .map(Session::from))
    }

    fn session_changes(&self) -> SessionChanges {
        BroadcastStream::new(self.subscribe())
            .map(|item| {
                item.map(SessionChange::from).map_err(|e| {
                    CoreError::remote(format!("session notification lost: {e}"))
                })
            })
            .boxed()
    }
}

#[async_trait]
impl FavoritesRemote for SupabaseClient {
    async fn favorite_ids(&self, user: UserId) -> Result<Vec<PokemonId>, CoreError> {
        Ok(self.list_favorite_ids(*user.as_uuid()).await?)
    }

    async fn add_favorite(&self, user: UserId, id: PokemonId) -> Result<(), CoreError> {
        Ok(self.insert_favorite(*user.as_uuid(), id).await?)
    }

    async fn remove_favorite(&self, user: UserId, id: PokemonId) -> Result<(), CoreError> {
        Ok(self.delete_favorite(*user.as_uuid(), id).await?)
    }
}
