// ── In-memory remotes for unit tests ──

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Barrier, Notify, Semaphore, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{
    BaseStats, Pokemon, PokemonId, PokemonSummary, Session, SessionChange, SessionEventKind, User,
    UserId,
};
use crate::remote::{AuthRemote, AuthResult, CatalogRemote, FavoritesRemote, SessionChanges};

pub(crate) fn summary(id: PokemonId) -> PokemonSummary {
    PokemonSummary {
        id,
        name: format!("pokemon-{id}"),
        localized_name: Some(format!("ポケモン{id}")),
        thumbnail_url: Some(format!("https://img.example/{id}.png")),
    }
}

pub(crate) fn session_for(email: &str) -> Session {
    Session {
        access_token: SecretString::from(format!("token-{email}")),
        expires_at: None,
        user: User {
            id: UserId::new(Uuid::new_v4()),
            email: Some(email.to_owned()),
            email_confirmed: true,
            created_at: None,
            last_sign_in: None,
        },
    }
}

/// Poll `cond` until it holds, failing the test after one second.
pub(crate) async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("condition not reached"));
}

// ── Catalog ─────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub total: u64,
    pub count_calls: AtomicUsize,
    pub list_calls: Mutex<Vec<(u64, u64)>>,
    pub fail_count: AtomicBool,
    pub fail_list: AtomicBool,
    /// When set, `count` and `list_page` both wait on it, so they only
    /// complete if issued concurrently.
    pub rendezvous: Option<Arc<Barrier>>,
}

impl FakeCatalog {
    pub fn with_total(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn list_calls(&self) -> Vec<(u64, u64)> {
        self.list_calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CatalogRemote for FakeCatalog {
    async fn count(&self) -> Result<u64, CoreError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(b) = &self.rendezvous {
            b.wait().await;
        }
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(CoreError::remote("count unavailable"));
        }
        Ok(self.total)
    }

    async fn list_page(
        &self,
        offset: u64,
        end_inclusive: u64,
    ) -> Result<Vec<PokemonSummary>, CoreError> {
        self.list_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((offset, end_inclusive));
        if let Some(b) = &self.rendezvous {
            b.wait().await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(CoreError::remote("list unavailable"));
        }
        let last = end_inclusive.min(self.total.saturating_sub(1));
        Ok((offset..=last)
            .filter(|i| *i < self.total)
            .map(|i| summary(i64::try_from(i).unwrap_or(i64::MAX) + 1))
            .collect())
    }

    async fn get_by_id(&self, id: PokemonId) -> Result<Pokemon, CoreError> {
        let in_range = u64::try_from(id).is_ok_and(|n| n >= 1 && n <= self.total);
        if !in_range {
            return Err(CoreError::NotFound {
                entity_type: "pokemon".into(),
                identifier: id.to_string(),
            });
        }
        let s = summary(id);
        Ok(Pokemon {
            id,
            name: s.name,
            localized_name: s.localized_name,
            height: 0.7,
            weight: 6.9,
            thumbnail_url: s.thumbnail_url,
            types: vec!["grass".into(), "poison".into()],
            stats: BaseStats {
                hp: 45,
                attack: 49,
                defense: 49,
            },
            created_at: None,
        })
    }
}

// ── Auth ────────────────────────────────────────────────────────────

type ChangeItem = Result<SessionChange, CoreError>;

pub(crate) struct FakeAuth {
    pub session: Mutex<Option<Session>>,
    pub session_fetches: AtomicUsize,
    pub fail_session_fetch: AtomicBool,
    /// `current_session` panics instead of answering.
    pub panic_session_fetch: AtomicBool,
    pub fail_credentials: AtomicBool,
    pub fail_sign_out: AtomicBool,
    /// Sign-up answers without a session (email confirmation pending).
    pub require_confirmation: AtomicBool,
    pub credential_calls: AtomicUsize,
    /// When set, `current_session` parks until notified.
    pub hold_session_fetch: Option<Arc<Notify>>,
    pub events_tx: mpsc::UnboundedSender<ChangeItem>,
    pub events_rx: Mutex<Option<mpsc::UnboundedReceiver<ChangeItem>>>,
}

impl Default for FakeAuth {
    fn default() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session: Mutex::new(None),
            session_fetches: AtomicUsize::new(0),
            fail_session_fetch: AtomicBool::new(false),
            panic_session_fetch: AtomicBool::new(false),
            fail_credentials: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            require_confirmation: AtomicBool::new(false),
            credential_calls: AtomicUsize::new(0),
            hold_session_fetch: None,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }
}

impl FakeAuth {
    pub fn signed_in(session: Session) -> Self {
        let fake = Self::default();
        *fake.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session);
        fake
    }

    /// Push a notification as if the auth service emitted it.
    pub fn emit(&self, item: ChangeItem) {
        let _ = self.events_tx.send(item);
    }

    pub fn emit_change(&self, kind: SessionEventKind, session: Option<Session>) {
        self.emit(Ok(SessionChange { kind, session }));
    }

    fn store(&self, session: Option<Session>) {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = session;
    }

    fn credentials(&self, email: &str, password: &SecretString) -> Result<Session, CoreError> {
        self.credential_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_credentials.load(Ordering::SeqCst) || password.expose_secret() == "wrong-pw" {
            return Err(CoreError::remote("Invalid login credentials"));
        }
        Ok(session_for(email))
    }
}

#[async_trait]
impl AuthRemote for FakeAuth {
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResult, CoreError> {
        let session = self.credentials(email, password)?;
        self.store(Some(session.clone()));
        Ok(AuthResult {
            user: Some(session.user.clone()),
            session: Some(session),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResult, CoreError> {
        let session = self.credentials(email, password)?;
        if self.require_confirmation.load(Ordering::SeqCst) {
            return Ok(AuthResult {
                user: Some(session.user),
                session: None,
            });
        }
        self.store(Some(session.clone()));
        Ok(AuthResult {
            user: Some(session.user.clone()),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(CoreError::remote("logout failed"));
        }
        self.store(None);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, CoreError> {
        self.session_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold_session_fetch {
            hold.notified().await;
        }
        assert!(
            !self.panic_session_fetch.load(Ordering::SeqCst),
            "session fetch panicked"
        );
        if self.fail_session_fetch.load(Ordering::SeqCst) {
            return Err(CoreError::remote("session endpoint unavailable"));
        }
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn session_changes(&self) -> SessionChanges {
        match self
            .events_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
            None => futures::stream::empty().boxed(),
        }
    }
}

// ── Favorites ───────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeFavorites {
    pub rows: Mutex<HashMap<UserId, BTreeSet<PokemonId>>>,
    pub reads: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Writes that have reached the remote (held or not).
    pub writes_started: AtomicUsize,
    /// When set, every write waits for one permit.
    pub hold_writes: Option<Arc<Semaphore>>,
    /// When set, reads park until notified.
    pub hold_reads: Option<Arc<Notify>>,
}

impl FakeFavorites {
    pub fn seed(&self, user: UserId, ids: &[PokemonId]) {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(user)
            .or_default()
            .extend(ids.iter().copied());
    }

    pub fn stored(&self, user: UserId) -> BTreeSet<PokemonId> {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    async fn before_write(&self) -> Result<(), CoreError> {
        self.writes_started.fetch_add(1, Ordering::SeqCst);
        if let Some(sem) = &self.hold_writes {
            if let Ok(permit) = sem.acquire().await {
                permit.forget();
            }
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::remote("favorites write rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl FavoritesRemote for FakeFavorites {
    async fn favorite_ids(&self, user: UserId) -> Result<Vec<PokemonId>, CoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold_reads {
            hold.notified().await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CoreError::remote("favorites read failed"));
        }
        Ok(self.stored(user).into_iter().collect())
    }

    async fn add_favorite(&self, user: UserId, id: PokemonId) -> Result<(), CoreError> {
        self.before_write().await?;
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(user)
            .or_default()
            .insert(id);
        Ok(())
    }

    async fn remove_favorite(&self, user: UserId, id: PokemonId) -> Result<(), CoreError> {
        self.before_write().await?;
        if let Some(set) = self
            .rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&user)
        {
            set.remove(&id);
        }
        Ok(())
    }
}
