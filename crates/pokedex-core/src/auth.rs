// ── Auth session manager ──
//
// Single source of truth for who is signed in. Holds the initialization
// gate every consumer must pass before trusting `is_authenticated`, and
// a background listener that folds session-change notifications into
// the current snapshot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::gate::{GateState, InitGate};
use crate::model::{Session, SessionChange, SessionEventKind, User, UserId};
use crate::remote::{AuthRemote, AuthResult, SessionChanges};
use crate::validation::{validate_email, validate_password};

/// Point-in-time view of the auth state. Replaced wholesale on every
/// change, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct AuthSnapshot {
    pub session: Option<Arc<Session>>,
    pub user: Option<Arc<User>>,
}

impl AuthSnapshot {
    fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => {
                let user = Arc::new(session.user.clone());
                Self {
                    session: Some(Arc::new(session)),
                    user: Some(user),
                }
            }
            None => Self::default(),
        }
    }

    fn from_result(result: AuthResult) -> Self {
        let user = result
            .user
            .or_else(|| result.session.as_ref().map(|s| s.user.clone()));
        Self {
            session: result.session.map(Arc::new),
            user: user.map(Arc::new),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.user.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Result of a credential form submission. Failures are values here,
/// not errors, so forms can render them inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    /// Sign-up accepted but no session yet: the address must be confirmed.
    ConfirmationPending,
    Failed { message: String },
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::ConfirmationPending)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    fn failed(err: &CoreError) -> Self {
        let message = match err {
            CoreError::RemoteFailure { message, .. } => message.clone(),
            CoreError::ValidationFailure { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self::Failed { message }
    }
}

pub struct AuthSessionManager {
    remote: Arc<dyn AuthRemote>,
    gate: InitGate,
    state: watch::Sender<AuthSnapshot>,
    in_flight: AtomicUsize,
    cancel: CancellationToken,
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager")
            .field("gate", &self.gate.state())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl AuthSessionManager {
    pub fn new(remote: Arc<dyn AuthRemote>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            remote,
            gate: InitGate::new(),
            state,
            in_flight: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
        }
    }

    // ── Initialization ───────────────────────────────────────────────

    /// Restore the current session and start listening for changes.
    ///
    /// Idempotent: only the first call fetches; every caller (including
    /// ones racing the first) resolves from that single attempt. A failed
    /// fetch still opens the gate, in the unauthenticated state.
    pub async fn initialize(self: &Arc<Self>) -> AuthSnapshot {
        self.ensure_started();
        self.gate.wait().await;
        self.snapshot()
    }

    /// Suspend until auth state is known. Starts initialization if no
    /// one has yet.
    pub async fn wait_for_initialization(self: &Arc<Self>) -> AuthSnapshot {
        self.initialize().await
    }

    /// Cancellable variant of [`wait_for_initialization`](Self::wait_for_initialization).
    /// Cancelling abandons the wait only; the initialization itself runs on.
    pub async fn wait_for_initialization_with(
        self: &Arc<Self>,
        cancel: &CancellationToken,
    ) -> Result<AuthSnapshot, CoreError> {
        self.ensure_started();
        self.gate.wait_with(cancel).await?;
        Ok(self.snapshot())
    }

    fn ensure_started(self: &Arc<Self>) {
        if self.gate.try_begin() {
            // Detached so a caller dropping its future cannot strand the
            // gate in `Initializing`.
            let this = Arc::clone(self);
            tokio::spawn(async move { this.run_initialization().await });
        }
    }

    async fn run_initialization(self: Arc<Self>) {
        debug!("initializing auth state");
        let opened = self.gate.open_on_drop();
        // Subscribe before fetching so nothing emitted mid-fetch is lost.
        let changes = self.remote.session_changes();

        match self.remote.current_session().await {
            Ok(session) => {
                self.replace(AuthSnapshot::from_session(session));
            }
            Err(e) => {
                warn!(error = %e, "session restore failed, continuing unauthenticated");
            }
        }

        self.spawn_listener(changes);
        drop(opened);
        info!(
            authenticated = self.is_authenticated(),
            "auth state ready"
        );
    }

    fn spawn_listener(self: &Arc<Self>, mut changes: SessionChanges) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    item = changes.next() => {
                        let Some(item) = item else { break };
                        let Some(this) = weak.upgrade() else { break };
                        this.apply_change(item);
                    }
                }
            }
            debug!("session listener stopped");
        });
    }

    fn apply_change(&self, item: Result<SessionChange, CoreError>) {
        match item {
            Err(e) => {
                warn!(error = %e, "session notification failed, keeping last known state");
            }
            Ok(SessionChange {
                kind: SessionEventKind::SignedOut,
                ..
            }) => {
                debug!("signed out");
                self.replace(AuthSnapshot::default());
            }
            Ok(SessionChange {
                kind,
                session: Some(session),
            }) => {
                debug!(event = %kind, "session replaced");
                self.replace(AuthSnapshot::from_session(Some(session)));
            }
            Ok(SessionChange {
                kind,
                session: None,
            }) => {
                warn!(event = %kind, "session event without a session, ignored");
            }
        }
    }

    // ── Credential operations ────────────────────────────────────────

    pub async fn sign_in(&self, email: &str, password: &SecretString) -> AuthOutcome {
        if let Err(e) = validate_credentials(email, password) {
            return AuthOutcome::failed(&e);
        }
        let _busy = self.busy();
        match self.remote.sign_in(email, password).await {
            Ok(result) => {
                self.replace(AuthSnapshot::from_result(result));
                info!("signed in");
                AuthOutcome::Success
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                AuthOutcome::failed(&e)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &SecretString) -> AuthOutcome {
        if let Err(e) = validate_credentials(email, password) {
            return AuthOutcome::failed(&e);
        }
        let _busy = self.busy();
        match self.remote.sign_up(email, password).await {
            Ok(result) => {
                let pending = result.session.is_none();
                self.replace(AuthSnapshot::from_result(result));
                if pending {
                    info!("sign-up accepted, email confirmation pending");
                    AuthOutcome::ConfirmationPending
                } else {
                    info!("signed up");
                    AuthOutcome::Success
                }
            }
            Err(e) => {
                warn!(error = %e, "sign-up failed");
                AuthOutcome::failed(&e)
            }
        }
    }

    /// Sign out remotely, then clear local state. On failure the current
    /// session is kept.
    pub async fn sign_out(&self) -> AuthOutcome {
        let _busy = self.busy();
        match self.remote.sign_out().await {
            Ok(()) => {
                self.replace(AuthSnapshot::default());
                info!("signed out");
                AuthOutcome::Success
            }
            Err(e) => {
                warn!(error = %e, "sign-out failed");
                AuthOutcome::failed(&e)
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.state.borrow().user_id()
    }

    pub fn current_user(&self) -> Option<Arc<User>> {
        self.state.borrow().user.clone()
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.state.borrow().session.clone()
    }

    pub fn user_email(&self) -> Option<String> {
        self.state
            .borrow()
            .user
            .as_ref()
            .and_then(|u| u.email.clone())
    }

    /// A credential call is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Watch the auth snapshot; fires on every replacement.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Stop the session listener. The gate and last snapshot remain.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn replace(&self, snapshot: AuthSnapshot) {
        self.state.send_replace(snapshot);
    }

    fn busy(&self) -> BusyGuard<'_> {
        BusyGuard::enter(&self.in_flight)
    }
}

impl Drop for AuthSessionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Holds a counter incremented until dropped, so an abandoned future
/// still releases its share.
pub(crate) struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn validate_credentials(email: &str, password: &SecretString) -> Result<(), CoreError> {
    validate_email(email)?;
    validate_password(password.expose_secret())
}
