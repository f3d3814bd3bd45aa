// ── Initialization gate ──
//
// One-way `Uninitialized -> Initializing -> Ready` flag backed by a
// `watch` channel. Every waiter subscribes to the same sender, so there is
// a single completion signal no matter how many callers are parked on it.

use strum::Display;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum GateState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug)]
pub struct InitGate {
    state: watch::Sender<GateState>,
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InitGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Uninitialized);
        Self { state }
    }

    /// Claim the single initialization attempt. Returns `true` for exactly
    /// one caller over the gate's lifetime.
    pub fn try_begin(&self) -> bool {
        self.state.send_if_modified(|s| {
            if *s == GateState::Uninitialized {
                *s = GateState::Initializing;
                true
            } else {
                false
            }
        })
    }

    /// Move to `Ready` and release every waiter. Idempotent.
    pub fn open(&self) {
        self.state.send_if_modified(|s| {
            if *s == GateState::Ready {
                false
            } else {
                *s = GateState::Ready;
                true
            }
        });
    }

    /// Returns a guard that opens the gate when dropped, whether the
    /// initializer finished, panicked or was cancelled.
    pub fn open_on_drop(&self) -> OpenOnDrop<'_> {
        OpenOnDrop(self)
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == GateState::Ready
    }

    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Suspend until the gate is `Ready`.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|s| *s == GateState::Ready).await;
    }

    /// Like [`wait`](Self::wait), but gives up when `cancel` fires.
    pub async fn wait_with(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        tokio::select! {
            biased;
            () = self.wait() => Ok(()),
            () = cancel.cancelled() => Err(CoreError::Cancelled {
                operation: "waiting for initialization".into(),
            }),
        }
    }
}

#[must_use = "the gate opens as soon as the guard is dropped"]
pub struct OpenOnDrop<'a>(&'a InitGate);

impl Drop for OpenOnDrop<'_> {
    fn drop(&mut self) {
        self.0.open();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn only_one_caller_claims_initialization() {
        let gate = InitGate::new();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        assert_eq!(gate.state(), GateState::Initializing);
    }

    #[test]
    fn gate_never_moves_backwards() {
        let gate = InitGate::new();
        gate.open();
        assert!(!gate.try_begin());
        assert_eq!(gate.state(), GateState::Ready);
        gate.open();
        assert!(gate.is_ready());
    }

    #[tokio::test]
    async fn every_waiter_resolves_on_open() {
        let gate = Arc::new(InitGate::new());
        assert!(gate.try_begin());

        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        gate.open();

        for w in waiters {
            tokio::time::timeout(Duration::from_secs(1), w)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_ready() {
        let gate = InitGate::new();
        gate.open();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // Readiness wins over an already-fired token.
        assert!(gate.wait_with(&cancel).await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_wait_reports_cancellation() {
        let gate = InitGate::new();
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let err = gate.wait_with(&cancel).await.unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
        assert_eq!(gate.state(), GateState::Uninitialized);
    }

    #[test]
    fn unwinding_initializer_still_opens_gate() {
        let gate = InitGate::new();
        assert!(gate.try_begin());

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _opened = gate.open_on_drop();
            panic!("initializer blew up");
        }));

        assert!(outcome.is_err());
        assert!(gate.is_ready());
    }

    #[test]
    fn state_displays_lowercase() {
        assert_eq!(GateState::Initializing.to_string(), "initializing");
    }
}
