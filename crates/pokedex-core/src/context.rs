// ── Application context ──
//
// Owns one instance of each store plus the route guard, wired together.
// Consumers receive the context (or the pieces they need) explicitly;
// there is no global state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pokedex_api::SupabaseClient;

use crate::auth::AuthSessionManager;
use crate::catalog::CatalogStore;
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::favorites::FavoritesCache;
use crate::guard::RouteGuard;
use crate::model::UserId;
use crate::remote::{AuthRemote, CatalogRemote, FavoritesRemote};

/// Cheaply cloneable handle to the state layer.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: CoreConfig,
    auth: Arc<AuthSessionManager>,
    catalog: Arc<CatalogStore>,
    favorites: Arc<FavoritesCache>,
    guard: RouteGuard,
    started: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("auth", &self.inner.auth)
            .field("catalog", &self.inner.catalog)
            .field("favorites", &self.inner.favorites)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wire the stores. Does not touch the network; call
    /// [`start()`](Self::start) for that.
    pub fn new(
        config: CoreConfig,
        catalog_remote: Arc<dyn CatalogRemote>,
        auth_remote: Arc<dyn AuthRemote>,
        favorites_remote: Arc<dyn FavoritesRemote>,
    ) -> Self {
        let auth = Arc::new(AuthSessionManager::new(auth_remote));
        let catalog = Arc::new(CatalogStore::new(catalog_remote, config.items_per_page));
        let favorites = Arc::new(FavoritesCache::new(
            Arc::clone(&auth),
            favorites_remote,
            config.serialize_toggles,
        ));
        let guard = RouteGuard::new(Arc::clone(&auth), &config);

        Self {
            inner: Arc::new(AppContextInner {
                config,
                auth,
                catalog,
                favorites,
                guard,
                started: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// All three stores backed by one backend client.
    pub fn from_client(config: CoreConfig, client: Arc<SupabaseClient>) -> Self {
        Self::new(config, client.clone(), client.clone(), client)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn auth(&self) -> &Arc<AuthSessionManager> {
        &self.inner.auth
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.inner.catalog
    }

    pub fn favorites(&self) -> &Arc<FavoritesCache> {
        &self.inner.favorites
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.inner.guard
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Initialize auth and the catalog concurrently and start keeping
    /// favorites in step with the signed-in user.
    ///
    /// Auth always reaches ready. The result is the catalog's; calling
    /// again after a catalog failure retries it.
    pub async fn start(&self) -> Result<(), CoreError> {
        if !self.inner.started.swap(true, Ordering::AcqRel) {
            let handle = tokio::spawn(favorites_sync_task(
                Arc::clone(&self.inner.auth),
                Arc::clone(&self.inner.favorites),
                self.inner.cancel.clone(),
            ));
            self.inner.task_handles.lock().await.push(handle);
        }

        let (snapshot, catalog) = tokio::join!(
            self.inner.auth.initialize(),
            self.inner.catalog.initialize_store()
        );
        info!(
            authenticated = snapshot.is_authenticated(),
            catalog_ready = catalog.is_ok(),
            "app context started"
        );
        catalog
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.auth.shutdown();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("app context shut down");
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Waits for auth, then loads favorites for whoever is signed in and
/// resets/reloads whenever the user id changes.
async fn favorites_sync_task(
    auth: Arc<AuthSessionManager>,
    favorites: Arc<FavoritesCache>,
    cancel: CancellationToken,
) {
    let mut rx = auth.subscribe();
    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        _ = auth.wait_for_initialization() => {}
    }

    let mut current = rx.borrow_and_update().user_id();
    if current.is_some() && !sync_user(&favorites, current, &cancel).await {
        debug!("favorites sync stopped during initial load");
        return;
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = rx.borrow_and_update().user_id();
                if next != current {
                    debug!(from = ?current, to = ?next, "signed-in user changed");
                    current = next;
                    if !sync_user(&favorites, current, &cancel).await {
                        break;
                    }
                }
            }
        }
    }
    debug!("favorites sync stopped");
}

/// Returns `false` when `cancel` fired first; the load in flight is
/// abandoned.
async fn sync_user(
    favorites: &FavoritesCache,
    user: Option<UserId>,
    cancel: &CancellationToken,
) -> bool {
    favorites.reset();
    let Some(user) = user else {
        return true;
    };
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        loaded = favorites.load() => {
            if let Err(e) = loaded {
                warn!(%user, error = %e, "favorites sync failed");
            }
            true
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use secrecy::SecretString;
    use tokio::sync::Notify;

    use super::*;
    use crate::testing::{FakeAuth, FakeCatalog, FakeFavorites, eventually, session_for};

    fn context(
        auth: FakeAuth,
        catalog: FakeCatalog,
        favorites: Arc<FakeFavorites>,
    ) -> AppContext {
        AppContext::new(
            CoreConfig::default(),
            Arc::new(catalog),
            Arc::new(auth),
            favorites,
        )
    }

    #[tokio::test]
    async fn start_restores_session_and_loads_favorites() {
        let session = session_for("ash@pallet.town");
        let user = session.user.id;
        let remote = Arc::new(FakeFavorites::default());
        remote.seed(user, &[1, 25]);

        let ctx = context(
            FakeAuth::signed_in(session),
            FakeCatalog::with_total(151),
            remote.clone(),
        );
        ctx.start().await.unwrap();

        assert!(ctx.auth().is_authenticated());
        assert_eq!(ctx.catalog().total_pages(), 6);
        eventually(|| ctx.favorites().is_favorite(25)).await;
        assert_eq!(ctx.favorites().count(), 2);

        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn catalog_failure_does_not_block_auth() {
        let catalog = FakeCatalog::with_total(10);
        catalog.fail_list.store(true, Ordering::SeqCst);
        let ctx = context(
            FakeAuth::default(),
            catalog,
            Arc::new(FakeFavorites::default()),
        );

        assert!(ctx.start().await.is_err());
        assert!(ctx.auth().is_ready());
        assert!(!ctx.catalog().is_initialized());
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn sign_out_resets_and_sign_in_reloads() {
        let session = session_for("ash@pallet.town");
        let ash = session.user.id;
        let remote = Arc::new(FakeFavorites::default());
        remote.seed(ash, &[7]);

        let ctx = context(
            FakeAuth::signed_in(session),
            FakeCatalog::with_total(10),
            remote.clone(),
        );
        ctx.start().await.unwrap();
        eventually(|| ctx.favorites().owner() == Some(ash)).await;

        assert!(ctx.auth().sign_out().await.is_success());
        eventually(|| ctx.favorites().owner().is_none()).await;
        assert!(!ctx.favorites().is_favorite(7));

        let outcome = ctx
            .auth()
            .sign_in("misty@cerulean.city", &SecretString::from("starmie".to_owned()))
            .await;
        assert!(outcome.is_success());
        let misty = ctx.auth().current_user_id().unwrap();
        eventually(|| ctx.favorites().owner() == Some(misty)).await;
        assert_eq!(ctx.favorites().count(), 0);

        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn sync_swallows_load_failures() {
        let remote = Arc::new(FakeFavorites::default());
        remote.fail_reads.store(true, Ordering::SeqCst);
        let ctx = context(
            FakeAuth::signed_in(session_for("ash@pallet.town")),
            FakeCatalog::with_total(10),
            remote.clone(),
        );

        ctx.start().await.unwrap();
        eventually(|| remote.reads.load(Ordering::SeqCst) >= 1).await;
        assert_eq!(ctx.favorites().owner(), None);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn guard_is_wired_to_the_same_auth() {
        let ctx = context(
            FakeAuth::signed_in(session_for("ash@pallet.town")),
            FakeCatalog::with_total(10),
            Arc::new(FakeFavorites::default()),
        );
        assert!(ctx.guard().check("/favorites").await.is_proceed());
        assert!(ctx.auth().is_ready());
    }

    #[tokio::test]
    async fn shutdown_abandons_stalled_favorites_load() {
        let session = session_for("ash@pallet.town");
        let remote = Arc::new(FakeFavorites {
            hold_reads: Some(Arc::new(Notify::new())),
            ..FakeFavorites::default()
        });

        let ctx = context(
            FakeAuth::signed_in(session),
            FakeCatalog::with_total(151),
            remote.clone(),
        );
        ctx.start().await.unwrap();
        eventually(|| remote.reads.load(Ordering::SeqCst) == 1).await;
        assert!(ctx.favorites().is_loading());

        tokio::time::timeout(Duration::from_secs(1), ctx.shutdown())
            .await
            .unwrap();
        assert!(!ctx.favorites().is_loading());
    }
}
