// ── Catalog store ──
//
// Paginated view over the remote catalog. Holds exactly one page at a
// time; loading a page replaces the previous one. The total page count is
// derived from `total_count` on every read, never stored.

use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Pokemon, PokemonId, PokemonSummary};
use crate::remote::CatalogRemote;

#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub total_count: u64,
    /// 1-based index of the page in `items`; 0 before the first load.
    pub current_page: u32,
    pub items: Arc<Vec<PokemonSummary>>,
    pub initialized: bool,
}

/// Inclusive `(offset, end)` row range for a 1-based page.
pub fn page_bounds(page: u32, per_page: NonZeroU32) -> (u64, u64) {
    let n = u64::from(per_page.get());
    let offset = u64::from(page.saturating_sub(1)) * n;
    (offset, offset + n - 1)
}

/// Parse a user-supplied entity id (path segment, CLI argument).
pub fn parse_entity_id(raw: &str) -> Result<PokemonId, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::validation("id", "Pokemon ID is required"));
    }
    match raw.parse::<PokemonId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CoreError::validation("id", "Invalid Pokemon ID format")),
    }
}

pub struct CatalogStore {
    remote: Arc<dyn CatalogRemote>,
    items_per_page: NonZeroU32,
    state: watch::Sender<CatalogState>,
    init_lock: Mutex<()>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("items_per_page", &self.items_per_page)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    pub fn new(remote: Arc<dyn CatalogRemote>, items_per_page: NonZeroU32) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            remote,
            items_per_page,
            state,
            init_lock: Mutex::new(()),
        }
    }

    /// Fetch the total count and page 1 concurrently. Idempotent once it
    /// has succeeded; a failure leaves the store uninitialized so the
    /// next call retries.
    pub async fn initialize_store(&self) -> Result<(), CoreError> {
        if self.is_initialized() {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        let (offset, end) = page_bounds(1, self.items_per_page);
        let (total, items) = tokio::try_join!(
            self.remote.count(),
            self.remote.list_page(offset, end)
        )
        .inspect_err(|e| warn!(error = %e, "catalog initialization failed"))?;

        let first_len = items.len();
        self.state.send_modify(|s| {
            s.total_count = total;
            s.current_page = 1;
            s.items = Arc::new(items);
            s.initialized = true;
        });
        info!(
            total,
            first_page = first_len,
            pages = self.total_pages(),
            "catalog initialized"
        );
        Ok(())
    }

    /// Fetch one 1-based page and make it current. Pages past the end are
    /// not clamped; the remote decides what they contain.
    pub async fn load_page(&self, page: u32) -> Result<Arc<Vec<PokemonSummary>>, CoreError> {
        if page == 0 {
            return Err(CoreError::validation("page", "page numbers start at 1"));
        }
        let (offset, end) = page_bounds(page, self.items_per_page);
        debug!(page, offset, end, "loading catalog page");

        let items = self
            .remote
            .list_page(offset, end)
            .await
            .inspect_err(|e| warn!(page, error = %e, "catalog page load failed"))?;

        let items = Arc::new(items);
        self.state.send_modify(|s| {
            s.current_page = page;
            s.items = Arc::clone(&items);
        });
        debug!(page, count = items.len(), "catalog page loaded");
        Ok(items)
    }

    /// Full record for the detail view.
    pub async fn fetch_detail(&self, id: PokemonId) -> Result<Pokemon, CoreError> {
        if id <= 0 {
            return Err(CoreError::validation("id", "Invalid Pokemon ID format"));
        }
        self.remote.get_by_id(id).await
    }

    pub fn total_pages(&self) -> u64 {
        self.state
            .borrow()
            .total_count
            .div_ceil(u64::from(self.items_per_page.get()))
    }

    pub fn total_count(&self) -> u64 {
        self.state.borrow().total_count
    }

    pub fn current_page(&self) -> Arc<Vec<PokemonSummary>> {
        Arc::clone(&self.state.borrow().items)
    }

    pub fn current_page_number(&self) -> u32 {
        self.state.borrow().current_page
    }

    pub fn items_per_page(&self) -> NonZeroU32 {
        self.items_per_page
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    pub fn find_on_current_page(&self, id: PokemonId) -> Option<PokemonSummary> {
        self.state.borrow().items.iter().find(|p| p.id == id).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }
}
