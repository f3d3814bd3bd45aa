// ── Runtime configuration for the state layer ──
//
// Tuning for the stores and the route guard. Core never reads config
// files; `pokedex-config` builds a `CoreConfig` and hands it in.

use std::num::NonZeroU32;
use std::time::Duration;

const DEFAULT_ITEMS_PER_PAGE: NonZeroU32 = match NonZeroU32::new(30) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Page size used by the catalog store.
    pub items_per_page: NonZeroU32,
    /// Routes the guard lets through without consulting auth state.
    /// An entry ending in `/*` matches every path below it.
    pub public_routes: Vec<String>,
    /// Where unauthenticated navigations are redirected.
    pub login_route: String,
    /// Upper bound on how long the guard waits for auth readiness.
    /// `None` waits as long as initialization takes.
    pub guard_timeout: Option<Duration>,
    /// Serialize concurrent favorite toggles per pokemon id.
    pub serialize_toggles: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            public_routes: vec![
                "/".into(),
                "/login".into(),
                "/signup".into(),
                "/pokemon/*".into(),
            ],
            login_route: "/login".into(),
            guard_timeout: None,
            serialize_toggles: false,
        }
    }
}
