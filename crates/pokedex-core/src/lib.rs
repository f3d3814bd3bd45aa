// pokedex-core: Client-side state layer between pokedex-api and consumers (CLI).
//
// Three cooperating stores (auth session, catalog pages, favorites) plus
// the initialization gate and route guard that sequence them.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod favorites;
pub mod gate;
pub mod guard;
pub mod model;
pub mod remote;
pub mod validation;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AuthOutcome, AuthSessionManager, AuthSnapshot};
pub use catalog::{CatalogState, CatalogStore, page_bounds, parse_entity_id};
pub use config::CoreConfig;
pub use context::AppContext;
pub use error::CoreError;
pub use favorites::{FavoriteSet, FavoritesCache, ToggleAction};
pub use gate::{GateState, InitGate};
pub use guard::{Navigation, RouteGuard};
pub use remote::{AuthRemote, AuthResult, CatalogRemote, FavoritesRemote, SessionChanges};

pub use model::{
    BaseStats, Pokemon, PokemonId, PokemonSummary, Session, SessionChange, SessionEventKind, User,
    UserId,
};

// Backend types consumers need to build a context.
pub use pokedex_api::{BackendConfig, SupabaseClient, TransportConfig};
