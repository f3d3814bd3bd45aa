// pokedex-api: Async Rust client for the hosted Pokedex backend
//
// Speaks the PostgREST row protocol (`rest/v1/`) and the GoTrue auth
// protocol (`auth/v1/`) exposed by the backend-as-a-service. Endpoint
// groups are inherent methods on `SupabaseClient`, split across modules.

pub mod auth;
pub mod client;
pub mod error;
pub mod favorites;
pub mod models;
pub mod pokemon;
pub mod transport;

pub use auth::{SessionEvent, SessionEventKind};
pub use client::{BackendConfig, SupabaseClient};
pub use error::Error;
pub use models::{AuthResponse, PokemonRow, PokemonStats, PokemonSummaryRow, SessionData, UserRecord};
pub use transport::TransportConfig;
