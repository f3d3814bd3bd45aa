// ── Domain model ──
//
// Canonical types shared by the stores. API wire types are converted
// into these in `crate::convert`.

pub mod pokemon;
pub mod session;

pub use pokemon::{BaseStats, Pokemon, PokemonId, PokemonSummary};
pub use session::{Session, SessionChange, SessionEventKind, User, UserId};
