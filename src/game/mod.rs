//! Game Logic Module
//!
//! Everything that happens inside one match. No I/O and no locking; the
//! session owning a `MatchState` serialises access to it.
//!
//! ## Module Structure
//!
//! - `state`: Match state, teams, ids, outbox
//! - `tick`: Per-tick algorithm, match start and end
//! - `command`: Player commands (name, team, chat, cards, deck, ping)
//! - `unit`, `projectile`, `magic`: Entity kinds and their hooks
//! - `card`: Catalog and cost ledger
//! - `player`: Energy, deck, play order, latency
//! - `spawn`: Deferred entity creation
//! - `events`: Messages for clients

pub mod state;
pub mod tick;
pub mod command;
pub mod unit;
pub mod projectile;
pub mod magic;
pub mod card;
pub mod player;
pub mod spawn;
pub mod events;

// Re-export key types
pub use state::{MatchState, MatchStatus, SessionId, EntityId, PlayerKey, Team, MAX_PLAYERS};
pub use player::PlayerState;
pub use tick::{tick, MatchConfig, TickResult};
pub use events::{GameEvent, Outbound, Recipient};
