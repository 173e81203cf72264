//! # Inkwar Game Server
//!
//! Authoritative match server for Inkwar, a three-seat real-time card
//! battle. Clients only send commands; the server owns every unit, runs the
//! simulation at a fixed rate and streams the results back.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    INKWAR SERVER                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Spatial primitives                        │
//! │  ├── bounds.rs   - Axis-aligned boxes                        │
//! │  └── quadtree.rs - Per-tick area index                       │
//! │                                                              │
//! │  game/           - Match logic (no I/O)                      │
//! │  ├── state.rs    - Match, teams, ids, outbox                 │
//! │  ├── tick.rs     - Authoritative simulation step             │
//! │  ├── command.rs  - Player commands                           │
//! │  ├── card.rs     - Card catalog and cost ledger              │
//! │  ├── unit.rs     - Units and their hooks                     │
//! │  ├── projectile.rs, magic.rs, spawn.rs                       │
//! │  └── events.rs   - Messages for clients                      │
//! │                                                              │
//! │  network/        - TCP plumbing                              │
//! │  ├── protocol.rs - Binary frames and opcodes                 │
//! │  ├── session.rs  - Locked match + outbound queues            │
//! │  ├── registry.rs - Connection placement                      │
//! │  └── server.rs   - Accept loop                               │
//! │                                                              │
//! │  store/          - Finished match persistence                │
//! │  config.rs       - Environment configuration                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Each session is guarded by one async mutex, taken for one tick or one
//! command. Outbound frames go through bounded per-connection queues, so a
//! slow client loses frames instead of stalling its match.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod store;
pub mod config;

// Re-export commonly used types
pub use config::{ServerConfig, ConfigError};
pub use game::state::{MatchState, MatchStatus, Team};
pub use network::{GameServer, GameServerError};
pub use store::{MatchStore, MatchRecord, MemoryStore, JsonLinesStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Match duration in ticks (180 seconds * 60 Hz)
pub const MATCH_DURATION_TICKS: u32 = 180 * TICK_RATE;
