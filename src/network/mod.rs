//! Network Layer
//!
//! TCP server for real-time multiplayer play. Everything here is plumbing
//! around `game/`: frames in, commands to the session, events out.

pub mod protocol;
pub mod session;
pub mod registry;
pub mod server;

pub use protocol::{ClientMessage, ProtocolError, read_frame, write_frame};
pub use session::{MatchSession, SessionConfig, SessionError};
pub use registry::SessionRegistry;
pub use server::{GameServer, GameServerError};
