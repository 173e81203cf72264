//! Game Events
//!
//! Messages the simulation produces for clients. The game layer only
//! decides what happened and who should hear about it; encoding to bytes
//! is `network::protocol`'s job.

use serde::{Serialize, Deserialize};

use crate::game::state::{EntityId, PlayerKey, Team};

/// Length of the fixed name field on the wire.
pub const NAME_LEN: usize = 20;

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every seated player.
    All,
    /// One player.
    Player(PlayerKey),
}

/// Event addressed to its recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Recipients.
    pub to: Recipient,
    /// Payload.
    pub event: GameEvent,
}

/// Server-to-client events.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Every seated player, slot order.
    Roster(Vec<RosterEntry>),
    /// The match left the room and is running.
    MatchStarted,
    /// Chat line, already prefixed with the sender's name.
    Chat(String),
    /// Private economy snapshot for one player.
    PlayerStatus(PlayerStatus),
    /// All visible units, then all projectiles.
    Snapshot(Vec<EntityRecord>),
    /// Latency probe; the client answers with a ping response.
    PingProbe,
    /// Entity left the world.
    EntityRemoved(EntityId),
    /// Match over; the winning team.
    MatchEnded(Team),
    /// One of the recipient's queued spawns materialised.
    SpawnResolved {
        /// Spawn X.
        x: f64,
        /// Spawn Y.
        y: f64,
    },
}

/// One roster line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Wire id.
    pub id: u16,
    /// Team.
    pub team: Team,
    /// Display name, empty until the player joins with one.
    pub name: String,
}

/// Card as seen in the player's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardRecord {
    /// Catalog id.
    pub id: u32,
    /// Current cost after discounts.
    pub cost: u16,
}

/// Economy snapshot sent to one player each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    /// Wire id.
    pub id: u16,
    /// Current energy.
    pub energy: u16,
    /// Energy cap.
    pub max_energy: u16,
    /// Whole seconds left in the match.
    pub seconds_left: u16,
    /// Play order over deck slots.
    pub order: [u8; 8],
    /// Deck in slot order.
    pub deck: [CardRecord; 8],
}

/// Snapshot line for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRecord {
    /// A unit.
    Unit(UnitRecord),
    /// A projectile.
    Projectile(ProjectileRecord),
}

impl From<UnitRecord> for EntityRecord {
    fn from(record: UnitRecord) -> Self {
        EntityRecord::Unit(record)
    }
}

impl From<ProjectileRecord> for EntityRecord {
    fn from(record: ProjectileRecord) -> Self {
        EntityRecord::Projectile(record)
    }
}

/// Unit snapshot line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRecord {
    /// Entity id.
    pub id: EntityId,
    /// Kind id.
    pub type_id: u16,
    /// Team.
    pub team: Team,
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Current health.
    pub health: u32,
    /// Health cap.
    pub max_health: u32,
    /// Accumulated poison.
    pub poison: u32,
    /// Facing +X.
    pub reversed: bool,
}

/// Projectile snapshot line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileRecord {
    /// Entity id.
    pub id: EntityId,
    /// Kind id.
    pub type_id: u16,
    /// Team (the wire adds 3).
    pub team: Team,
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Heading in radians.
    pub angle: f64,
}
