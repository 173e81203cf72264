//! Match State Definitions
//!
//! Everything one match owns: player slots, live units and projectiles,
//! the spawn queue, the spatial index and the outbox of messages produced
//! while the state was mutated. The whole struct sits behind one session
//! lock; nothing in here is synchronised on its own.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::bounds::Bounds;
use crate::core::quadtree::Quadtree;
use crate::game::events::{GameEvent, Outbound, Recipient, RosterEntry};
use crate::game::player::PlayerState;
use crate::game::projectile::Projectile;
use crate::game::spawn::Spawn;
use crate::game::tick::MatchConfig;
use crate::game::unit::Unit;

/// Unique session identifier (UUID bytes).
pub type SessionId = [u8; 16];

/// Entity id, unique within one match.
pub type EntityId = u16;

/// Stable per-connection key. Slot indices move when players leave,
/// keys never do.
pub type PlayerKey = u64;

/// Maximum players in one session.
pub const MAX_PLAYERS: usize = 3;

// =============================================================================
// TEAM
// =============================================================================

/// Team affiliation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    /// Team 0: wins when the clock runs out.
    #[default]
    Defender = 0,
    /// Team 1.
    Attacker = 1,
    /// Team 2: the neutral poison faction converted units join.
    Poison = 2,
}

impl Team {
    /// Team from its wire index (0-2).
    pub fn from_index(index: u8) -> Option<Team> {
        match index {
            0 => Some(Team::Defender),
            1 => Some(Team::Attacker),
            2 => Some(Team::Poison),
            _ => None,
        }
    }

    /// Wire index.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// MATCH STATUS
// =============================================================================

/// Lifecycle of a session's match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Pre-match: naming, team selection, decks, chat.
    Room,
    /// Match running.
    Active,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete mutable state of one match.
#[derive(Debug)]
pub struct MatchState {
    /// Session identifier.
    pub id: SessionId,

    /// Room or Active.
    pub status: MatchStatus,

    /// Game tuning.
    pub config: MatchConfig,

    /// Occupied player slots in join order. Removing a player compacts.
    pub players: Vec<PlayerState>,

    /// Ticks left in the running match.
    pub ticks_remaining: u32,

    /// Live units.
    pub units: Vec<Unit>,

    /// Live projectiles.
    pub projectiles: Vec<Projectile>,

    /// Pending spawn requests.
    pub spawner: Vec<Spawn>,

    /// Spatial index over unit footprints, rebuilt every tick.
    pub index: Quadtree,

    /// Unit id -> position in `units`.
    unit_lookup: BTreeMap<EntityId, usize>,

    /// Next entity id to hand out.
    next_entity_id: EntityId,

    /// Next wire id for a joining player.
    next_player_id: u16,

    /// Ticks until the next ping probe.
    pub(crate) heartbeat: u32,

    /// Messages produced since the last drain.
    outbox: Vec<Outbound>,

    /// Notable events of the running match, for the store.
    pub(crate) match_log: Vec<String>,
}

impl MatchState {
    /// Create an empty room.
    pub fn new(id: SessionId, config: MatchConfig) -> Self {
        Self {
            id,
            status: MatchStatus::Room,
            heartbeat: config.heartbeat_interval,
            config,
            players: Vec::with_capacity(MAX_PLAYERS),
            ticks_remaining: 0,
            units: Vec::new(),
            projectiles: Vec::new(),
            spawner: Vec::new(),
            index: Quadtree::default(),
            unit_lookup: BTreeMap::new(),
            next_entity_id: 0,
            next_player_id: 1,
            outbox: Vec::new(),
            match_log: Vec::new(),
        }
    }

    // =========================================================================
    // Players
    // =========================================================================

    /// Seat a player in the first free slot. Capacity and status checks are
    /// the caller's job.
    pub fn add_player(&mut self, key: PlayerKey) -> u16 {
        let id = self.next_player_id;
        self.next_player_id = self.next_player_id.wrapping_add(1);
        self.players.push(PlayerState::new(key, id));
        id
    }

    /// Remove a player; later slots shift down.
    pub fn remove_player(&mut self, key: PlayerKey) -> Option<PlayerState> {
        let slot = self.slot_of(key)?;
        Some(self.players.remove(slot))
    }

    /// Slot index of a player.
    pub fn slot_of(&self, key: PlayerKey) -> Option<usize> {
        self.players.iter().position(|p| p.key == key)
    }

    /// Player by key.
    pub fn player(&self, key: PlayerKey) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.key == key)
    }

    /// Mutable player by key.
    pub fn player_mut(&mut self, key: PlayerKey) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.key == key)
    }

    /// Player that takes ownership of poison-converted units.
    pub fn poison_owner(&self) -> Option<PlayerKey> {
        self.players
            .iter()
            .find(|p| p.team == Team::Poison)
            .map(|p| p.key)
    }

    /// Number of seated players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// True when no further player fits.
    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Roster snapshot in slot order.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.players.iter().map(PlayerState::roster_entry).collect()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Hand out the next entity id.
    pub fn allocate_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    /// Reset the id counter at match start.
    pub(crate) fn reset_entity_ids(&mut self, first: EntityId) {
        self.next_entity_id = first;
    }

    /// Rebuild the id -> index lookup after the unit list changed.
    pub fn reindex_units(&mut self) {
        self.unit_lookup.clear();
        for (i, unit) in self.units.iter().enumerate() {
            self.unit_lookup.insert(unit.id, i);
        }
    }

    /// Current index of a unit id, if it is still alive in the list.
    pub fn unit_index(&self, id: EntityId) -> Option<usize> {
        let i = *self.unit_lookup.get(&id)?;
        (self.units.get(i)?.id == id).then_some(i)
    }

    /// Rebuild the spatial index from current unit footprints.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for unit in &self.units {
            self.index.insert(unit.id, unit.bounds);
        }
    }

    /// Indices of live units whose current footprint overlaps `area`.
    ///
    /// Candidates come from the spatial index; exact overlap is re-checked
    /// against the unit's current bounds.
    pub fn units_in(&self, area: &Bounds) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .index
            .retrieve(area)
            .into_iter()
            .filter_map(|entry| self.unit_index(entry.id))
            .filter(|&i| self.units[i].bounds.intersects(area))
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Nearest live unit overlapping `area` that satisfies `accept`,
    /// measured from `from`.
    pub fn nearest_unit<F>(&self, from: &Bounds, area: &Bounds, accept: F) -> Option<EntityId>
    where
        F: Fn(&Unit) -> bool,
    {
        self.units_in(area)
            .into_iter()
            .map(|i| &self.units[i])
            .filter(|u| !u.is_dead() && accept(u))
            .min_by(|a, b| {
                from.center_distance_squared(&a.bounds)
                    .total_cmp(&from.center_distance_squared(&b.bounds))
            })
            .map(|u| u.id)
    }

    /// Queue a spawn request.
    pub fn spawn(&mut self, spawn: Spawn) {
        self.spawner.push(spawn);
    }

    /// Remove every entity and pending spawn.
    pub(crate) fn clear_entities(&mut self) {
        self.units.clear();
        self.projectiles.clear();
        self.spawner.clear();
        self.index.clear();
        self.unit_lookup.clear();
    }

    // =========================================================================
    // Outbox
    // =========================================================================

    /// Queue a message for every seated player.
    pub fn broadcast(&mut self, event: GameEvent) {
        self.outbox.push(Outbound { to: Recipient::All, event });
    }

    /// Queue a message for one player.
    pub fn send_to(&mut self, key: PlayerKey, event: GameEvent) {
        self.outbox.push(Outbound { to: Recipient::Player(key), event });
    }

    /// Take every queued message.
    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Append to the match log kept for the store.
    pub(crate) fn log_event(&mut self, entry: String) {
        if self.status == MatchStatus::Active {
            self.match_log.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::unit::Unit;

    fn state() -> MatchState {
        MatchState::new([0; 16], MatchConfig::default())
    }

    #[test]
    fn test_team_from_index() {
        assert_eq!(Team::from_index(0), Some(Team::Defender));
        assert_eq!(Team::from_index(2), Some(Team::Poison));
        assert_eq!(Team::from_index(3), None);
        assert_eq!(Team::Attacker.index(), 1);
    }

    #[test]
    fn test_remove_player_compacts_slots() {
        let mut state = state();
        state.add_player(10);
        state.add_player(11);
        state.add_player(12);
        assert!(state.is_full());

        state.remove_player(11);
        assert_eq!(state.player_count(), 2);
        assert_eq!(state.slot_of(12), Some(1));
        assert!(!state.is_full());
    }

    #[test]
    fn test_player_ids_are_not_slots() {
        let mut state = state();
        let a = state.add_player(1);
        state.remove_player(1);
        let b = state.add_player(2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_units_in_rechecks_overlap() {
        let mut state = state();
        let mut near = Unit::pen();
        near.id = 1;
        near.bounds.x = 0.0;
        let mut far = Unit::pen();
        far.id = 2;
        far.bounds.x = 30.0;
        state.units = vec![near, far];
        state.reindex_units();
        state.rebuild_index();

        let hits = state.units_in(&Bounds::new(-1.0, 0.0, 2.0, 1.0));
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_unit_index_after_removal() {
        let mut state = state();
        let mut a = Unit::pen();
        a.id = 5;
        let mut b = Unit::pen();
        b.id = 6;
        state.units = vec![a, b];
        state.reindex_units();
        state.units.remove(0);
        // Stale until reindexed, but never resolves to the wrong unit.
        assert_eq!(state.unit_index(5), None);
        state.reindex_units();
        assert_eq!(state.unit_index(6), Some(0));
    }

    #[test]
    fn test_outbox_drains() {
        let mut state = state();
        state.broadcast(GameEvent::PingProbe);
        state.send_to(3, GameEvent::MatchStarted);
        let out = state.take_outbox();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].to, Recipient::Player(3));
        assert!(state.take_outbox().is_empty());
    }
}
