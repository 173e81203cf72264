//! Authoritative Simulation Tick
//!
//! One fixed step of a match. The session calls `tick()` at `TICK_RATE`
//! while holding its lock; everything the step wants clients to know is
//! left in the state's outbox.

use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::game::events::GameEvent;
use crate::game::projectile;
use crate::game::spawn;
use crate::game::state::{MatchState, MatchStatus, Team};
use crate::game::unit::{self, Unit};
use crate::store::{MatchRecord, PlayerRecord};
use crate::{MATCH_DURATION_TICKS, TICK_RATE};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Whether the match ended this tick.
    pub match_ended: bool,
    /// Winning team, when it ended.
    pub winner: Option<Team>,
    /// Summary to persist, when it ended.
    pub record: Option<MatchRecord>,
}

/// Configuration for match simulation.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Match length in ticks.
    pub duration_ticks: u32,
    /// Regen timer decrement per tick.
    pub energy_speed: u16,
    /// Ticks per regenerated energy point.
    pub energy_regen_ticks: u16,
    /// Energy every player starts a match with.
    pub starting_energy: u16,
    /// Energy cap at match start.
    pub max_energy: u16,
    /// Ticks between ping probes.
    pub heartbeat_interval: u32,
    /// Card spawn delay before latency compensation.
    pub base_spawn_delay: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            duration_ticks: MATCH_DURATION_TICKS,
            energy_speed: 1,
            energy_regen_ticks: 120,
            starting_energy: 5,
            max_energy: 10,
            heartbeat_interval: 60,
            base_spawn_delay: 80,
        }
    }
}

/// Run one simulation tick.
///
/// Order within an active tick: resolve due spawns, rebuild the spatial
/// index, frame units then projectiles, sweep dead or poisoned units, sweep
/// consumed projectiles, regenerate energy, publish status and snapshot,
/// count down and check the win conditions.
pub fn tick(state: &mut MatchState, now: Instant) -> TickResult {
    let mut result = TickResult::default();

    // 1. Heartbeat
    if state.heartbeat == 0 {
        for player in &mut state.players {
            player.record_probe(now);
        }
        state.broadcast(GameEvent::PingProbe);
        state.heartbeat = state.config.heartbeat_interval;
    }
    state.heartbeat = state.heartbeat.saturating_sub(1);

    // 2. Roster, in every status
    let roster = state.roster();
    state.broadcast(GameEvent::Roster(roster));

    if state.status != MatchStatus::Active {
        return result;
    }

    // 3. Spawns
    spawn::drain(state);

    // 4. Index
    state.reindex_units();
    state.rebuild_index();

    // 5. Frames
    for i in 0..state.units.len() {
        unit::frame(state, i);
    }
    for i in 0..state.projectiles.len() {
        projectile::frame(state, i);
    }

    // 6. Sweeps
    sweep_units(state);
    sweep_projectiles(state);

    // 7. Energy
    let (speed, period) = (state.config.energy_speed, state.config.energy_regen_ticks);
    for player in &mut state.players {
        player.regenerate(speed, period);
    }

    // 8. Publish
    publish(state);

    // 9. Clock and win conditions
    state.ticks_remaining = state.ticks_remaining.saturating_sub(1);
    let winner = if state.units.iter().all(|u| u.team == Team::Poison) {
        Some(Team::Poison)
    } else if state.ticks_remaining == 0 {
        Some(Team::Defender)
    } else {
        None
    };

    if let Some(winner) = winner {
        result.record = end_match(state, winner);
        result.match_ended = true;
        result.winner = Some(winner);
    }

    result
}

fn sweep_units(state: &mut MatchState) {
    let mut i = 0;
    while i < state.units.len() {
        if state.units[i].is_dead() {
            unit::on_death(state, i);
            let dead = state.units.remove(i);
            state.broadcast(GameEvent::EntityRemoved(dead.id));
            state.log_event(format!("unit {} (type {}) destroyed", dead.id, dead.type_id));
            continue;
        }
        if state.units[i].team != Team::Poison && state.units[i].is_poisoned_out() {
            unit::convert_to_poison(state, i);
        }
        i += 1;
    }
    state.reindex_units();
}

fn sweep_projectiles(state: &mut MatchState) {
    let mut i = 0;
    while i < state.projectiles.len() {
        if state.projectiles[i].consumed {
            projectile::on_death(state, i);
            let gone = state.projectiles.remove(i);
            state.broadcast(GameEvent::EntityRemoved(gone.id));
            continue;
        }
        i += 1;
    }
}

fn publish(state: &mut MatchState) {
    let seconds_left = u16::try_from(state.ticks_remaining / TICK_RATE).unwrap_or(u16::MAX);
    let statuses: Vec<_> = state
        .players
        .iter()
        .map(|p| (p.key, p.status(seconds_left)))
        .collect();
    for (key, status) in statuses {
        state.send_to(key, GameEvent::PlayerStatus(status));
    }

    let snapshot = state
        .units
        .iter()
        .filter_map(Unit::record)
        .map(Into::into)
        .chain(state.projectiles.iter().map(|p| p.record().into()))
        .collect();
    state.broadcast(GameEvent::Snapshot(snapshot));
}

/// Move the room into a running match. Returns false when not in the room
/// or nobody is seated.
pub fn start_match(state: &mut MatchState) -> bool {
    if state.status != MatchStatus::Room || state.players.is_empty() {
        return false;
    }

    let config = state.config.clone();
    for player in &mut state.players {
        player.reset_for_match(config.starting_energy, config.max_energy, config.energy_regen_ticks);
    }

    state.clear_entities();
    state.match_log.clear();

    let host = &state.players[0];
    let mut earth = Unit::earth();
    earth.owner = Some(host.key);
    earth.team = host.team;
    earth.id = 0;
    state.units.push(earth);
    unit::activate(state, 0);
    state.reset_entity_ids(1);
    state.reindex_units();

    state.ticks_remaining = config.duration_ticks;
    state.status = MatchStatus::Active;
    state.broadcast(GameEvent::MatchStarted);

    let names: Vec<&str> = state.players.iter().map(|p| p.display_name()).collect();
    let entry = format!("match started: {}", names.join(", "));
    state.log_event(entry);

    info!(
        session = %hex::encode(&state.id[..4]),
        players = state.players.len(),
        "Match started"
    );
    true
}

/// Finish the running match: owner-bound effects are undone, the world is
/// cleared, the room reopens and the winner is announced.
pub fn end_match(state: &mut MatchState, winner: Team) -> Option<MatchRecord> {
    if state.status != MatchStatus::Active {
        return None;
    }

    for i in 0..state.units.len() {
        unit::on_death(state, i);
    }
    state.clear_entities();
    state.status = MatchStatus::Room;
    state.broadcast(GameEvent::MatchEnded(winner));

    info!(
        session = %hex::encode(&state.id[..4]),
        winner = winner.index(),
        "Match ended"
    );

    Some(MatchRecord {
        match_id: Uuid::new_v4(),
        session: hex::encode(state.id),
        winner_team: winner.index(),
        players: state
            .players
            .iter()
            .map(|p| PlayerRecord {
                name: p.display_name().to_owned(),
                team: p.team.index(),
            })
            .collect(),
        events: std::mem::take(&mut state.match_log),
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{Outbound, Recipient};

    fn room(players: &[(u64, Team)]) -> MatchState {
        let mut state = MatchState::new([7; 16], MatchConfig::default());
        for &(key, team) in players {
            state.add_player(key);
            if let Some(p) = state.player_mut(key) {
                p.team = team;
            }
        }
        state
    }

    fn events(out: &[Outbound]) -> Vec<&GameEvent> {
        out.iter().map(|o| &o.event).collect()
    }

    #[test]
    fn test_room_tick_only_sends_roster() {
        let mut state = room(&[(1, Team::Defender)]);
        let result = tick(&mut state, Instant::now());
        assert!(!result.match_ended);
        let out = state.take_outbox();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].event, GameEvent::Roster(ref r) if r.len() == 1));
    }

    #[test]
    fn test_start_requires_room_and_players() {
        let mut empty = room(&[]);
        assert!(!start_match(&mut empty));

        let mut state = room(&[(1, Team::Defender)]);
        assert!(start_match(&mut state));
        assert!(!start_match(&mut state));
    }

    #[test]
    fn test_start_sets_up_match() {
        let mut state = room(&[(1, Team::Defender), (2, Team::Attacker)]);
        assert!(start_match(&mut state));

        assert_eq!(state.status, MatchStatus::Active);
        assert_eq!(state.ticks_remaining, MATCH_DURATION_TICKS);
        assert_eq!(state.units.len(), 1);
        let earth = &state.units[0];
        assert_eq!((earth.id, earth.type_id, earth.owner), (0, 5, Some(1)));
        assert_eq!(earth.bounds.x, -3.0);
        for p in &state.players {
            assert_eq!((p.energy, p.max_energy, p.energy_timer), (5, 10, 120));
        }
        assert_eq!(state.allocate_entity_id(), 1);
        assert!(events(&state.take_outbox()).contains(&&GameEvent::MatchStarted));
    }

    #[test]
    fn test_heartbeat_every_sixty_ticks() {
        let mut state = room(&[(1, Team::Defender)]);
        let now = Instant::now();
        let mut probes = 0;
        for _ in 0..121 {
            tick(&mut state, now);
            probes += state
                .take_outbox()
                .iter()
                .filter(|o| o.event == GameEvent::PingProbe)
                .count();
        }
        assert_eq!(probes, 2);
        assert_eq!(state.players[0].pending_pings.len(), 2);
    }

    #[test]
    fn test_countdown_expiry_defenders_win() {
        let mut state = room(&[(1, Team::Defender), (2, Team::Attacker)]);
        state.config.duration_ticks = 3;
        start_match(&mut state);
        let mut pen = Unit::pen();
        pen.id = 60;
        pen.team = Team::Attacker;
        pen.owner = Some(2);
        pen.visible = true;
        pen.bounds.x = 40.0;
        state.units.push(pen);

        let now = Instant::now();
        assert!(!tick(&mut state, now).match_ended);
        assert!(!tick(&mut state, now).match_ended);
        // Both non-poison teams still field a live unit.
        assert!(state.units.iter().any(|u| u.team == Team::Defender && !u.is_dead()));
        assert!(state.units.iter().any(|u| u.team == Team::Attacker && !u.is_dead()));
        let result = tick(&mut state, now);
        assert!(result.match_ended);
        assert_eq!(result.winner, Some(Team::Defender));
        assert_eq!(state.status, MatchStatus::Room);
        assert!(state.units.is_empty());

        let record = result.record.expect("record");
        assert_eq!(record.winner_team, 0);
        assert_eq!(record.players.len(), 2);
        assert!(events(&state.take_outbox()).contains(&&GameEvent::MatchEnded(Team::Defender)));
    }

    #[test]
    fn test_all_poison_survivors_win() {
        let mut state = room(&[(1, Team::Defender), (2, Team::Poison)]);
        start_match(&mut state);
        // Only the Earth is alive; turn it poison.
        state.units[0].poison = state.units[0].health;

        let result = tick(&mut state, Instant::now());
        assert_eq!(result.winner, Some(Team::Poison));
        assert_eq!(state.status, MatchStatus::Room);
    }

    #[test]
    fn test_poison_conversion_happens_once() {
        let mut state = room(&[(1, Team::Defender), (2, Team::Attacker), (3, Team::Poison)]);
        start_match(&mut state);
        let mut pen = Unit::pen();
        pen.id = 50;
        pen.team = Team::Attacker;
        pen.owner = Some(2);
        pen.visible = true;
        pen.bounds.x = 40.0;
        pen.poison = 600;
        state.units.push(pen);

        tick(&mut state, Instant::now());
        let pen = state.units.iter().find(|u| u.id == 50).expect("pen");
        assert_eq!(pen.team, Team::Poison);
        assert_eq!(pen.owner, Some(3));
        assert_eq!(pen.poison, pen.health);

        tick(&mut state, Instant::now());
        let pen = state.units.iter().find(|u| u.id == 50).expect("pen");
        assert_eq!((pen.team, pen.owner), (Team::Poison, Some(3)));
    }

    #[test]
    fn test_dead_unit_removed_and_announced() {
        let mut state = room(&[(1, Team::Defender)]);
        start_match(&mut state);
        let mut pen = Unit::pen();
        pen.id = 9;
        pen.team = Team::Attacker;
        pen.bounds.x = 90.0;
        state.units.push(pen);
        state.take_outbox();

        tick(&mut state, Instant::now());
        assert!(state.units.iter().all(|u| u.id != 9));
        let out = state.take_outbox();
        assert!(events(&out).contains(&&GameEvent::EntityRemoved(9)));
    }

    #[test]
    fn test_status_is_private() {
        let mut state = room(&[(1, Team::Defender), (2, Team::Attacker)]);
        start_match(&mut state);
        state.take_outbox();
        tick(&mut state, Instant::now());

        let statuses: Vec<_> = state
            .take_outbox()
            .into_iter()
            .filter(|o| matches!(o.event, GameEvent::PlayerStatus(_)))
            .map(|o| o.to)
            .collect();
        assert_eq!(statuses, vec![Recipient::Player(1), Recipient::Player(2)]);
    }

    #[test]
    fn test_end_match_reverts_owner_effects() {
        let mut state = room(&[(1, Team::Defender), (2, Team::Attacker)]);
        start_match(&mut state);
        let mut bag = Unit::bag();
        bag.owner = Some(1);
        bag.id = 3;
        state.units.push(bag);
        let idx = state.units.len() - 1;
        unit::activate(&mut state, idx);
        assert_eq!(state.players[0].max_energy, 11);

        end_match(&mut state, Team::Defender);
        assert_eq!(state.players[0].max_energy, 10);
    }
}
