//! Spawn Queue
//!
//! Cards and turrets never insert entities directly. They queue a `Spawn`
//! with a delay in ticks; the tick drains due entries, binds them to the
//! world and tells the owner where they landed.

use crate::game::events::GameEvent;
use crate::game::magic::Magic;
use crate::game::projectile::Projectile;
use crate::game::state::{MatchState, PlayerKey, Team};
use crate::game::unit::{self, Unit};

/// What a spawn produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Inserted into the unit list.
    Unit(Unit),
    /// Inserted into the projectile list.
    Projectile(Projectile),
    /// Resolved on the spot.
    Magic(Magic),
}

/// Deferred entity creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Spawn {
    /// Player credited with the entity.
    pub owner: Option<PlayerKey>,
    /// Team the entity fights for.
    pub team: Team,
    /// Requested X (the footprint is centred on it).
    pub x: f64,
    /// Requested Y.
    pub y: f64,
    /// Ticks to wait.
    pub delay: u8,
    /// What to create.
    pub payload: Payload,
}

/// Resolve every due spawn and count down the rest.
pub fn drain(state: &mut MatchState) {
    let pending = std::mem::take(&mut state.spawner);
    let mut waiting = Vec::with_capacity(pending.len());

    for mut spawn in pending {
        if spawn.delay > 0 {
            spawn.delay -= 1;
            waiting.push(spawn);
        } else {
            resolve(state, spawn);
        }
    }

    // Anything queued while resolving waits for the next drain.
    waiting.append(&mut state.spawner);
    state.spawner = waiting;
}

fn resolve(state: &mut MatchState, spawn: Spawn) {
    let Spawn { owner, team, x, y, payload, .. } = spawn;
    let id = state.allocate_entity_id();

    match payload {
        Payload::Unit(mut u) => {
            u.bounds.x = x - u.bounds.width / 2.0;
            u.bounds.y = y;
            u.owner = owner;
            u.team = team;
            u.id = id;
            state.units.push(u);
            let idx = state.units.len() - 1;
            unit::activate(state, idx);
        }
        Payload::Projectile(mut p) => {
            p.bounds.x = x - p.bounds.width / 2.0;
            p.bounds.y = y;
            p.owner = owner;
            p.team = team;
            p.id = id;
            p.activate();
            state.projectiles.push(p);
        }
        Payload::Magic(magic) => magic.run(state, team, x, y),
    }

    if let Some(owner) = owner {
        state.send_to(owner, GameEvent::SpawnResolved { x, y });
    }
}
