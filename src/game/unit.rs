//! Units
//!
//! A unit is shared base state plus a closed set of kinds. Per-kind
//! behaviour lives in the hook functions at the bottom of this file
//! (`activate`, `frame`, `damage`, `convert_to_poison`, `on_death`), each a
//! single `match` over `UnitKind`. Hooks that reach outside the unit take the
//! whole `MatchState` and an index into `state.units`.
//!
//! Targets are stored as entity ids and resolved through the state's
//! id lookup every frame, so a unit that died or was removed simply stops
//! resolving.

use std::f64::consts::PI;

use crate::core::bounds::Bounds;
use crate::game::events::UnitRecord;
use crate::game::magic::Magic;
use crate::game::projectile::Projectile;
use crate::game::spawn::{Payload, Spawn};
use crate::game::state::{EntityId, MatchState, PlayerKey, Team};

/// Units whose origin leaves this box die.
pub const ARENA_LIMIT: f64 = 80.0;

/// Ticks between Flask energy grants.
pub const FLASK_PERIOD: u32 = 60 * 5;

/// Radius of the BigPencil's swing.
pub const MELEE_SPLASH: u32 = 3;

/// Radius of the Dictionary's heal pulse.
pub const DICTIONARY_HEAL_RADIUS: u32 = 10;

/// Sharpener bullet tuning.
pub const SHARPENER_BULLET_SPEED: f64 = 0.5;
/// Sharpener bullet lifetime in ticks.
pub const SHARPENER_BULLET_LIFE: u16 = 300;
/// Sharpener bullet kind id.
pub const SHARPENER_BULLET_TYPE: u16 = 12;

/// Attack/heal state for units that acquire targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combat {
    /// Damage or heal per action.
    pub power: u32,
    /// Depth of the detection zone in front of the unit.
    pub reach: f64,
    /// Distance walked per tick while idle.
    pub walk_speed: f64,
    /// Ticks until the next action.
    pub cooldown: u8,
    /// Cooldown reset value.
    pub max_cooldown: u8,
    /// Current target.
    pub target: Option<EntityId>,
}

impl Combat {
    const fn new(power: u32, reach: f64, walk_speed: f64, max_cooldown: u8) -> Self {
        Self {
            power,
            reach,
            walk_speed,
            cooldown: 0,
            max_cooldown,
            target: None,
        }
    }
}

/// Unit kinds and their private state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitKind {
    /// Grants its owner energy on a timer.
    Flask {
        /// Ticks until the next grant.
        timer: u32,
    },
    /// Discounts every card of its owner while alive.
    Note {
        /// Cost removed from each card.
        discount: u16,
    },
    /// Raises its owner's energy cap while alive.
    Bag {
        /// Extra max energy.
        bonus: u16,
    },
    /// Plain blocker.
    Pen,
    /// Walking melee attacker.
    BigPencil(Combat),
    /// The defenders' core objective.
    Earth,
    /// Static turret firing bullets.
    Sharpener(Combat),
    /// Pulses damage around itself every tick.
    Alarm {
        /// Damage per pulse.
        damage: u32,
        /// Pulse radius.
        radius: u32,
    },
    /// Heals allies around itself when hit.
    Dictionary {
        /// Share of incoming damage turned into healing.
        heal_ratio: f64,
    },
    /// Walking healer.
    PaintBrush(Combat),
}

/// A live unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Entity id.
    pub id: EntityId,
    /// Kind id sent to clients.
    pub type_id: u16,
    /// Owning player, if still connected.
    pub owner: Option<PlayerKey>,
    /// Team.
    pub team: Team,
    /// Footprint.
    pub bounds: Bounds,
    /// Current health.
    pub health: u32,
    /// Health cap.
    pub max_health: u32,
    /// Accumulated poison.
    pub poison: u32,
    /// Included in snapshots.
    pub visible: bool,
    /// Facing +X.
    pub reversed: bool,
    /// Kind and private state.
    pub kind: UnitKind,
}

impl Unit {
    fn base(type_id: u16, health: u32, width: f64, height: f64, kind: UnitKind) -> Self {
        Self {
            id: 0,
            type_id,
            owner: None,
            team: Team::Defender,
            bounds: Bounds::sized(width, height),
            health,
            max_health: health,
            poison: 0,
            visible: false,
            reversed: false,
            kind,
        }
    }

    /// Flask.
    pub fn flask() -> Self {
        Self::base(0, 350, 1.62, 2.71, UnitKind::Flask { timer: FLASK_PERIOD })
    }

    /// Note.
    pub fn note() -> Self {
        Self::base(1, 100, 2.25, 2.92, UnitKind::Note { discount: 1 })
    }

    /// Bag.
    pub fn bag() -> Self {
        Self::base(2, 150, 3.07, 3.59, UnitKind::Bag { bonus: 1 })
    }

    /// Pen.
    pub fn pen() -> Self {
        Self::base(3, 500, 1.0, 1.0, UnitKind::Pen)
    }

    /// BigPencil.
    pub fn big_pencil() -> Self {
        Self::base(4, 1000, 6.52, 1.49, UnitKind::BigPencil(Combat::new(250, 1.0, 0.01, 120)))
    }

    /// Earth, already placed at its fixed position.
    pub fn earth() -> Self {
        let mut earth = Self::base(5, 5000, 8.25, 4.56, UnitKind::Earth);
        earth.bounds.x = -3.0;
        earth
    }

    /// Sharpener.
    pub fn sharpener() -> Self {
        Self::base(6, 700, 3.49, 2.34, UnitKind::Sharpener(Combat::new(80, 15.0, 0.0, 60)))
    }

    /// Alarm.
    pub fn alarm() -> Self {
        Self::base(7, 200, 1.69, 1.96, UnitKind::Alarm { damage: 1, radius: 5 })
    }

    /// Dictionary.
    pub fn dictionary() -> Self {
        Self::base(8, 2000, 1.06, 3.04, UnitKind::Dictionary { heal_ratio: 0.2 })
    }

    /// PaintBrush.
    pub fn paint_brush() -> Self {
        Self::base(9, 400, 4.08, 1.29, UnitKind::PaintBrush(Combat::new(50, 2.0, 0.03, 30)))
    }

    /// Apply incoming damage from `from`. Same-team damage is ignored and
    /// poison-team damage accumulates as poison instead of health loss.
    pub fn take_damage(&mut self, amount: u32, from: Team) {
        if from == self.team {
            return;
        }

        if from == Team::Poison {
            self.poison = self.poison.saturating_add(amount);
        } else if self.health > 0 {
            self.health = self.health.saturating_sub(amount);
            if self.team == Team::Poison {
                self.poison = self.health;
            }
        }
    }

    /// Restore health from an ally, clamped to the cap.
    pub fn heal(&mut self, amount: u32, from: Team) {
        if from != self.team {
            return;
        }

        self.health = self.health.saturating_add(amount).min(self.max_health);
        if self.team == Team::Poison {
            self.poison = self.health;
        }
    }

    /// Health is gone.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Poison has caught up with health.
    #[inline]
    pub fn is_poisoned_out(&self) -> bool {
        self.poison >= self.health
    }

    /// Detection zone `reach` deep in front of the unit, `height` tall.
    pub fn detection_zone(&self, reach: f64, height: f64) -> Bounds {
        let x = if self.reversed {
            self.bounds.max_x()
        } else {
            self.bounds.x - reach
        };
        Bounds::new(x, self.bounds.y, reach, height)
    }

    /// Snapshot line; `None` while invisible.
    pub fn record(&self) -> Option<UnitRecord> {
        if !self.visible {
            return None;
        }
        Some(UnitRecord {
            id: self.id,
            type_id: self.type_id,
            team: self.team,
            x: self.bounds.x,
            y: self.bounds.y,
            health: self.health,
            max_health: self.max_health,
            poison: self.poison,
            reversed: self.reversed,
        })
    }
}

/// Whether a unit placed at `x` faces +X: it spawned on the far side for
/// its team.
pub fn faces_forward(team: Team, x: f64) -> bool {
    match team {
        Team::Defender => x > 0.0,
        _ => x < 0.0,
    }
}

// =============================================================================
// HOOKS
// =============================================================================

/// Bring a freshly inserted unit to life.
pub fn activate(state: &mut MatchState, idx: usize) {
    let unit = &mut state.units[idx];
    if unit.team == Team::Poison {
        unit.poison = unit.health;
    }
    unit.visible = true;

    let owner = unit.owner;
    let kind = unit.kind;
    match kind {
        UnitKind::BigPencil(_) | UnitKind::PaintBrush(_) => {
            unit.reversed = faces_forward(unit.team, unit.bounds.x);
            unit.bounds.y = 0.5;
        }
        UnitKind::Sharpener(_) => {
            unit.reversed = faces_forward(unit.team, unit.bounds.x);
        }
        UnitKind::Note { discount } => apply_discount(state, owner, discount),
        UnitKind::Bag { bonus } => raise_cap(state, owner, bonus),
        _ => {}
    }
}

/// Per-tick behaviour.
pub fn frame(state: &mut MatchState, idx: usize) {
    {
        let unit = &mut state.units[idx];
        if unit.bounds.x.abs() > ARENA_LIMIT || unit.bounds.y.abs() > ARENA_LIMIT {
            unit.health = 0;
        }
    }

    let kind = state.units[idx].kind;
    let kind = match kind {
        UnitKind::Flask { timer } => {
            let timer = timer.saturating_sub(1);
            if timer == 0 {
                let owner = state.units[idx].owner;
                if let Some(owner) = owner.and_then(|key| state.player_mut(key)) {
                    owner.gain_energy(1);
                }
                UnitKind::Flask { timer: FLASK_PERIOD }
            } else {
                UnitKind::Flask { timer }
            }
        }
        UnitKind::BigPencil(combat) => UnitKind::BigPencil(melee(state, idx, combat)),
        UnitKind::Sharpener(combat) => UnitKind::Sharpener(turret(state, idx, combat)),
        UnitKind::PaintBrush(combat) => UnitKind::PaintBrush(support(state, idx, combat)),
        UnitKind::Alarm { damage, radius } => {
            let unit = &state.units[idx];
            let (cx, _) = unit.bounds.center();
            let (y, team) = (unit.bounds.y, unit.team);
            Magic::damage(damage, radius).run(state, team, cx, y);
            return;
        }
        _ => return,
    };
    state.units[idx].kind = kind;
}

/// Damage a unit through its kind's hook.
pub fn damage(state: &mut MatchState, idx: usize, amount: u32, from: Team) {
    let unit = &state.units[idx];
    if let UnitKind::Dictionary { heal_ratio } = unit.kind {
        if from != unit.team {
            let heal = (f64::from(amount) * heal_ratio) as u32;
            let (cx, _) = unit.bounds.center();
            let (y, team) = (unit.bounds.y, unit.team);
            Magic::heal(heal, DICTIONARY_HEAL_RADIUS).run(state, team, cx, y);
        }
    }
    state.units[idx].take_damage(amount, from);
}

/// Hand a poisoned-out unit to the poison team. Owner-bound effects move
/// with it.
pub fn convert_to_poison(state: &mut MatchState, idx: usize) {
    let old_owner = state.units[idx].owner;
    let new_owner = state.poison_owner();
    let kind = state.units[idx].kind;

    match kind {
        UnitKind::Note { discount } => revert_discount(state, old_owner, discount),
        UnitKind::Bag { bonus } => lower_cap(state, old_owner, bonus),
        _ => {}
    }

    let unit = &mut state.units[idx];
    unit.owner = new_owner;
    unit.team = Team::Poison;
    unit.poison = unit.health;

    match kind {
        UnitKind::Note { discount } => apply_discount(state, new_owner, discount),
        UnitKind::Bag { bonus } => raise_cap(state, new_owner, bonus),
        _ => {}
    }
}

/// Undo owner-bound effects before the unit is removed.
pub fn on_death(state: &mut MatchState, idx: usize) {
    let (owner, kind) = (state.units[idx].owner, state.units[idx].kind);
    match kind {
        UnitKind::Note { discount } => revert_discount(state, owner, discount),
        UnitKind::Bag { bonus } => lower_cap(state, owner, bonus),
        _ => {}
    }
}

fn apply_discount(state: &mut MatchState, owner: Option<PlayerKey>, amount: u16) {
    if let Some(player) = owner.and_then(|key| state.player_mut(key)) {
        player.apply_discount(amount);
    }
}

fn revert_discount(state: &mut MatchState, owner: Option<PlayerKey>, amount: u16) {
    if let Some(player) = owner.and_then(|key| state.player_mut(key)) {
        player.revert_discount(amount);
    }
}

fn raise_cap(state: &mut MatchState, owner: Option<PlayerKey>, amount: u16) {
    if let Some(player) = owner.and_then(|key| state.player_mut(key)) {
        player.raise_max_energy(amount);
    }
}

fn lower_cap(state: &mut MatchState, owner: Option<PlayerKey>, amount: u16) {
    if let Some(player) = owner.and_then(|key| state.player_mut(key)) {
        player.lower_max_energy(amount);
    }
}

/// Target still resolves, is alive, passes `accept` and sits in `zone`.
fn target_in_zone<F>(state: &MatchState, target: EntityId, zone: &Bounds, accept: F) -> bool
where
    F: Fn(&Unit) -> bool,
{
    state
        .unit_index(target)
        .map(|i| &state.units[i])
        .is_some_and(|u| !u.is_dead() && accept(u) && u.bounds.intersects(zone))
}

fn walk(state: &mut MatchState, idx: usize, speed: f64) {
    let unit = &mut state.units[idx];
    let step = if unit.reversed { speed } else { -speed };
    unit.bounds.translate(step, 0.0);
}

fn melee(state: &mut MatchState, idx: usize, mut combat: Combat) -> Combat {
    let unit = &state.units[idx];
    let (from, team) = (unit.bounds, unit.team);
    let zone = unit.detection_zone(combat.reach, from.height);

    if combat.target.is_none() {
        combat.target = state.nearest_unit(&from, &zone, |u| u.team != team);
        walk(state, idx, combat.walk_speed);
    }

    if let Some(target) = combat.target {
        if target_in_zone(state, target, &zone, |u| u.team != team) {
            if combat.cooldown == 0 {
                let unit = &state.units[idx];
                let x = if unit.reversed { unit.bounds.max_x() } else { unit.bounds.x };
                let y = unit.bounds.y;
                Magic::damage(combat.power, MELEE_SPLASH).run(state, team, x, y);
                combat.cooldown = combat.max_cooldown;
            }
        } else {
            combat.target = None;
        }
    }

    combat.cooldown = combat.cooldown.saturating_sub(1);
    combat
}

fn support(state: &mut MatchState, idx: usize, mut combat: Combat) -> Combat {
    let unit = &state.units[idx];
    let (from, team, id) = (unit.bounds, unit.team, unit.id);
    let zone = unit.detection_zone(combat.reach, from.height);
    let ally = |u: &Unit| u.team == team && u.id != id;

    if combat.target.is_none() {
        combat.target = state.nearest_unit(&from, &zone, ally);
        walk(state, idx, combat.walk_speed);
    }

    if let Some(target) = combat.target {
        if target_in_zone(state, target, &zone, ally) {
            if combat.cooldown == 0 {
                if let Some(i) = state.unit_index(target) {
                    state.units[i].heal(combat.power, team);
                }
                combat.cooldown = combat.max_cooldown;
            }
        } else {
            combat.target = None;
        }
    }

    combat.cooldown = combat.cooldown.saturating_sub(1);
    combat
}

fn turret(state: &mut MatchState, idx: usize, mut combat: Combat) -> Combat {
    let unit = &state.units[idx];
    let (from, team, owner, reversed) = (unit.bounds, unit.team, unit.owner, unit.reversed);
    let zone = unit.detection_zone(combat.reach, combat.reach);

    if combat.cooldown == 0 {
        if combat.target.is_none() {
            combat.target = state.nearest_unit(&from, &zone, |u| u.team != team);
        }

        if let Some(target) = combat.target {
            if target_in_zone(state, target, &zone, |u| u.team != team) {
                let (dx, angle) = if reversed { (from.width + 1.0, 0.0) } else { (-1.0, PI) };
                let mut bullet = Projectile::bullet(
                    combat.power,
                    SHARPENER_BULLET_SPEED,
                    SHARPENER_BULLET_LIFE,
                    SHARPENER_BULLET_TYPE,
                );
                bullet.angle = angle;
                state.spawn(Spawn {
                    owner,
                    team,
                    x: from.x + dx,
                    y: from.y + 1.5,
                    delay: 0,
                    payload: Payload::Projectile(bullet),
                });
                combat.cooldown = combat.max_cooldown;
            } else {
                combat.target = None;
            }
        }
    }

    combat.cooldown = combat.cooldown.saturating_sub(1);
    combat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tick::MatchConfig;

    fn state_with(units: Vec<Unit>) -> MatchState {
        let mut state = MatchState::new([0; 16], MatchConfig::default());
        state.units = units;
        state.reindex_units();
        state.rebuild_index();
        state
    }

    fn placed(mut unit: Unit, id: EntityId, x: f64, team: Team) -> Unit {
        unit.id = id;
        unit.bounds.x = x;
        unit.team = team;
        unit.visible = true;
        unit
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut pen = Unit::pen();
        pen.take_damage(10_000, Team::Attacker);
        assert_eq!(pen.health, 0);
        assert!(pen.is_dead());
    }

    #[test]
    fn test_same_team_damage_ignored() {
        let mut pen = Unit::pen();
        pen.take_damage(100, Team::Defender);
        assert_eq!(pen.health, 500);
    }

    #[test]
    fn test_poison_damage_accumulates() {
        let mut pen = Unit::pen();
        pen.take_damage(300, Team::Poison);
        assert_eq!(pen.health, 500);
        assert_eq!(pen.poison, 300);
        assert!(!pen.is_poisoned_out());
        pen.take_damage(200, Team::Poison);
        assert!(pen.is_poisoned_out());
    }

    #[test]
    fn test_poison_team_mirrors_health() {
        let mut pen = Unit::pen();
        pen.team = Team::Poison;
        pen.poison = pen.health;
        pen.take_damage(100, Team::Defender);
        assert_eq!(pen.health, 400);
        assert_eq!(pen.poison, 400);
        pen.heal(50, Team::Poison);
        assert_eq!(pen.poison, 450);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut pen = Unit::pen();
        pen.health = 450;
        pen.heal(200, Team::Defender);
        assert_eq!(pen.health, 500);
        pen.heal(200, Team::Attacker);
        assert_eq!(pen.health, 500);
    }

    #[test]
    fn test_invisible_unit_has_no_record() {
        let pen = Unit::pen();
        assert!(pen.record().is_none());
    }

    #[test]
    fn test_facing() {
        assert!(faces_forward(Team::Defender, 10.0));
        assert!(!faces_forward(Team::Defender, -10.0));
        assert!(faces_forward(Team::Attacker, -10.0));
        assert!(faces_forward(Team::Poison, -1.0));
    }

    #[test]
    fn test_leaving_arena_kills() {
        let mut state = state_with(vec![placed(Unit::pen(), 1, 81.0, Team::Defender)]);
        frame(&mut state, 0);
        assert!(state.units[0].is_dead());
    }

    #[test]
    fn test_big_pencil_walks_when_idle() {
        let mut pencil = placed(Unit::big_pencil(), 1, -20.0, Team::Defender);
        pencil.bounds.y = 0.5;
        let mut state = state_with(vec![pencil]);
        frame(&mut state, 0);
        assert!((state.units[0].bounds.x - (-20.01)).abs() < 1e-9);
    }

    #[test]
    fn test_big_pencil_strikes_enemy_in_front() {
        let mut pencil = placed(Unit::big_pencil(), 1, 0.0, Team::Defender);
        pencil.bounds.y = 0.5;
        let enemy = placed(Unit::pen(), 2, -1.0, Team::Attacker);
        let mut state = state_with(vec![pencil, enemy]);

        frame(&mut state, 0);
        assert_eq!(state.units[1].health, 250);
        match state.units[0].kind {
            UnitKind::BigPencil(c) => {
                assert_eq!(c.target, Some(2));
                assert_eq!(c.cooldown, 119);
            }
            other => panic!("unexpected kind {other:?}"),
        }

        // Cooling down: no second hit next tick.
        state.rebuild_index();
        frame(&mut state, 0);
        assert_eq!(state.units[1].health, 250);
    }

    #[test]
    fn test_sharpener_queues_bullet() {
        let turret = placed(Unit::sharpener(), 1, 0.0, Team::Defender);
        let enemy = placed(Unit::pen(), 2, -10.0, Team::Attacker);
        let mut state = state_with(vec![turret, enemy]);

        frame(&mut state, 0);
        assert_eq!(state.spawner.len(), 1);
        let spawn = &state.spawner[0];
        assert_eq!(spawn.team, Team::Defender);
        assert_eq!(spawn.x, -1.0);
        assert_eq!(spawn.y, 1.5);
        assert!(matches!(spawn.payload, Payload::Projectile(_)));
    }

    #[test]
    fn test_sharpener_bullet_flies_straight() {
        let turret = placed(Unit::sharpener(), 1, 5.0, Team::Defender);
        let mut enemy = placed(Unit::pen(), 2, 1.0, Team::Attacker);
        enemy.bounds.y = 3.0;
        let mut state = state_with(vec![turret, enemy]);

        frame(&mut state, 0);
        crate::game::spawn::drain(&mut state);
        assert_eq!(state.projectiles.len(), 1);
        let before = state.projectiles[0].angle;
        assert_eq!(before, PI);

        state.rebuild_index();
        crate::game::projectile::frame(&mut state, 0);
        assert_eq!(state.projectiles[0].angle, before);
    }

    #[test]
    fn test_alarm_pulses_enemies() {
        let alarm = placed(Unit::alarm(), 1, 0.0, Team::Defender);
        let enemy = placed(Unit::pen(), 2, 2.0, Team::Attacker);
        let mut state = state_with(vec![alarm, enemy]);
        frame(&mut state, 0);
        assert_eq!(state.units[1].health, 499);
    }

    #[test]
    fn test_paint_brush_heals_ally_not_self() {
        let mut brush = placed(Unit::paint_brush(), 1, 0.0, Team::Defender);
        brush.health = 100;
        brush.bounds.y = 0.5;
        let mut ally = placed(Unit::pen(), 2, -1.5, Team::Defender);
        ally.health = 100;
        let mut state = state_with(vec![brush, ally]);

        frame(&mut state, 0);
        assert_eq!(state.units[1].health, 150);
        assert_eq!(state.units[0].health, 100);
    }

    #[test]
    fn test_dictionary_heals_neighbours_when_hit() {
        let dict = placed(Unit::dictionary(), 1, 0.0, Team::Defender);
        let mut ally = placed(Unit::pen(), 2, 2.0, Team::Defender);
        ally.health = 100;
        let mut state = state_with(vec![dict, ally]);

        damage(&mut state, 0, 500, Team::Attacker);
        // Already at full health, so its own share of the pulse is lost.
        assert_eq!(state.units[0].health, 1500);
        assert_eq!(state.units[1].health, 200);
    }

    #[test]
    fn test_note_discount_lifecycle() {
        let mut state = state_with(Vec::new());
        state.add_player(7);
        state.add_player(8);
        state.players[1].team = Team::Poison;
        state.players[0].set_deck(&[1, 2]);
        let base = state.players[0].deck[0].cost;

        let mut note = placed(Unit::note(), 1, 0.0, Team::Defender);
        note.owner = Some(7);
        state.units.push(note);
        activate(&mut state, 0);
        assert_eq!(state.players[0].deck[0].cost, base - 1);

        convert_to_poison(&mut state, 0);
        assert_eq!(state.units[0].team, Team::Poison);
        assert_eq!(state.units[0].owner, Some(8));
        assert_eq!(state.players[0].deck[0].cost, base);
        // The poison player's empty slots only record overcost.
        assert_eq!(state.players[1].deck[0].overcost, 1);

        on_death(&mut state, 0);
        assert_eq!(state.players[1].deck[0].overcost, 0);
    }

    #[test]
    fn test_bag_cap_lifecycle() {
        let mut state = state_with(Vec::new());
        state.add_player(7);
        state.players[0].max_energy = 10;
        state.players[0].energy = 10;

        let mut bag = placed(Unit::bag(), 1, 0.0, Team::Defender);
        bag.owner = Some(7);
        state.units.push(bag);
        activate(&mut state, 0);
        assert_eq!(state.players[0].max_energy, 11);

        state.players[0].energy = 11;
        on_death(&mut state, 0);
        assert_eq!(state.players[0].max_energy, 10);
        assert_eq!(state.players[0].energy, 10);
    }
}
