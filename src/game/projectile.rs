//! Projectiles
//!
//! Short-lived moving entities. A projectile never takes damage; it is
//! marked consumed by its own frame hook and swept at the end of the tick,
//! firing its carried magic (if any) at the spot it died.

use crate::core::bounds::Bounds;
use crate::game::events::ProjectileRecord;
use crate::game::magic::Magic;
use crate::game::state::{EntityId, MatchState, PlayerKey, Team};
use crate::game::unit::{self, ARENA_LIMIT};

/// Fall speed of thrown items per tick.
pub const THROWER_FALL: f64 = 0.1;

/// Kind id for crayons.
pub const CRAYON_TYPE: u16 = 14;

/// Projectile kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileKind {
    /// Dropped from `height`, lands on the ground line.
    Thrower {
        /// Starting height.
        height: f64,
    },
    /// Straight shot along its heading.
    Bullet {
        /// Damage per hit unit.
        damage: u32,
        /// Distance per tick.
        speed: f64,
        /// Ticks left.
        life: u16,
    },
    /// Travels along a fixed vector.
    Crayon {
        /// Damage on hit.
        damage: u32,
        /// Multiplier on the vector.
        speed: f64,
        /// Vector X.
        dx: f64,
        /// Vector Y.
        dy: f64,
    },
}

/// A live projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Entity id.
    pub id: EntityId,
    /// Kind id sent to clients.
    pub type_id: u16,
    /// Player that launched it.
    pub owner: Option<PlayerKey>,
    /// Team.
    pub team: Team,
    /// Footprint.
    pub bounds: Bounds,
    /// Heading in radians.
    pub angle: f64,
    /// Done; removed at the end of the tick.
    pub consumed: bool,
    /// Fired where the projectile dies.
    pub magic: Option<Magic>,
    /// Kind.
    pub kind: ProjectileKind,
}

impl Projectile {
    fn base(type_id: u16, kind: ProjectileKind) -> Self {
        Self {
            id: 0,
            type_id,
            owner: None,
            team: Team::Defender,
            bounds: Bounds::default(),
            angle: 0.0,
            consumed: false,
            magic: None,
            kind,
        }
    }

    /// Thrown item carrying `magic`.
    pub fn thrower(height: f64, type_id: u16, magic: Magic) -> Self {
        let mut p = Self::base(type_id, ProjectileKind::Thrower { height });
        p.magic = Some(magic);
        p
    }

    /// Bullet.
    pub fn bullet(damage: u32, speed: f64, life: u16, type_id: u16) -> Self {
        Self::base(type_id, ProjectileKind::Bullet { damage, speed, life })
    }

    /// Crayon moving along `(dx, dy)`.
    pub fn crayon(damage: u32, speed: f64, dx: f64, dy: f64) -> Self {
        Self::base(CRAYON_TYPE, ProjectileKind::Crayon { damage, speed, dx, dy })
    }

    /// Place-time setup once bounds, owner and id are bound.
    pub fn activate(&mut self) {
        self.consumed = false;
        if let ProjectileKind::Thrower { height } = self.kind {
            self.bounds.y = height;
        }
    }

    /// Snapshot line.
    pub fn record(&self) -> ProjectileRecord {
        ProjectileRecord {
            id: self.id,
            type_id: self.type_id,
            team: self.team,
            x: self.bounds.x,
            y: self.bounds.y,
            angle: self.angle,
        }
    }

    /// Hit box centred on the projectile's origin.
    fn hit_zone(&self) -> Bounds {
        Bounds::new(
            self.bounds.x - self.bounds.width / 2.0,
            self.bounds.y - self.bounds.height / 2.0,
            self.bounds.width,
            self.bounds.height,
        )
    }
}

/// Per-tick behaviour.
pub fn frame(state: &mut MatchState, idx: usize) {
    let kind = state.projectiles[idx].kind;
    match kind {
        ProjectileKind::Thrower { .. } => {
            let p = &mut state.projectiles[idx];
            p.bounds.translate(0.0, -THROWER_FALL);
            if p.bounds.y <= 0.0 {
                p.consumed = true;
            }
        }
        ProjectileKind::Bullet { damage, speed, life } => {
            let p = &mut state.projectiles[idx];
            p.bounds.translate(p.angle.cos() * speed, p.angle.sin() * speed);
            let (zone, team) = (p.hit_zone(), p.team);

            let mut hit = false;
            for i in state.units_in(&zone) {
                let target = &state.units[i];
                if target.team != team && !target.is_dead() {
                    unit::damage(state, i, damage, team);
                    hit = true;
                }
            }

            let life = life.saturating_sub(1);
            let p = &mut state.projectiles[idx];
            p.kind = ProjectileKind::Bullet { damage, speed, life };
            if hit || life == 0 {
                p.consumed = true;
            }
        }
        ProjectileKind::Crayon { damage, speed, dx, dy } => {
            let p = &mut state.projectiles[idx];
            p.bounds.translate(dx * speed, dy * speed);
            if p.bounds.x.abs() > ARENA_LIMIT || p.bounds.y.abs() > ARENA_LIMIT {
                p.consumed = true;
                return;
            }
            let (zone, team) = (p.hit_zone(), p.team);

            let first = state
                .units_in(&zone)
                .into_iter()
                .find(|&i| state.units[i].team != team && !state.units[i].is_dead());
            if let Some(i) = first {
                unit::damage(state, i, damage, team);
                state.projectiles[idx].consumed = true;
            }
        }
    }
}

/// Fire the carried magic where the projectile died.
pub fn on_death(state: &mut MatchState, idx: usize) {
    let p = &state.projectiles[idx];
    if let Some(magic) = p.magic {
        let (team, x, y) = (p.team, p.bounds.x, p.bounds.y);
        magic.run(state, team, x, y);
    }
}
