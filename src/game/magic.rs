//! Magic
//!
//! Instant area effects. A magic has no lifetime of its own: it resolves
//! against the spatial index the moment it runs, either straight out of the
//! spawn queue or when a projectile carrying it dies.
//!
//! The affected area for radius `r` at `(x, y)` is the rectangle
//! `[x - r, x + r] x [y, y + r]`; it only extends upward from the ground
//! line the point sits on.

use crate::core::bounds::Bounds;
use crate::game::state::{MatchState, Team};
use crate::game::unit;

/// Area effect payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Magic {
    /// Damage every unit of another team in the area.
    Damage {
        /// Damage per hit unit.
        amount: u32,
        /// Half-width and height of the area.
        radius: u32,
    },
    /// Heal every unit of the caster's team in the area.
    Heal {
        /// Health restored per unit.
        amount: u32,
        /// Half-width and height of the area.
        radius: u32,
    },
    /// Catalogued without an area effect.
    CreditCard,
    /// Catalogued without an area effect.
    Clip,
}

impl Magic {
    /// Damage magic.
    pub const fn damage(amount: u32, radius: u32) -> Self {
        Magic::Damage { amount, radius }
    }

    /// Heal magic.
    pub const fn heal(amount: u32, radius: u32) -> Self {
        Magic::Heal { amount, radius }
    }

    /// Rectangle covered when cast at `(x, y)`.
    pub fn area(radius: u32, x: f64, y: f64) -> Bounds {
        let r = f64::from(radius);
        Bounds::new(x - r, y, r * 2.0, r)
    }

    /// Resolve the effect at `(x, y)` on behalf of `team`.
    pub fn run(&self, state: &mut MatchState, team: Team, x: f64, y: f64) {
        match *self {
            Magic::Damage { amount, radius } => {
                for i in state.units_in(&Self::area(radius, x, y)) {
                    unit::damage(state, i, amount, team);
                }
            }
            Magic::Heal { amount, radius } => {
                for i in state.units_in(&Self::area(radius, x, y)) {
                    state.units[i].heal(amount, team);
                }
            }
            Magic::CreditCard | Magic::Clip => {}
        }
    }
}
