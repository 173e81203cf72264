//! Cards
//!
//! Static card definitions plus the per-slot cost ledger. A card in a
//! player's deck is a clone of its catalog entry; discounts move its `cost`
//! and, once the cost is exhausted, accumulate in `overcost` so they can be
//! undone exactly.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::game::events::CardRecord;
use crate::game::magic::Magic;
use crate::game::projectile::Projectile;
use crate::game::spawn::{Payload, Spawn};
use crate::game::state::{PlayerKey, Team};
use crate::game::unit::Unit;

/// Produces a fresh payload each time the card is played.
pub type SpawnRecipe = Arc<dyn Fn() -> Payload + Send + Sync>;

/// Half-width of the defenders' placement zone.
pub const PLACEMENT_LINE: f64 = 50.0;

/// A card definition, or a deck slot holding one.
#[derive(Clone)]
pub struct Card {
    /// Catalog id; 0 is the empty card.
    pub id: u32,
    /// Current cost.
    pub cost: u16,
    /// Discount that could not be taken off `cost`.
    pub overcost: u16,
    /// Footprint width.
    pub width: f64,
    /// Placement must respect the team's zone.
    pub enforce_placement: bool,
    /// Ticks between successive recipes.
    pub spawn_interval: u8,
    recipes: Vec<SpawnRecipe>,
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("id", &self.id)
            .field("cost", &self.cost)
            .field("overcost", &self.overcost)
            .field("recipes", &self.recipes.len())
            .finish()
    }
}

impl Default for Card {
    fn default() -> Self {
        Self::empty()
    }
}

impl Card {
    /// The empty card. Never usable.
    pub fn empty() -> Self {
        Self {
            id: 0,
            cost: 0,
            overcost: 0,
            width: 0.0,
            enforce_placement: false,
            spawn_interval: 0,
            recipes: Vec::new(),
        }
    }

    fn new(id: u32, cost: u16) -> Self {
        Self { id, cost, ..Self::empty() }
    }

    fn footprint(mut self, width: f64) -> Self {
        self.width = width;
        self.enforce_placement = true;
        self
    }

    fn interval(mut self, ticks: u8) -> Self {
        self.spawn_interval = ticks;
        self
    }

    fn recipe<F>(mut self, make: F) -> Self
    where
        F: Fn() -> Payload + Send + Sync + 'static,
    {
        self.recipes.push(Arc::new(make));
        self
    }

    /// Holds nothing to play.
    pub fn is_empty(&self) -> bool {
        self.id == 0 || self.recipes.is_empty()
    }

    /// Lower the cost; whatever the cost cannot absorb becomes overcost.
    pub fn sub_cost(&mut self, amount: u16) -> u16 {
        if self.cost < amount {
            self.overcost += amount - self.cost;
            self.cost = 0;
        } else {
            self.cost -= amount;
        }
        self.cost
    }

    /// Raise the cost; outstanding overcost is paid back first.
    pub fn add_cost(&mut self, amount: u16) -> u16 {
        if self.overcost >= amount {
            self.overcost -= amount;
        } else {
            self.cost += amount - self.overcost;
            self.overcost = 0;
        }
        self.cost
    }

    /// Placement check for cards with an enforced footprint.
    pub fn placement_allowed(&self, team: Team, x: f64) -> bool {
        if !self.enforce_placement {
            return true;
        }
        match team {
            Team::Defender => x >= -PLACEMENT_LINE && x + self.width <= PLACEMENT_LINE,
            Team::Attacker => x <= -PLACEMENT_LINE || x + self.width >= PLACEMENT_LINE,
            Team::Poison => true,
        }
    }

    /// Try to play the card at `x` with `available` energy. On success one
    /// spawn per recipe is queued, the first after `delay` ticks and each
    /// following one `spawn_interval` ticks later. The caller deducts the
    /// cost.
    pub fn use_card(
        &self,
        owner: PlayerKey,
        team: Team,
        available: u16,
        x: i16,
        delay: u8,
        queue: &mut Vec<Spawn>,
    ) -> bool {
        if self.is_empty() || self.cost > available {
            return false;
        }
        let x = f64::from(x);
        if !self.placement_allowed(team, x) {
            return false;
        }

        let mut wait = delay;
        for make in &self.recipes {
            queue.push(Spawn {
                owner: Some(owner),
                team,
                x,
                y: 0.0,
                delay: wait,
                payload: make(),
            });
            wait = wait.saturating_add(self.spawn_interval);
        }
        true
    }

    /// Status line.
    pub fn record(&self) -> CardRecord {
        CardRecord { id: self.id, cost: self.cost }
    }
}

/// Every card, indexed by id.
pub fn catalog() -> &'static [Card] {
    static CATALOG: OnceLock<Vec<Card>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Fresh copy of a catalog card; unknown ids give the empty card.
pub fn lookup(id: u32) -> Card {
    catalog()
        .get(id as usize)
        .cloned()
        .unwrap_or_default()
}

fn build_catalog() -> Vec<Card> {
    vec![
        Card::empty(),
        Card::new(1, 5)
            .footprint(1.62)
            .recipe(|| Payload::Unit(Unit::flask())),
        Card::new(2, 7)
            .footprint(2.25)
            .recipe(|| Payload::Unit(Unit::note())),
        Card::new(3, 5)
            .footprint(6.52)
            .recipe(|| Payload::Unit(Unit::big_pencil())),
        Card::new(4, 3)
            .recipe(|| Payload::Projectile(Projectile::thrower(3.0, 10, Magic::heal(100, 5)))),
        Card::new(5, 2)
            .interval(6)
            .recipe(|| Payload::Projectile(Projectile::thrower(3.0, 11, Magic::damage(100, 4))))
            .recipe(|| Payload::Projectile(Projectile::thrower(4.0, 11, Magic::damage(100, 4))))
            .recipe(|| Payload::Projectile(Projectile::thrower(5.0, 11, Magic::damage(100, 4)))),
        Card::new(6, 6)
            .footprint(3.49)
            .recipe(|| Payload::Unit(Unit::sharpener())),
        Card::new(7, 4)
            .footprint(3.07)
            .recipe(|| Payload::Unit(Unit::bag())),
        Card::new(8, 2)
            .footprint(1.69)
            .recipe(|| Payload::Unit(Unit::alarm())),
        Card::new(9, 8)
            .footprint(1.06)
            .recipe(|| Payload::Unit(Unit::dictionary())),
        Card::new(10, 3)
            .footprint(4.08)
            .recipe(|| Payload::Unit(Unit::paint_brush())),
    ]
}
