//! Spatial Index
//!
//! Bounded region quadtree over the arena. It is rebuilt from scratch every
//! tick: `clear()` followed by one `insert()` per live unit. There is no
//! incremental update and no removal.
//!
//! `retrieve()` returns every object stored in the nodes a query rectangle
//! can touch, so it may over-return. Callers re-check exact overlap.
//!
//! Not thread-safe; only used under the session lock.

use crate::core::bounds::Bounds;
use crate::game::EntityId;

/// World extent covered by the index.
pub const WORLD_BOUNDS: Bounds = Bounds::new(-100.0, -100.0, 200.0, 200.0);

/// Objects a node holds before it splits.
pub const MAX_OBJECTS: usize = 5;

/// Maximum subdivision depth.
pub const MAX_LEVELS: u32 = 6;

/// One indexed entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Indexed {
    /// Entity the bounds belong to.
    pub id: EntityId,
    /// Footprint at insert time.
    pub bounds: Bounds,
}

/// Region quadtree node.
#[derive(Debug, Clone)]
pub struct Quadtree {
    bounds: Bounds,
    level: u32,
    objects: Vec<Indexed>,
    nodes: Vec<Quadtree>,
}

impl Default for Quadtree {
    fn default() -> Self {
        Self::new(WORLD_BOUNDS)
    }
}

impl Quadtree {
    /// Create an empty root covering `bounds`.
    pub fn new(bounds: Bounds) -> Self {
        Self::with_level(bounds, 0)
    }

    fn with_level(bounds: Bounds, level: u32) -> Self {
        Self {
            bounds,
            level,
            objects: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Drop every object and child node.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.nodes.clear();
    }

    /// Total number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len() + self.nodes.iter().map(Quadtree::len).sum::<usize>()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an entity footprint.
    pub fn insert(&mut self, id: EntityId, bounds: Bounds) {
        self.insert_entry(Indexed { id, bounds });
    }

    fn insert_entry(&mut self, entry: Indexed) {
        if !self.nodes.is_empty() {
            if let Some(quadrant) = self.quadrant_of(&entry.bounds) {
                self.nodes[quadrant].insert_entry(entry);
                return;
            }
        }

        self.objects.push(entry);

        if self.objects.len() > MAX_OBJECTS && self.level < MAX_LEVELS {
            if self.nodes.is_empty() {
                self.split();
            }

            let mut i = 0;
            while i < self.objects.len() {
                match self.quadrant_of(&self.objects[i].bounds) {
                    Some(quadrant) => {
                        let moved = self.objects.swap_remove(i);
                        self.nodes[quadrant].insert_entry(moved);
                    }
                    None => i += 1,
                }
            }
        }
    }

    /// Every object that may overlap `area`.
    pub fn retrieve(&self, area: &Bounds) -> Vec<Indexed> {
        let mut found = Vec::new();
        self.collect(area, &mut found);
        found
    }

    fn collect(&self, area: &Bounds, found: &mut Vec<Indexed>) {
        found.extend_from_slice(&self.objects);

        if self.nodes.is_empty() {
            return;
        }

        match self.quadrant_of(area) {
            Some(quadrant) => self.nodes[quadrant].collect(area, found),
            None => {
                for node in &self.nodes {
                    if node.bounds.intersects(area) {
                        node.collect(area, found);
                    }
                }
            }
        }
    }

    /// Split into four children: 0 = top-right, 1 = top-left,
    /// 2 = bottom-left, 3 = bottom-right.
    fn split(&mut self) {
        let half_w = self.bounds.width / 2.0;
        let half_h = self.bounds.height / 2.0;
        let x = self.bounds.x;
        let y = self.bounds.y;
        let next = self.level + 1;

        self.nodes = vec![
            Quadtree::with_level(Bounds::new(x + half_w, y + half_h, half_w, half_h), next),
            Quadtree::with_level(Bounds::new(x, y + half_h, half_w, half_h), next),
            Quadtree::with_level(Bounds::new(x, y, half_w, half_h), next),
            Quadtree::with_level(Bounds::new(x + half_w, y, half_w, half_h), next),
        ];
    }

    /// Child that fully contains `rect`, if any.
    fn quadrant_of(&self, rect: &Bounds) -> Option<usize> {
        let mid_x = self.bounds.x + self.bounds.width / 2.0;
        let mid_y = self.bounds.y + self.bounds.height / 2.0;

        let top = rect.y > mid_y && rect.max_y() <= self.bounds.max_y();
        let bottom = rect.y >= self.bounds.y && rect.max_y() < mid_y;
        let left = rect.x >= self.bounds.x && rect.max_x() < mid_x;
        let right = rect.x > mid_x && rect.max_x() <= self.bounds.max_x();

        match (left, right, top, bottom) {
            (false, true, true, _) => Some(0),
            (true, false, true, _) => Some(1),
            (true, false, _, true) => Some(2),
            (false, true, _, true) => Some(3),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(found: &[Indexed]) -> Vec<EntityId> {
        let mut ids: Vec<_> = found.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_retrieve_finds_inserted() {
        let mut tree = Quadtree::default();
        tree.insert(1, Bounds::new(10.0, 10.0, 2.0, 2.0));
        tree.insert(2, Bounds::new(-40.0, 5.0, 2.0, 2.0));

        let found = tree.retrieve(&Bounds::new(9.0, 9.0, 4.0, 4.0));
        assert!(ids(&found).contains(&1));
    }

    #[test]
    fn test_split_keeps_every_object() {
        let mut tree = Quadtree::default();
        for i in 0..40u16 {
            let x = -90.0 + f64::from(i) * 4.5;
            tree.insert(i, Bounds::new(x, (f64::from(i) * 7.0) % 80.0, 1.0, 1.0));
        }
        assert_eq!(tree.len(), 40);
        assert!(!tree.nodes.is_empty(), "tree should have split");

        // A query covering the world returns everything exactly once.
        let all = tree.retrieve(&WORLD_BOUNDS);
        assert_eq!(ids(&all), (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_query_skips_far_quadrant() {
        let mut tree = Quadtree::default();
        for i in 0..10u16 {
            tree.insert(i, Bounds::new(50.0 + f64::from(i), 50.0, 0.5, 0.5));
        }
        for i in 10..20u16 {
            tree.insert(i, Bounds::new(-60.0 - f64::from(i), -60.0, 0.5, 0.5));
        }

        let found = tree.retrieve(&Bounds::new(49.0, 49.0, 15.0, 3.0));
        let found = ids(&found);
        assert!(found.iter().all(|id| *id < 10));
        assert_eq!(found.len(), 10);
    }

    #[test]
    fn test_straddling_object_stays_at_root() {
        let mut tree = Quadtree::default();
        for i in 0..6u16 {
            tree.insert(i, Bounds::new(20.0 + f64::from(i), 20.0, 1.0, 1.0));
        }
        // Crosses both split lines.
        tree.insert(99, Bounds::new(-1.0, -1.0, 2.0, 2.0));

        let found = tree.retrieve(&Bounds::new(-80.0, -80.0, 1.0, 1.0));
        assert!(ids(&found).contains(&99));
    }

    #[test]
    fn test_clear() {
        let mut tree = Quadtree::default();
        tree.insert(1, Bounds::new(0.0, 0.0, 1.0, 1.0));
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.retrieve(&WORLD_BOUNDS).is_empty());
    }
}
