//! Core spatial primitives.
//!
//! Axis-aligned boxes and the per-tick quadtree the simulation uses for
//! area queries.

pub mod bounds;
pub mod quadtree;

// Re-export core types
pub use bounds::Bounds;
pub use quadtree::{Quadtree, WORLD_BOUNDS};
