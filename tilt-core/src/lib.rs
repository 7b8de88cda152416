//! # Tilt Core
//!
//! Collision physics for a tile-based ball-tilting board game.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (Vec3, Segment, ball state)
//! - `geometry`: Primitive shapes and segment intersection solvers
//! - `collision`: Colliders, triggers, broad phase and the resolution loop
//! - `level`: Tile grid, walls and holes
//! - `builder`: Turns a level into colliders and triggers
//! - `integrator`: Fixed-tick velocity integration
//! - `forces`: Gravity and board tilt
//! - `materials`: YAML-based surface, ball and solver configuration
//! - `simulation`: Main orchestrator

pub mod builder;
pub mod collision;
pub mod forces;
pub mod geometry;
pub mod integrator;
pub mod level;
pub mod materials;
pub mod simulation;
pub mod types;
