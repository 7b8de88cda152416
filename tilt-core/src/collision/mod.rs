//! Collision objects, triggers and the per-tick resolution loop.
//!
//! This module handles:
//! - **Colliders**: a primitive plus its facing rule and restitution
//! - **Triggers**: intersection-only objects with one-shot side effects
//! - **Broad phase**: the per-ball near-set rebuilt every tick
//! - **Resolution**: the nearest-hit-first bounce loop
//!
//! ## Swept Point
//!
//! Obstacles are grown by the ball radius, so the ball is a point and its
//! motion over a tick is a segment. Testing the segment instead of the
//! end position catches hits regardless of speed.
//!
//! ```text
//! Tick start       Tick end (unresolved)
//!    ●────────────────○
//!             \
//!  ════════════╳══════════  grown surface
//!              └─ contact, residual reflected from here
//! ```

pub mod broad_phase;
pub mod collider;
pub mod resolution;
pub mod trigger;

pub use broad_phase::*;
pub use collider::*;
pub use resolution::*;
pub use trigger::*;
