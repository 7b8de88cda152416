//! Geometric primitives and the segment intersection library.
//!
//! Everything here is a plain value type or a pure function. The ball is a
//! point: obstacles are expected to arrive already grown by the ball radius
//! (see [`crate::builder`]), so a collision is just the first parameter `t`
//! at which the ball's motion segment touches a primitive.

pub mod intersection;
pub mod primitives;

pub use intersection::*;
pub use primitives::*;
