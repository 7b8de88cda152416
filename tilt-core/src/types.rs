//! Core types for the board simulation.
//!
//! Units are board units and ticks:
//! - Position: tile widths (one tile is 1.0 x 1.0)
//! - Velocity: tile widths per tick (a velocity *is* the motion of one tick)
//! - Acceleration: tile widths per tick²
//!
//! The board lies in the XY plane with Z pointing up. Tile `(col, row)`
//! covers `x ∈ [col, col+1]`, `y ∈ [-(row+1), -row]`, and the floor's top
//! surface is `z = 0`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Vectors
// =============================================================================

/// A 3D vector used for positions, motion and surface normals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A 2D vector, used for cross-sections (cylinder-as-circle) and board tilt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

macro_rules! impl_vector_ops {
    ($ty:ident { $($field:ident),+ }) => {
        impl Add for $ty {
            type Output = Self;
            fn add(self, other: Self) -> Self {
                Self { $($field: self.$field + other.$field),+ }
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, other: Self) {
                $(self.$field += other.$field;)+
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, other: Self) -> Self {
                Self { $($field: self.$field - other.$field),+ }
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, other: Self) {
                $(self.$field -= other.$field;)+
            }
        }

        impl Mul<f64> for $ty {
            type Output = Self;
            fn mul(self, scalar: f64) -> Self {
                Self { $($field: self.$field * scalar),+ }
            }
        }

        impl Div<f64> for $ty {
            type Output = Self;
            fn div(self, scalar: f64) -> Self {
                Self { $($field: self.$field / scalar),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }

        impl $ty {
            /// Dot product
            pub fn dot(&self, other: &Self) -> f64 {
                0.0 $(+ self.$field * other.$field)+
            }

            /// Squared magnitude (avoids sqrt for comparisons)
            pub fn magnitude_squared(&self) -> f64 {
                self.dot(self)
            }

            /// Magnitude (length) of the vector
            pub fn magnitude(&self) -> f64 {
                self.magnitude_squared().sqrt()
            }

            /// Straight-line distance between two points
            pub fn distance(&self, other: &Self) -> f64 {
                (*self - *other).magnitude()
            }

            /// Returns a unit vector in the same direction, or zero if the
            /// vector is (numerically) zero
            pub fn normalized(&self) -> Self {
                let mag = self.magnitude();
                if mag < constants::PARALLEL_EPSILON {
                    Self::ZERO
                } else {
                    *self / mag
                }
            }

            /// Component of `self` along `other`. Zero when `other` is zero.
            pub fn project_onto(&self, other: &Self) -> Self {
                let other_mag_sq = other.magnitude_squared();
                if other_mag_sq < constants::PARALLEL_EPSILON {
                    Self::ZERO
                } else {
                    *other * (self.dot(other) / other_mag_sq)
                }
            }

            pub fn is_finite(&self) -> bool {
                true $(&& self.$field.is_finite())+
            }
        }
    };
}

impl_vector_ops!(Vec3 { x, y, z });
impl_vector_ops!(Vec2 { x, y });

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Scalar triple product `self · (b × c)`
    pub fn triple(&self, b: &Self, c: &Self) -> f64 {
        self.dot(&b.cross(c))
    }

    /// Drops the Z component.
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Lifts into 3D at height `z`.
    pub fn extend(&self, z: f64) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

// =============================================================================
// Segment
// =============================================================================

/// Bounded motion: `origin + t * displacement` for `t ∈ [0, 1]`.
///
/// A zero-length displacement is a stationary ball. It is a valid segment
/// but never intersects anything.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub origin: Vec3,
    pub displacement: Vec3,
}

impl Segment {
    pub const fn new(origin: Vec3, displacement: Vec3) -> Self {
        Self {
            origin,
            displacement,
        }
    }

    /// Segment between two points.
    pub fn between(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.displacement * t
    }

    pub fn end(&self) -> Vec3 {
        self.origin + self.displacement
    }

    pub fn length(&self) -> f64 {
        self.displacement.magnitude()
    }

    /// True when the displacement is too short to produce a meaningful hit.
    pub fn is_degenerate(&self) -> bool {
        self.displacement.magnitude_squared() < constants::DEGENERATE_LENGTH_SQ
    }
}

// =============================================================================
// Ball
// =============================================================================

/// Identifies a ball colour, matched against goal holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ColorId(pub u32);

/// Where a ball's explosion effect is in its lifecycle.
///
/// Triggers only move `Idle -> Requested`; the animation layer moves it on
/// to `Playing` and back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExplosionState {
    #[default]
    Idle,
    Requested,
    Playing,
}

impl ExplosionState {
    /// Whether an explosion is pending or on screen.
    pub fn in_progress(&self) -> bool {
        !matches!(self, ExplosionState::Idle)
    }
}

/// Complete state of one ball.
///
/// Position and velocity are only written by the resolution engine (and the
/// per-tick force integration that precedes it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub pos: Vec3,
    pub vel: Vec3,
    pub radius: f64,
    pub color: ColorId,
    pub dead: bool,
    pub reached_goal: bool,
    pub explosion: ExplosionState,
    /// Magnitude of the velocity change during the last tick's collisions.
    pub last_impact: f64,
}

impl BallState {
    pub fn new(pos: Vec3, vel: Vec3, radius: f64, color: ColorId) -> Self {
        Self {
            pos,
            vel,
            radius: radius.max(0.0),
            color,
            dead: false,
            reached_goal: false,
            explosion: ExplosionState::Idle,
            last_impact: 0.0,
        }
    }

    /// Ball at rest at a given position
    pub fn at_rest(pos: Vec3, radius: f64, color: ColorId) -> Self {
        Self::new(pos, Vec3::ZERO, radius, color)
    }

    /// The motion this ball would make over one tick if nothing is hit.
    pub fn motion(&self) -> Segment {
        Segment::new(self.pos, self.vel)
    }

    /// Dead or home: either way the ball no longer takes part in play.
    pub fn is_finished(&self) -> bool {
        self.dead || self.reached_goal
    }
}

// =============================================================================
// Numeric Constants
// =============================================================================

/// Tolerances shared by the geometry and resolution code.
pub mod constants {
    /// Parametric coordinates within this distance of 0 or 1 snap onto the
    /// boundary (scaled up for magnitudes above 1).
    pub const SNAP_EPSILON: f64 = 1e-5;

    /// Below this, denominators and vector lengths count as zero.
    pub const PARALLEL_EPSILON: f64 = 1e-12;

    /// Squared displacement length below which a segment is stationary.
    pub const DEGENERATE_LENGTH_SQ: f64 = 1e-18;

    /// Extra reach added to sphere proximity tests.
    pub const NEARBY_SLACK: f64 = 0.01;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a - b, Vec3::new(-3.0, -3.0, -3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(a.dot(&b), 32.0);
    }

    #[test]
    fn test_cross_and_triple_product() {
        let z = Vec3::X.cross(&Vec3::Y);
        assert_abs_diff_eq!(z.z, 1.0);
        assert_abs_diff_eq!(Vec3::X.triple(&Vec3::Y, &Vec3::Z), 1.0);
        assert_abs_diff_eq!(Vec3::Y.triple(&Vec3::X, &Vec3::Z), -1.0);
    }

    #[test]
    fn test_normalized_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert_abs_diff_eq!(n.x, 0.6);
        assert_abs_diff_eq!(n.y, 0.8);
    }

    #[test]
    fn test_project_onto() {
        let v = Vec3::new(2.0, 3.0, 0.0);
        let p = v.project_onto(&Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(v.project_onto(&Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_segment_points() {
        let seg = Segment::between(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(seg.at(0.5), Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(seg.end(), Vec3::new(3.0, 1.0, 1.0));
        assert_abs_diff_eq!(seg.length(), 2.0);
        assert!(!seg.is_degenerate());
        assert!(Segment::new(Vec3::ZERO, Vec3::ZERO).is_degenerate());
    }

    #[test]
    fn test_ball_radius_never_negative() {
        let ball = BallState::at_rest(Vec3::ZERO, -1.0, ColorId(0));
        assert_eq!(ball.radius, 0.0);
        assert!(!ball.is_finished());
    }

    #[test]
    fn test_explosion_progress() {
        assert!(!ExplosionState::Idle.in_progress());
        assert!(ExplosionState::Requested.in_progress());
        assert!(ExplosionState::Playing.in_progress());
    }
}
