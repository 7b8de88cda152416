//! Primitive shapes: plane patches, cylinders, spheres and circles.

use serde::{Deserialize, Serialize};

use crate::types::{constants, BallState, Vec2, Vec3};

// =============================================================================
// Plane patch
// =============================================================================

/// A flat parallelogram (or, for the triangle variant, the half of it below
/// the `u + v = 1` diagonal).
///
/// Points are `position + u * edge1 + v * edge2`. The outward normal is
/// `edge1 × edge2`, so edge order decides which side is solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanePatch {
    pub position: Vec3,
    pub edge1: Vec3,
    pub edge2: Vec3,
}

impl PlanePatch {
    pub const fn new(position: Vec3, edge1: Vec3, edge2: Vec3) -> Self {
        Self {
            position,
            edge1,
            edge2,
        }
    }

    /// Unnormalized normal, `edge1 × edge2`.
    pub fn normal(&self) -> Vec3 {
        self.edge1.cross(&self.edge2)
    }

    pub fn point_at(&self, u: f64, v: f64) -> Vec3 {
        self.position + self.edge1 * u + self.edge2 * v
    }

    /// Centre of the parallelogram. Also used for triangles, where it is
    /// the midpoint of the long edge: still within `max_edge` of every vertex.
    pub fn midpoint(&self) -> Vec3 {
        self.point_at(0.5, 0.5)
    }

    pub fn max_edge(&self) -> f64 {
        self.edge1.magnitude().max(self.edge2.magnitude())
    }
}

// =============================================================================
// Cylinder
// =============================================================================

/// An orthonormal basis whose `w` axis runs along a cylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

impl Frame {
    /// Express a world-space vector in this frame.
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(world.dot(&self.u), world.dot(&self.v), world.dot(&self.w))
    }
}

/// A finite open tube: every point at distance `radius` from the axis
/// segment `origin .. origin + axis`. The end caps are not part of it.
///
/// The axis must be vertical or lie flat in the XY plane. Any other axis
/// has no [`Frame`] and is never hit; [`Cylinder::vertical`] and
/// [`Cylinder::horizontal`] only build supported ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub origin: Vec3,
    pub axis: Vec3,
    pub radius: f64,
}

impl Cylinder {
    /// Vertical cylinder standing on `base`.
    pub fn vertical(base: Vec3, height: f64, radius: f64) -> Self {
        Self {
            origin: base,
            axis: Vec3::new(0.0, 0.0, height),
            radius,
        }
    }

    /// Cylinder lying in a horizontal plane between two points of equal height.
    pub fn horizontal(start: Vec2, end: Vec2, z: f64, radius: f64) -> Self {
        Self {
            origin: start.extend(z),
            axis: (end - start).extend(0.0),
            radius,
        }
    }

    pub fn length(&self) -> f64 {
        self.axis.magnitude()
    }

    pub fn midpoint(&self) -> Vec3 {
        self.origin + self.axis * 0.5
    }

    /// Basis with `w` along the axis, or `None` for a zero or unsupported axis.
    pub fn frame(&self) -> Option<Frame> {
        let len = self.length();
        if len < constants::PARALLEL_EPSILON {
            return None;
        }
        let w = self.axis / len;
        let u = if w.z.abs() < constants::PARALLEL_EPSILON {
            Vec3::Z
        } else if w.x.abs() < constants::PARALLEL_EPSILON && w.y.abs() < constants::PARALLEL_EPSILON
        {
            Vec3::X
        } else {
            return None;
        };
        Some(Frame {
            u,
            v: w.cross(&u),
            w,
        })
    }

    /// Radial vector from the axis line out to `point`.
    pub fn radial(&self, point: Vec3) -> Vec3 {
        let rel = point - self.origin;
        rel - rel.project_onto(&self.axis)
    }
}

// =============================================================================
// Sphere / Circle
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Sphere {
    pub const fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// Sphere enclosing everywhere a ball can reach during one tick.
///
/// Bounces inside a tick never add length to the motion (restitution is at
/// most 1), so a sphere of radius `|vel|` around the start position covers
/// every residual segment; the ball radius is added on top.
pub fn motion_bounds(ball: &BallState) -> Sphere {
    Sphere::new(ball.pos, ball.vel.magnitude() + ball.radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_plane_normal_follows_edge_order() {
        let up = PlanePatch::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        let down = PlanePatch::new(Vec3::ZERO, Vec3::Y, Vec3::X);
        assert_eq!(up.normal(), Vec3::Z);
        assert_eq!(down.normal(), -Vec3::Z);
        assert_eq!(up.midpoint(), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_tilted_axis_has_no_frame() {
        let tilted = Cylinder {
            origin: Vec3::ZERO,
            axis: Vec3::new(1.0, 0.0, 1.0),
            radius: 0.5,
        };
        assert!(tilted.frame().is_none());
        assert!(Cylinder::horizontal(Vec2::ZERO, Vec2::new(1.0, 1.0), 0.0, 0.5).frame().is_some());
        assert!(Cylinder::vertical(Vec3::ZERO, -2.0, 0.5).frame().is_some());
    }

    #[test]
    fn test_frame_is_orthonormal() {
        let diagonal = Cylinder::horizontal(Vec2::ZERO, Vec2::new(1.0, 1.0), 0.0, 0.2);
        let frame = diagonal.frame().expect("flat axis has a frame");
        assert_abs_diff_eq!(frame.u.dot(&frame.v), 0.0);
        assert_abs_diff_eq!(frame.v.dot(&frame.w), 0.0);
        assert_abs_diff_eq!(frame.u.cross(&frame.v).dot(&frame.w), 1.0, epsilon = 1e-12);

        let local = frame.to_local(diagonal.axis);
        assert_abs_diff_eq!(local.z, 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(local.x, 0.0);
    }

    #[test]
    fn test_zero_axis_has_no_frame() {
        assert!(Cylinder::vertical(Vec3::ZERO, 0.0, 1.0).frame().is_none());
    }

    #[test]
    fn test_radial_vector() {
        let cyl = Cylinder::vertical(Vec3::ZERO, 2.0, 0.5);
        assert_eq!(cyl.radial(Vec3::new(0.5, 0.0, 1.3)), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_motion_bounds_cover_the_tick() {
        let ball = BallState::new(
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.3, 0.4, 0.0),
            0.25,
            Default::default(),
        );
        let bounds = motion_bounds(&ball);
        assert_eq!(bounds.center, ball.pos);
        assert_abs_diff_eq!(bounds.radius, 0.75);
    }
}
