//! Segment intersection tests.
//!
//! Every test answers the same question: what is the smallest `t ∈ [0, 1]`
//! at which `segment.at(t)` lies on the primitive? Parametric values are
//! snapped onto 0 or 1 when they land within [`constants::SNAP_EPSILON`] of
//! the boundary, so hits exactly on a seam between two patches are found by
//! both rather than by neither.
//!
//! Degenerate input (stationary segment, zero-length axis, segment parallel
//! to a plane) is "no intersection", never NaN.

use super::primitives::{Circle, Cylinder, PlanePatch, Sphere};
use crate::types::{constants, Segment, Vec2, Vec3};

/// Snap `x` onto 0 or 1 when it is within tolerance of either.
///
/// The tolerance grows with `|x|` so that large coordinates get the same
/// relative slack as small ones.
pub fn snap_unit(x: f64) -> f64 {
    let tol = constants::SNAP_EPSILON * x.abs().max(1.0);
    if x.abs() <= tol {
        0.0
    } else if (x - 1.0).abs() <= tol {
        1.0
    } else {
        x
    }
}

fn in_unit(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

// =============================================================================
// Roots
// =============================================================================

/// Up to two ascending parameters where a segment meets a curved surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Roots {
    values: [f64; 2],
    len: usize,
}

impl Roots {
    fn push(&mut self, t: f64) {
        if self.len < 2 {
            self.values[self.len] = t;
            self.len += 1;
        }
    }

    pub fn first(&self) -> Option<f64> {
        self.as_slice().first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.as_slice().iter().copied()
    }
}

/// Roots of `a t² + b t + c = 0` that fall in `[0, 1]` after snapping.
/// `a` is a squared length and uses the same cutoff as stationary segments.
fn unit_quadratic_roots(a: f64, b: f64, c: f64) -> Roots {
    let mut roots = Roots::default();
    if a < constants::DEGENERATE_LENGTH_SQ {
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    let sqrt_disc = disc.sqrt();
    let near = snap_unit((-b - sqrt_disc) / (2.0 * a));
    let far = snap_unit((-b + sqrt_disc) / (2.0 * a));
    for t in [near.min(far), near.max(far)] {
        if in_unit(t) {
            roots.push(t);
        }
    }
    roots
}

// =============================================================================
// Plane patches
// =============================================================================

/// Solution of `origin + t·d = position + u·edge1 + v·edge2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHit {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

/// Solve the 3x3 system with Cramer's rule written as triple products.
/// Coordinates come back snapped but not range-checked.
pub fn solve_plane(segment: &Segment, patch: &PlanePatch) -> Option<PlaneHit> {
    if segment.is_degenerate() {
        return None;
    }
    let back = -segment.displacement;
    let det = back.triple(&patch.edge1, &patch.edge2);
    if det.abs() < constants::PARALLEL_EPSILON {
        return None;
    }
    let rhs = segment.origin - patch.position;
    let t = rhs.triple(&patch.edge1, &patch.edge2) / det;
    let u = back.triple(&rhs, &patch.edge2) / det;
    let v = back.triple(&patch.edge1, &rhs) / det;
    if !(t.is_finite() && u.is_finite() && v.is_finite()) {
        return None;
    }
    Some(PlaneHit {
        t: snap_unit(t),
        u: snap_unit(u),
        v: snap_unit(v),
    })
}

/// Segment against a parallelogram patch (`u, v ∈ [0, 1]`).
pub fn segment_plane(segment: &Segment, patch: &PlanePatch) -> Option<f64> {
    let hit = solve_plane(segment, patch)?;
    (in_unit(hit.t) && in_unit(hit.u) && in_unit(hit.v)).then_some(hit.t)
}

/// Segment against the triangle `position, position + edge1, position + edge2`.
pub fn segment_triangle(segment: &Segment, patch: &PlanePatch) -> Option<f64> {
    let hit = solve_plane(segment, patch)?;
    let inside = hit.u >= 0.0 && hit.v >= 0.0 && snap_unit(hit.u + hit.v) <= 1.0;
    (in_unit(hit.t) && inside).then_some(hit.t)
}

// =============================================================================
// Circles and cylinders
// =============================================================================

/// Roots of a 2D segment `origin + t·dir` against a circle.
pub fn segment_circle_roots(origin: Vec2, dir: Vec2, circle: &Circle) -> Roots {
    let rel = origin - circle.center;
    unit_quadratic_roots(
        dir.magnitude_squared(),
        2.0 * dir.dot(&rel),
        rel.magnitude_squared() - circle.radius * circle.radius,
    )
}

pub fn segment_circle(origin: Vec2, dir: Vec2, circle: &Circle) -> Option<f64> {
    segment_circle_roots(origin, dir, circle).first()
}

/// Every parameter at which the segment crosses the cylinder's curved
/// surface within its length.
///
/// Works in the cylinder's frame: the axis becomes Z, the surface becomes a
/// circle in the XY cross-section, and each root is kept only if its height
/// along the axis lies in `[0, length]`.
pub fn segment_cylinder_roots(segment: &Segment, cylinder: &Cylinder) -> Roots {
    let mut roots = Roots::default();
    if segment.is_degenerate() {
        return roots;
    }
    let Some(frame) = cylinder.frame() else {
        return roots;
    };
    let length = cylinder.length();
    let origin = frame.to_local(segment.origin - cylinder.origin);
    let dir = frame.to_local(segment.displacement);
    let section = Circle::new(Vec2::ZERO, cylinder.radius);

    for t in segment_circle_roots(origin.xy(), dir.xy(), &section).iter() {
        let along = snap_unit((origin.z + dir.z * t) / length);
        if in_unit(along) {
            roots.push(t);
        }
    }
    roots
}

pub fn segment_cylinder(segment: &Segment, cylinder: &Cylinder) -> Option<f64> {
    segment_cylinder_roots(segment, cylinder).first()
}

// =============================================================================
// Spheres
// =============================================================================

/// Roots of `|origin + t·d - center|² = r²` in `[0, 1]`, nearest first.
pub fn segment_sphere_roots(segment: &Segment, sphere: &Sphere) -> Roots {
    if segment.is_degenerate() {
        return Roots::default();
    }
    let rel = segment.origin - sphere.center;
    let d = segment.displacement;
    unit_quadratic_roots(
        d.magnitude_squared(),
        2.0 * d.dot(&rel),
        rel.magnitude_squared() - sphere.radius * sphere.radius,
    )
}

pub fn segment_sphere(segment: &Segment, sphere: &Sphere) -> Option<f64> {
    segment_sphere_roots(segment, sphere).first()
}

// =============================================================================
// Distance bounds (broad phase only)
// =============================================================================

/// Distance from `point` to the closest point of the segment.
pub fn point_segment_distance(point: Vec3, segment: &Segment) -> f64 {
    let len_sq = segment.displacement.magnitude_squared();
    if len_sq < constants::DEGENERATE_LENGTH_SQ {
        return point.distance(&segment.origin);
    }
    let t = ((point - segment.origin).dot(&segment.displacement) / len_sq).clamp(0.0, 1.0);
    point.distance(&segment.at(t))
}

/// Distance from `point` to the circle's rim (zero on the rim, positive both
/// inside and outside).
pub fn point_circle_distance(point: Vec2, circle: &Circle) -> f64 {
    (point.distance(&circle.center) - circle.radius).abs()
}

// =============================================================================
// Tests
// =============================================================================
