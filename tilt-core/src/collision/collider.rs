//! Collision objects: a primitive plus the rules for hitting and leaving it.

use serde::{Deserialize, Serialize};

use crate::geometry::{
    point_circle_distance, point_segment_distance, segment_cylinder_roots, segment_plane,
    segment_sphere_roots, segment_triangle, Circle, Cylinder, PlanePatch, Sphere,
};
use crate::materials::SurfaceKind;
use crate::types::{constants, Segment, Vec2, Vec3};

/// Shape of a collision object.
///
/// Cylinder normals point away from the axis. A plain cylinder is solid
/// outside and is hit by motion heading towards the axis; an inverted one is
/// a tube that is hit from the inside by motion heading away from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Plane(PlanePatch),
    Triangle(PlanePatch),
    Cylinder(Cylinder),
    InvertedCylinder(Cylinder),
    Sphere(Sphere),
}

/// The game entity a collider or trigger was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Tile { col: usize, row: usize },
    Hole(usize),
    Board,
}

/// Where and how a segment meets a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f64,
    pub point: Vec3,
    /// Outward surface normal at `point`, not normalized.
    pub normal: Vec3,
}

impl Shape {
    /// First point along the segment where it meets this shape.
    ///
    /// Hits where the motion is already leaving the surface are skipped, so
    /// a ball resting on (or just bounced off) a surface does not catch it
    /// again.
    pub fn intersect(&self, segment: &Segment) -> Option<Hit> {
        let d = segment.displacement;
        match self {
            Shape::Plane(patch) | Shape::Triangle(patch) => {
                let normal = patch.normal();
                if normal.dot(&d) > 0.0 {
                    return None;
                }
                let t = match self {
                    Shape::Triangle(_) => segment_triangle(segment, patch)?,
                    _ => segment_plane(segment, patch)?,
                };
                Some(Hit {
                    t,
                    point: segment.at(t),
                    normal,
                })
            }
            Shape::Cylinder(cylinder) => {
                curved_hit(segment, segment_cylinder_roots(segment, cylinder).iter(), |p| {
                    let n = cylinder.radial(p);
                    (n.dot(&d) < 0.0).then_some(n)
                })
            }
            Shape::InvertedCylinder(cylinder) => {
                curved_hit(segment, segment_cylinder_roots(segment, cylinder).iter(), |p| {
                    let n = cylinder.radial(p);
                    (n.dot(&d) > 0.0).then_some(-n)
                })
            }
            Shape::Sphere(sphere) => {
                curved_hit(segment, segment_sphere_roots(segment, sphere).iter(), |p| {
                    let n = p - sphere.center;
                    (n.dot(&d) < 0.0).then_some(n)
                })
            }
        }
    }

    /// Cheap test that never says `false` for a collider the ball could
    /// reach while inside `bounds`.
    pub fn is_nearby(&self, bounds: &Sphere) -> bool {
        match self {
            Shape::Plane(patch) | Shape::Triangle(patch) => {
                patch.midpoint().distance(&bounds.center) <= bounds.radius + patch.max_edge()
            }
            Shape::Cylinder(cylinder) => {
                within_cylinder_reach(cylinder, bounds)
                    && point_segment_distance(
                        bounds.center,
                        &Segment::new(cylinder.origin, cylinder.axis),
                    ) <= bounds.radius + cylinder.radius
            }
            Shape::InvertedCylinder(cylinder) => {
                within_cylinder_reach(cylinder, bounds) && near_tube_wall(cylinder, bounds)
            }
            Shape::Sphere(sphere) => {
                sphere.center.distance(&bounds.center)
                    <= sphere.radius + bounds.radius + constants::NEARBY_SLACK
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: Shape,
    pub owner: Owner,
    pub surface: SurfaceKind,
    /// Fraction of the normal speed kept (and reversed) on a bounce.
    pub restitution: f64,
}

impl Collider {
    pub fn new(shape: Shape, owner: Owner, surface: SurfaceKind, restitution: f64) -> Self {
        Self {
            shape,
            owner,
            surface,
            restitution,
        }
    }

    /// First point along the segment where it runs into this collider.
    pub fn intersect(&self, segment: &Segment) -> Option<Hit> {
        self.shape.intersect(segment)
    }

    pub fn is_nearby(&self, bounds: &Sphere) -> bool {
        self.shape.is_nearby(bounds)
    }

    /// Bounce a direction off the surface at `hit`: the tangential part is
    /// kept, the normal part is reversed and scaled by restitution.
    pub fn reflect_direction(&self, direction: Vec3, hit: &Hit) -> Vec3 {
        let normal_part = direction.project_onto(&hit.normal);
        let tangential = direction - normal_part;
        tangential - normal_part * self.restitution
    }

    /// Continue a segment after `hit`: start at the contact point and spend
    /// the unused part of the motion in the reflected direction.
    pub fn reflect(&self, segment: &Segment, hit: &Hit) -> Segment {
        let residual = segment.displacement * (1.0 - hit.t);
        Segment::new(hit.point, self.reflect_direction(residual, hit))
    }
}

/// First root whose outward normal passes `facing`.
fn curved_hit(
    segment: &Segment,
    roots: impl Iterator<Item = f64>,
    facing: impl Fn(Vec3) -> Option<Vec3>,
) -> Option<Hit> {
    roots.into_iter().find_map(|t| {
        let point = segment.at(t);
        facing(point).map(|normal| Hit { t, point, normal })
    })
}

fn within_cylinder_reach(cylinder: &Cylinder, bounds: &Sphere) -> bool {
    cylinder.midpoint().distance(&bounds.center)
        <= bounds.radius + cylinder.length() + cylinder.radius
}

/// Whether any point of the tube wall lies inside `bounds`, judged in the
/// cylinder's cross-section. Unsupported frames are always "near".
fn near_tube_wall(cylinder: &Cylinder, bounds: &Sphere) -> bool {
    let Some(frame) = cylinder.frame() else {
        return true;
    };
    let local = frame.to_local(bounds.center - cylinder.origin);
    let rim = Circle::new(Vec2::ZERO, cylinder.radius);
    let along = (-bounds.radius..=cylinder.length() + bounds.radius).contains(&local.z);
    along && point_circle_distance(local.xy(), &rim) <= bounds.radius
}
