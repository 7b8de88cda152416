//! Level collider builder.
//!
//! Turns a [`Level`] into the collider set for one ball radius `r`. Every
//! obstacle is grown by `r` so the resolution loop can treat the ball as a
//! point: flat faces move out by `r`, edges become cylinders of radius `r`
//! and corners become spheres of radius `r`.
//!
//! ## Hole tile (top view)
//!
//! ```text
//!  +---------------------------+
//!  |        north strip        |   circleTop = 0.5 - R
//!  +------+--+-----------+--+--+
//!  |      |/ \  rim (8)  / \|  |
//!  | west |   +---------+   |  |   s = R / (√2/2 + 1)
//!  |      |   |  shaft  |   |  |   rim: regular octagon of apothem R,
//!  |      |   +---------+   |  |   every side 2(R - s) long
//!  |      |\ /           \ /|  |
//!  +------+--+-----------+--+--+
//!  |        south strip        |
//!  +---------------------------+
//! ```
//!
//! The corner triangles, with legs `s`, fill the gap between the strips and
//! the octagon of rim cylinders. The shaft is an inverted cylinder of radius `R - r`.
//!
//! Triggers do not depend on the ball radius and are built separately.

use tracing::debug;

use crate::collision::{Collider, Owner, Shape, Trigger, TriggerKind, TriggerSet};
use crate::geometry::{Cylinder, PlanePatch, Sphere};
use crate::level::{tile_center, Level, Side, Tile};
use crate::materials::{SurfaceKind, SurfaceTable};
use crate::types::{Vec2, Vec3};

/// Height of a wall above the floor.
pub const WALL_HEIGHT: f64 = 1.0;
/// Thickness of the floor slab below `z = 0`.
pub const SLAB_DEPTH: f64 = 1.0;
/// Depth of a hole shaft below `z = 0`.
pub const HOLE_DEPTH: f64 = 1.0;
/// Depth of the plane that kills balls that fell off the board.
pub const DEATH_PLANE_DEPTH: f64 = 5.0;
/// How far the death plane reaches past the board on every side.
pub const DEATH_PLANE_MARGIN: f64 = 2.0;

/// Footprint of one tile on the board plane.
#[derive(Debug, Clone, Copy)]
struct TileBox {
    x0: f64,
    x1: f64,
    /// South edge.
    y0: f64,
    /// North edge.
    y1: f64,
}

impl TileBox {
    fn new(col: usize, row: usize) -> Self {
        let x0 = col as f64;
        let y1 = -(row as f64);
        Self {
            x0,
            x1: x0 + 1.0,
            y0: y1 - 1.0,
            y1,
        }
    }

    /// The two ends of a side, running towards +X or +Y.
    fn side(&self, side: Side) -> (Vec2, Vec2) {
        match side {
            Side::North => (Vec2::new(self.x0, self.y1), Vec2::new(self.x1, self.y1)),
            Side::South => (Vec2::new(self.x0, self.y0), Vec2::new(self.x1, self.y0)),
            Side::West => (Vec2::new(self.x0, self.y0), Vec2::new(self.x0, self.y1)),
            Side::East => (Vec2::new(self.x1, self.y0), Vec2::new(self.x1, self.y1)),
        }
    }
}

/// Unit vector pointing out of the tile across `side`.
fn outward(side: Side) -> Vec3 {
    match side {
        Side::North => Vec3::Y,
        Side::East => Vec3::X,
        Side::South => -Vec3::Y,
        Side::West => -Vec3::X,
    }
}

/// Vertical patch along `from..to`, spanning `z ∈ [bottom, bottom + height]`,
/// shifted by `offset` and facing `facing`.
fn vertical_patch(from: Vec2, to: Vec2, bottom: f64, height: f64, offset: Vec3, facing: Vec3) -> PlanePatch {
    let along = (to - from).extend(0.0);
    let up = Vec3::Z * height;
    let position = from.extend(bottom) + offset;
    if along.cross(&up).dot(&facing) >= 0.0 {
        PlanePatch::new(position, along, up)
    } else {
        PlanePatch::new(position, up, along)
    }
}

/// Horizontal patch facing up, edges ordered so `edge1 × edge2` is +Z.
fn upward_patch(position: Vec3, a: Vec3, b: Vec3) -> PlanePatch {
    if a.cross(&b).z >= 0.0 {
        PlanePatch::new(position, a, b)
    } else {
        PlanePatch::new(position, b, a)
    }
}

struct Emitter<'s> {
    surfaces: &'s SurfaceTable,
    colliders: Vec<Collider>,
}

impl Emitter<'_> {
    fn push(&mut self, shape: Shape, owner: Owner, surface: SurfaceKind) {
        let restitution = self.surfaces.restitution(surface);
        self.colliders
            .push(Collider::new(shape, owner, surface, restitution));
    }
}

/// Builds colliders and triggers for one level.
pub struct LevelColliderBuilder<'a> {
    level: &'a Level,
    surfaces: &'a SurfaceTable,
}

impl<'a> LevelColliderBuilder<'a> {
    pub fn new(level: &'a Level, surfaces: &'a SurfaceTable) -> Self {
        Self { level, surfaces }
    }

    /// Every collider of the level, grown by `ball_radius`.
    pub fn build(&self, ball_radius: f64) -> Vec<Collider> {
        let r = ball_radius.max(0.0);
        let mut out = Emitter {
            surfaces: self.surfaces,
            colliders: Vec::new(),
        };

        let mut hole_index = 0;
        for (col, row, tile) in self.level.solid_tiles() {
            let owner = Owner::Tile { col, row };
            let tile_box = TileBox::new(col, row);
            match tile {
                Tile::Floor => out.push(
                    Shape::Plane(PlanePatch::new(
                        Vec3::new(tile_box.x0, tile_box.y0, r),
                        Vec3::X,
                        Vec3::Y,
                    )),
                    owner,
                    SurfaceKind::Floor,
                ),
                Tile::Hole { goal } => {
                    self.hole(&mut out, col, row, r, goal.is_some(), Owner::Hole(hole_index));
                    hole_index += 1;
                }
                Tile::Empty => {}
            }
            self.walls(&mut out, col, row, &tile_box, r);
            self.open_edges(&mut out, col, row, &tile_box, r);
        }

        log_counts(&out.colliders, r);
        out.colliders
    }

    fn walls(&self, out: &mut Emitter, col: usize, row: usize, tile_box: &TileBox, r: f64) {
        let owner = Owner::Tile { col, row };
        let mut corners: Vec<Vec2> = Vec::with_capacity(4);
        for side in Side::ALL {
            if !self.level.has_wall(col, row, side) {
                continue;
            }
            let (from, to) = tile_box.side(side);
            let inward = -outward(side);
            out.push(
                Shape::Plane(vertical_patch(from, to, 0.0, WALL_HEIGHT, inward * r, inward)),
                owner,
                SurfaceKind::Wall,
            );
            for corner in [from, to] {
                if !corners.contains(&corner) {
                    corners.push(corner);
                }
            }
        }
        for corner in corners {
            out.push(
                Shape::Cylinder(Cylinder::vertical(corner.extend(0.0), WALL_HEIGHT, r)),
                owner,
                SurfaceKind::Wall,
            );
        }
    }

    /// Rounded top edge and outer face wherever the slab ends, plus rounded
    /// corners where two such edges meet.
    fn open_edges(&self, out: &mut Emitter, col: usize, row: usize, tile_box: &TileBox, r: f64) {
        let owner = Owner::Tile { col, row };
        let open = |side: Side| !self.level.neighbour_solid(col, row, side);

        for side in Side::ALL.into_iter().filter(|s| open(*s)) {
            let (from, to) = tile_box.side(side);
            let out_dir = outward(side);
            out.push(
                Shape::Cylinder(Cylinder::horizontal(from, to, 0.0, r)),
                owner,
                SurfaceKind::Edge,
            );
            out.push(
                Shape::Plane(vertical_patch(from, to, -SLAB_DEPTH, SLAB_DEPTH, out_dir * r, out_dir)),
                owner,
                SurfaceKind::Edge,
            );
        }

        let corners = [
            (Side::North, Side::East, Vec2::new(tile_box.x1, tile_box.y1)),
            (Side::East, Side::South, Vec2::new(tile_box.x1, tile_box.y0)),
            (Side::South, Side::West, Vec2::new(tile_box.x0, tile_box.y0)),
            (Side::West, Side::North, Vec2::new(tile_box.x0, tile_box.y1)),
        ];
        for (a, b, corner) in corners {
            if open(a) && open(b) {
                out.push(
                    Shape::Sphere(Sphere::new(corner.extend(0.0), r)),
                    owner,
                    SurfaceKind::Edge,
                );
                out.push(
                    Shape::Cylinder(Cylinder::vertical(corner.extend(-SLAB_DEPTH), SLAB_DEPTH, r)),
                    owner,
                    SurfaceKind::Edge,
                );
            }
        }
    }

    fn hole(&self, out: &mut Emitter, col: usize, row: usize, r: f64, goal: bool, owner: Owner) {
        let hole_r = self.level.hole_radius();
        let circle_top = 0.5 - hole_r;
        let s = hole_r / (std::f64::consts::FRAC_1_SQRT_2 + 1.0);
        let c = tile_center(col, row);
        let tile_box = TileBox::new(col, row);
        let at = |dx: f64, dy: f64| Vec2::new(c.x + dx, c.y + dy);

        // Flat top around the hole
        let strips = [
            (Vec2::new(tile_box.x0, tile_box.y1 - circle_top), 1.0, circle_top),
            (Vec2::new(tile_box.x0, tile_box.y0), 1.0, circle_top),
            (at(-0.5, -hole_r), circle_top, 2.0 * hole_r),
            (at(hole_r, -hole_r), circle_top, 2.0 * hole_r),
        ];
        for (corner, width, depth) in strips {
            out.push(
                Shape::Plane(PlanePatch::new(corner.extend(r), Vec3::X * width, Vec3::Y * depth)),
                owner,
                SurfaceKind::Floor,
            );
        }

        // Square-to-octagon corners
        for (sx, sy) in [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
            let corner = at(sx * hole_r, sy * hole_r).extend(r);
            let a = Vec3::new(-sx * s, 0.0, 0.0);
            let b = Vec3::new(0.0, -sy * s, 0.0);
            out.push(
                Shape::Triangle(upward_patch(corner, a, b)),
                owner,
                SurfaceKind::Floor,
            );
        }

        // Rim octagon
        let half = hole_r - s;
        let rim = [
            (at(-half, hole_r), at(half, hole_r)),
            (at(-half, -hole_r), at(half, -hole_r)),
            (at(-hole_r, -half), at(-hole_r, half)),
            (at(hole_r, -half), at(hole_r, half)),
            (at(half, hole_r), at(hole_r, half)),
            (at(-half, hole_r), at(-hole_r, half)),
            (at(half, -hole_r), at(hole_r, -half)),
            (at(-half, -hole_r), at(-hole_r, -half)),
        ];
        for (from, to) in rim {
            out.push(
                Shape::Cylinder(Cylinder::horizontal(from, to, 0.0, r)),
                owner,
                SurfaceKind::Rim,
            );
        }

        if hole_r > r {
            out.push(
                Shape::InvertedCylinder(Cylinder::vertical(
                    c.extend(-HOLE_DEPTH),
                    HOLE_DEPTH,
                    hole_r - r,
                )),
                owner,
                SurfaceKind::HoleWall,
            );
        }

        if goal {
            out.push(
                Shape::Plane(PlanePatch::new(
                    at(-hole_r, -hole_r).extend(-HOLE_DEPTH + r),
                    Vec3::X * (2.0 * hole_r),
                    Vec3::Y * (2.0 * hole_r),
                )),
                owner,
                SurfaceKind::HoleBottom,
            );
        }
    }

    /// Fresh, fully armed triggers: one per hole plus the death plane.
    pub fn triggers(&self) -> TriggerSet {
        let hole_r = self.level.hole_radius();
        let mut set = TriggerSet::default();

        for (index, hole) in self.level.holes().iter().enumerate() {
            let c = hole.center();
            let shape = Shape::Plane(PlanePatch::new(
                Vec3::new(c.x - hole_r, c.y - hole_r, -HOLE_DEPTH / 2.0),
                Vec3::X * (2.0 * hole_r),
                Vec3::Y * (2.0 * hole_r),
            ));
            let kind = if hole.is_goal() {
                TriggerKind::Goal { hole: index }
            } else {
                TriggerKind::ExplosiveDeath
            };
            set.push(Trigger::new(shape, Owner::Hole(index), kind));
        }

        let width = self.level.width() as f64 + 2.0 * DEATH_PLANE_MARGIN;
        let height = self.level.height() as f64 + 2.0 * DEATH_PLANE_MARGIN;
        set.push(Trigger::new(
            Shape::Plane(PlanePatch::new(
                Vec3::new(
                    -DEATH_PLANE_MARGIN,
                    DEATH_PLANE_MARGIN - height,
                    -DEATH_PLANE_DEPTH,
                ),
                Vec3::X * width,
                Vec3::Y * height,
            )),
            Owner::Board,
            TriggerKind::Death,
        ));

        debug!(triggers = set.len(), "built trigger set");
        set
    }
}

fn log_counts(colliders: &[Collider], radius: f64) {
    let (mut planes, mut cylinders, mut spheres) = (0, 0, 0);
    for collider in colliders {
        match collider.shape {
            Shape::Plane(_) | Shape::Triangle(_) => planes += 1,
            Shape::Cylinder(_) | Shape::InvertedCylinder(_) => cylinders += 1,
            Shape::Sphere(_) => spheres += 1,
        }
    }
    debug!(
        radius,
        total = colliders.len(),
        planes,
        cylinders,
        spheres,
        "built collider set"
    );
}

// =============================================================================
// Tests
// =============================================================================
