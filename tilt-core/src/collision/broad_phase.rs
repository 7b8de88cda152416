//! Broad phase: pick the colliders and triggers worth testing this tick.
//!
//! A linear pass over the level with each object's conservative
//! `is_nearby` test. The result is a pair of index lists into the level's
//! collider slice and trigger set; the buffers are owned by each ball and
//! reused every tick, so steady-state rebuilding does not allocate.

use super::collider::Collider;
use super::trigger::TriggerSet;
use crate::geometry::Sphere;

#[derive(Debug, Clone, Default)]
pub struct NearSet {
    colliders: Vec<usize>,
    triggers: Vec<usize>,
}

impl NearSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with everything that may be reached from
    /// inside `bounds`. Order follows the source order.
    pub fn rebuild(&mut self, colliders: &[Collider], triggers: &TriggerSet, bounds: &Sphere) {
        self.colliders.clear();
        self.triggers.clear();
        self.colliders.extend(
            colliders
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_nearby(bounds))
                .map(|(i, _)| i),
        );
        self.triggers.extend(
            triggers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.is_nearby(bounds))
                .map(|(i, _)| i),
        );
    }

    /// Every collider and trigger, unfiltered.
    pub fn everything(colliders: &[Collider], triggers: &TriggerSet) -> Self {
        Self {
            colliders: (0..colliders.len()).collect(),
            triggers: (0..triggers.len()).collect(),
        }
    }

    pub fn colliders(&self) -> &[usize] {
        &self.colliders
    }

    pub fn triggers(&self) -> &[usize] {
        &self.triggers
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty() && self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Owner, Shape, Trigger, TriggerKind};
    use crate::geometry::{Cylinder, PlanePatch};
    use crate::materials::SurfaceKind;
    use crate::types::Vec3;

    fn floor_at(col: f64) -> Collider {
        Collider::new(
            Shape::Plane(PlanePatch::new(Vec3::new(col, -1.0, 0.0), Vec3::X, Vec3::Y)),
            Owner::Board,
            SurfaceKind::Floor,
            0.5,
        )
    }

    #[test]
    fn test_rebuild_keeps_only_nearby_in_order() {
        let colliders = vec![
            floor_at(0.0),
            floor_at(20.0),
            floor_at(1.0),
            Collider::new(
                Shape::Cylinder(Cylinder::vertical(Vec3::new(1.0, 0.0, 0.0), 1.0, 0.3)),
                Owner::Board,
                SurfaceKind::Wall,
                0.5,
            ),
        ];
        let triggers = TriggerSet::new(vec![
            Trigger::new(
                Shape::Plane(PlanePatch::new(Vec3::new(0.0, -1.0, -5.0), Vec3::X, Vec3::Y)),
                Owner::Board,
                TriggerKind::Death,
            ),
            Trigger::new(
                Shape::Plane(PlanePatch::new(Vec3::new(0.0, -1.0, -0.5), Vec3::X, Vec3::Y)),
                Owner::Hole(0),
                TriggerKind::ExplosiveDeath,
            ),
        ]);

        let mut near = NearSet::new();
        near.rebuild(&colliders, &triggers, &Sphere::new(Vec3::new(0.9, -0.5, 0.3), 0.4));
        assert_eq!(near.colliders(), &[0, 2, 3]);
        assert_eq!(near.triggers(), &[1]);

        near.rebuild(&colliders, &triggers, &Sphere::new(Vec3::new(50.0, 0.0, 0.0), 0.4));
        assert!(near.is_empty());
    }

    #[test]
    fn test_everything_lists_all_indices() {
        let colliders = vec![floor_at(0.0), floor_at(5.0)];
        let near = NearSet::everything(&colliders, &TriggerSet::default());
        assert_eq!(near.colliders(), &[0, 1]);
        assert!(near.triggers().is_empty());
    }
}
