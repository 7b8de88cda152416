//! Per-tick collision resolution.
//!
//! The ball's velocity is its motion for one tick, so the tick starts with
//! the segment `pos .. pos + vel`. Each iteration:
//!
//! 1. every active trigger in the near-set is tested against the current
//!    segment and fires on a hit (the segment is left alone);
//! 2. every collider in the near-set is tested; the hit closest to the
//!    segment origin wins, ties going to the collider evaluated first;
//! 3. with no hit the tick is resolved, otherwise the segment is reflected
//!    at the contact and the loop goes again.
//!
//! ```text
//!        pos
//!         ●
//!          \            residual after bounce
//!           \          ↗
//!  ══════════●════════════  collider
//!         contact
//! ```
//!
//! A bounce never lengthens the segment, so the loop always ends. The
//! iteration cap only matters for wedged balls whose tiny bounces would
//! otherwise take many passes; hitting it drops the rest of the tick's
//! motion and leaves the ball at its last contact point.

use tracing::{debug, trace};

use super::broad_phase::NearSet;
use super::collider::{Collider, Hit};
use super::trigger::{TriggerEvent, TriggerSet};
use crate::level::Hole;
use crate::materials::SolverSettings;
use crate::types::{BallState, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionConfig {
    /// Passes through the loop before the rest of the motion is dropped.
    pub max_iterations: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

impl From<&SolverSettings> for ResolutionConfig {
    fn from(settings: &SolverSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
        }
    }
}

/// State of the resolution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Residual motion left to check.
    Active,
    /// No collider in the way of the residual motion.
    Resolved,
    /// Iteration cap reached with motion left over.
    Capped,
}

/// What happened to one ball during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub phase: Phase,
    pub iterations: usize,
    pub bounces: usize,
    /// Index of the collider of the final bounce.
    pub last_collider: Option<usize>,
    /// `|v_after - v_before|` over the whole tick.
    pub impact: f64,
    pub events: Vec<TriggerEvent>,
}

impl ResolutionReport {
    fn start() -> Self {
        Self {
            phase: Phase::Active,
            iterations: 0,
            bounces: 0,
            last_collider: None,
            impact: 0.0,
            events: Vec::new(),
        }
    }

    pub fn capped(&self) -> bool {
        self.phase == Phase::Capped
    }
}

/// Runs the bounce loop for a single ball.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    config: ResolutionConfig,
}

impl Resolver {
    pub fn new(config: ResolutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Move `ball` through one tick against the colliders and triggers
    /// listed in `near`, writing back position, velocity and impact.
    ///
    /// `near` holds indices into `colliders` and `triggers`; indices that
    /// fall outside them are skipped.
    pub fn resolve(
        &self,
        ball: &mut BallState,
        colliders: &[Collider],
        triggers: &mut TriggerSet,
        near: &NearSet,
        holes: &mut [Hole],
    ) -> ResolutionReport {
        let initial_velocity = ball.vel;
        let mut velocity = ball.vel;
        let mut segment = ball.motion();
        let mut report = ResolutionReport::start();

        while report.phase == Phase::Active {
            if report.iterations >= self.config.max_iterations {
                report.phase = Phase::Capped;
                debug!(
                    iterations = report.iterations,
                    pos = ?segment.origin,
                    residual = segment.length(),
                    "iteration cap reached, dropping remaining motion"
                );
                break;
            }
            report.iterations += 1;

            for &index in near.triggers() {
                let Some(trigger) = triggers.get_mut(index) else {
                    continue;
                };
                if trigger.intersect(&segment).is_some() {
                    if let Some(event) = trigger.fire(ball, holes) {
                        report.events.push(event);
                    }
                }
            }

            let Some((index, collider, hit)) = nearest_hit(colliders, near, &segment) else {
                report.phase = Phase::Resolved;
                break;
            };

            trace!(
                iteration = report.iterations,
                collider = index,
                surface = ?collider.surface,
                t = hit.t,
                point = ?hit.point,
                "bounce"
            );
            velocity = collider.reflect_direction(velocity, &hit);
            segment = collider.reflect(&segment, &hit);
            report.bounces += 1;
            report.last_collider = Some(index);
        }

        ball.pos = match report.phase {
            Phase::Capped => segment.origin,
            _ => segment.end(),
        };
        ball.vel = velocity;
        ball.last_impact = (velocity - initial_velocity).magnitude();
        report.impact = ball.last_impact;
        report
    }
}

/// Closest hit to the segment origin. A later collider only replaces the
/// current best when strictly closer.
fn nearest_hit<'a>(
    colliders: &'a [Collider],
    near: &NearSet,
    segment: &Segment,
) -> Option<(usize, &'a Collider, Hit)> {
    let mut best: Option<(usize, &Collider, Hit, f64)> = None;
    for &index in near.colliders() {
        let Some(collider) = colliders.get(index) else {
            continue;
        };
        let Some(hit) = collider.intersect(segment) else {
            continue;
        };
        let distance = hit.point.distance(&segment.origin);
        if best.as_ref().map_or(true, |(.., d)| distance < *d) {
            best = Some((index, collider, hit, distance));
        }
    }
    best.map(|(index, collider, hit, _)| (index, collider, hit))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Owner, Shape, Trigger, TriggerKind};
    use crate::geometry::PlanePatch;
    use crate::materials::SurfaceKind;
    use crate::types::{ColorId, ExplosionState, Vec3};
    use approx::assert_abs_diff_eq;

    fn floor(z: f64, restitution: f64) -> Collider {
        Collider::new(
            Shape::Plane(PlanePatch::new(Vec3::new(0.0, -1.0, z), Vec3::X * 3.0, Vec3::Y)),
            Owner::Tile { col: 0, row: 0 },
            SurfaceKind::Floor,
            restitution,
        )
    }

    fn run(
        ball: &mut BallState,
        colliders: &[Collider],
        triggers: &mut TriggerSet,
        max_iterations: usize,
    ) -> ResolutionReport {
        let near = NearSet::everything(colliders, triggers);
        Resolver::new(ResolutionConfig { max_iterations }).resolve(
            ball,
            colliders,
            triggers,
            &near,
            &mut [],
        )
    }

    #[test]
    fn test_free_motion_moves_full_velocity() {
        let mut ball = BallState::new(Vec3::new(0.5, -0.5, 1.0), Vec3::new(0.1, 0.0, -0.1), 0.3, ColorId(0));
        let report = run(&mut ball, &[floor(0.0, 0.5)], &mut TriggerSet::default(), 10);

        assert_eq!(report.phase, Phase::Resolved);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.bounces, 0);
        assert_abs_diff_eq!(ball.pos.x, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(ball.pos.z, 0.9, epsilon = 1e-12);
        assert_eq!(ball.last_impact, 0.0);
    }

    #[test]
    fn test_ball_lands_on_extruded_floor() {
        // Tile surface at z = -0.5, grown by the ball radius
        let radius = 0.35;
        let surface = -0.5 + radius;
        let mut ball = BallState::new(
            Vec3::new(1.5, -0.5, surface + 0.002),
            Vec3::new(0.0, 0.0, -0.003),
            radius,
            ColorId(0),
        );
        let report = run(&mut ball, &[floor(surface, 0.5)], &mut TriggerSet::default(), 10);

        assert_eq!(report.bounces, 1);
        assert_eq!(report.last_collider, Some(0));
        assert_abs_diff_eq!(ball.vel.z, 0.0015, epsilon = 1e-12);
        assert_abs_diff_eq!(ball.pos.z, surface + 0.0005, epsilon = 1e-12);
        assert!(ball.pos.z >= surface);
        assert_abs_diff_eq!(ball.last_impact, 0.0045, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_distance_tie_goes_to_first_collider() {
        let colliders = [floor(0.0, 0.2), floor(0.0, 0.8)];
        let mut ball = BallState::new(Vec3::new(0.5, -0.5, 0.1), Vec3::new(0.0, 0.0, -0.2), 0.0, ColorId(0));
        let report = run(&mut ball, &colliders, &mut TriggerSet::default(), 10);

        assert_eq!(report.last_collider, Some(0));
        assert_abs_diff_eq!(ball.vel.z, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_collider_wins() {
        let colliders = [floor(-0.5, 1.0), floor(0.0, 1.0)];
        let mut ball = BallState::new(Vec3::new(0.5, -0.5, 0.1), Vec3::new(0.0, 0.0, -1.0), 0.0, ColorId(0));
        let report = run(&mut ball, &colliders, &mut TriggerSet::default(), 10);

        assert_eq!(report.last_collider, Some(1));
        assert_eq!(report.bounces, 1);
        assert_abs_diff_eq!(ball.pos.z, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_wedged_ball_stops_at_iteration_cap() {
        // Two walls 0.1 apart facing each other, perfectly elastic
        let left = Collider::new(
            Shape::Plane(PlanePatch::new(Vec3::new(0.0, -1.0, -1.0), Vec3::Y * 2.0, Vec3::Z * 2.0)),
            Owner::Board,
            SurfaceKind::Wall,
            1.0,
        );
        let right = Collider::new(
            Shape::Plane(PlanePatch::new(Vec3::new(0.1, -1.0, -1.0), Vec3::Z * 2.0, Vec3::Y * 2.0)),
            Owner::Board,
            SurfaceKind::Wall,
            1.0,
        );
        let mut ball = BallState::new(Vec3::new(0.05, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 0.0, ColorId(0));
        let report = run(&mut ball, &[left, right], &mut TriggerSet::default(), 10);

        assert!(report.capped());
        assert_eq!(report.iterations, 10);
        assert_eq!(report.bounces, 10);
        assert!(ball.pos.x >= -1e-9 && ball.pos.x <= 0.1 + 1e-9);
        assert_abs_diff_eq!(ball.vel.x.abs(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loop_terminates_for_every_cap() {
        for cap in 1..=12 {
            let mut ball = BallState::new(Vec3::new(0.5, -0.5, 0.2), Vec3::new(0.0, 0.0, -3.0), 0.0, ColorId(0));
            let colliders = [floor(0.0, 1.0), {
                let mut ceiling = floor(0.3, 1.0);
                ceiling.shape = Shape::Plane(PlanePatch::new(Vec3::new(0.0, -1.0, 0.3), Vec3::Y, Vec3::X * 3.0));
                ceiling
            }];
            let report = run(&mut ball, &colliders, &mut TriggerSet::default(), cap);
            assert!(report.iterations <= cap);
        }
    }

    #[test]
    fn test_trigger_fires_in_the_bouncing_tick() {
        let colliders = [floor(0.0, 0.5)];
        let mut triggers = TriggerSet::new(vec![Trigger::new(
            Shape::Plane(PlanePatch::new(Vec3::new(0.0, -1.0, 0.05), Vec3::X, Vec3::Y)),
            Owner::Hole(0),
            TriggerKind::ExplosiveDeath,
        )]);
        let mut ball = BallState::new(Vec3::new(0.5, -0.5, 0.1), Vec3::new(0.0, 0.0, -0.2), 0.0, ColorId(0));
        let report = run(&mut ball, &colliders, &mut triggers, 10);

        assert_eq!(report.events, vec![TriggerEvent::ExplosionRequested]);
        assert_eq!(ball.explosion, ExplosionState::Requested);
        assert_eq!(report.bounces, 1);
        assert!(ball.vel.z > 0.0);
        assert_eq!(triggers.active_count(), 0);
    }

    #[test]
    fn test_stationary_ball_never_hits() {
        let mut ball = BallState::at_rest(Vec3::new(0.5, -0.5, 0.0), 0.0, ColorId(0));
        let report = run(&mut ball, &[floor(0.0, 0.5)], &mut TriggerSet::default(), 10);
        assert_eq!(report.phase, Phase::Resolved);
        assert_eq!(report.bounces, 0);
        assert_eq!(ball.pos, Vec3::new(0.5, -0.5, 0.0));
    }
}
