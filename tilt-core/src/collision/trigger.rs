//! Triggers: intersection-only objects that fire a one-shot side effect.
//!
//! A trigger never changes the ball's motion. It is tested against every
//! residual segment of the resolution loop and, on its first hit, mutates
//! ball or hole flags and disarms itself. Nothing re-arms a trigger; the
//! whole set is rebuilt on level reset.
//!
//! ```text
//!   Active ──hit──▶ Fired
//!     ▲               │
//!     └── rebuild ────┘   (level reset only)
//! ```

use tracing::{info, warn};

use super::collider::{Hit, Owner, Shape};
use crate::geometry::Sphere;
use crate::level::Hole;
use crate::types::{BallState, ExplosionState, Segment};

/// What a trigger does when the ball passes through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Marks the ball dead.
    Death,
    /// Compares the ball colour against hole `hole`.
    Goal { hole: usize },
    /// Requests an explosion unless one is already under way.
    ExplosiveDeath,
}

/// Observable result of a trigger firing, reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Died,
    GoalReached { hole: usize },
    WrongGoal { hole: usize },
    ExplosionRequested,
    /// Fired while an explosion was already pending or playing.
    ExplosionSuppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Active,
    Fired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub shape: Shape,
    pub owner: Owner,
    pub kind: TriggerKind,
    state: TriggerState,
}

impl Trigger {
    pub fn new(shape: Shape, owner: Owner, kind: TriggerKind) -> Self {
        Self {
            shape,
            owner,
            kind,
            state: TriggerState::Active,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TriggerState::Active
    }

    /// Intersection test only. Disarmed triggers never report a hit.
    pub fn intersect(&self, segment: &Segment) -> Option<Hit> {
        if !self.is_active() {
            return None;
        }
        self.shape.intersect(segment)
    }

    pub fn is_nearby(&self, bounds: &Sphere) -> bool {
        self.is_active() && self.shape.is_nearby(bounds)
    }

    /// Apply this trigger's side effect and disarm it.
    ///
    /// Returns `None` if the trigger had already fired.
    pub fn fire(&mut self, ball: &mut BallState, holes: &mut [Hole]) -> Option<TriggerEvent> {
        if !self.is_active() {
            return None;
        }
        self.state = TriggerState::Fired;

        let event = match self.kind {
            TriggerKind::Death => {
                ball.dead = true;
                TriggerEvent::Died
            }
            TriggerKind::Goal { hole } => match holes.get_mut(hole) {
                Some(target) if target.goal == Some(ball.color) => {
                    ball.reached_goal = true;
                    target.reached_goal = true;
                    TriggerEvent::GoalReached { hole }
                }
                Some(_) => {
                    request_explosion(ball);
                    TriggerEvent::WrongGoal { hole }
                }
                None => {
                    warn!(hole, "goal trigger refers to a missing hole");
                    request_explosion(ball);
                    TriggerEvent::WrongGoal { hole }
                }
            },
            TriggerKind::ExplosiveDeath => {
                if request_explosion(ball) {
                    TriggerEvent::ExplosionRequested
                } else {
                    TriggerEvent::ExplosionSuppressed
                }
            }
        };

        info!(?event, owner = ?self.owner, color = ball.color.0, "trigger fired");
        Some(event)
    }
}

/// Returns whether a new explosion was requested.
fn request_explosion(ball: &mut BallState) -> bool {
    if ball.explosion.in_progress() {
        return false;
    }
    ball.explosion = ExplosionState::Requested;
    true
}

/// The triggers of one level, in build order.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }

    pub fn push(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Trigger> {
        self.triggers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Trigger> {
        self.triggers.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    pub fn active_count(&self) -> usize {
        self.triggers.iter().filter(|t| t.is_active()).count()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanePatch;
    use crate::types::{ColorId, Vec3};

    fn plane_at(z: f64) -> Shape {
        Shape::Plane(PlanePatch::new(
            Vec3::new(0.0, -1.0, z),
            Vec3::X,
            Vec3::Y,
        ))
    }

    fn goal_hole(color: u32) -> Hole {
        Hole {
            col: 0,
            row: 0,
            goal: Some(ColorId(color)),
            reached_goal: false,
        }
    }

    fn ball(color: u32) -> BallState {
        BallState::new(
            Vec3::new(0.5, -0.5, 0.1),
            Vec3::new(0.0, 0.0, -0.2),
            0.3,
            ColorId(color),
        )
    }

    #[test]
    fn test_goal_match_marks_ball_and_hole() {
        let mut holes = vec![goal_hole(2)];
        let mut trigger = Trigger::new(plane_at(0.0), Owner::Hole(0), TriggerKind::Goal { hole: 0 });
        let mut ball = ball(2);

        assert!(trigger.intersect(&ball.motion()).is_some());
        let event = trigger.fire(&mut ball, &mut holes);

        assert_eq!(event, Some(TriggerEvent::GoalReached { hole: 0 }));
        assert!(ball.reached_goal);
        assert!(holes[0].reached_goal);
        assert_eq!(ball.explosion, ExplosionState::Idle);
        assert_eq!(trigger.state(), TriggerState::Fired);
        assert!(trigger.intersect(&ball.motion()).is_none());
    }

    #[test]
    fn test_goal_mismatch_fires_failure_once() {
        let mut holes = vec![goal_hole(1)];
        let mut trigger = Trigger::new(plane_at(0.0), Owner::Hole(0), TriggerKind::Goal { hole: 0 });
        let mut ball = ball(3);

        let first = trigger.fire(&mut ball, &mut holes);
        assert_eq!(first, Some(TriggerEvent::WrongGoal { hole: 0 }));
        assert_eq!(ball.explosion, ExplosionState::Requested);
        assert!(!ball.reached_goal);
        assert!(!holes[0].reached_goal);

        assert_eq!(trigger.fire(&mut ball, &mut holes), None);
    }

    #[test]
    fn test_death_marks_ball_dead() {
        let mut trigger = Trigger::new(plane_at(0.0), Owner::Board, TriggerKind::Death);
        let mut ball = ball(0);
        assert_eq!(trigger.fire(&mut ball, &mut []), Some(TriggerEvent::Died));
        assert!(ball.dead);
    }

    #[test]
    fn test_explosive_death_respects_running_explosion() {
        let mut trigger = Trigger::new(plane_at(0.0), Owner::Hole(0), TriggerKind::ExplosiveDeath);
        let mut ball = ball(0);
        ball.explosion = ExplosionState::Playing;

        let event = trigger.fire(&mut ball, &mut []);
        assert_eq!(event, Some(TriggerEvent::ExplosionSuppressed));
        assert_eq!(ball.explosion, ExplosionState::Playing);
        assert!(!trigger.is_active());
    }

    #[test]
    fn test_fired_trigger_is_never_nearby() {
        let mut set = TriggerSet::new(vec![Trigger::new(
            plane_at(0.0),
            Owner::Board,
            TriggerKind::Death,
        )]);
        let bounds = Sphere::new(Vec3::new(0.5, -0.5, 0.0), 1.0);
        assert!(set.get(0).is_some_and(|t| t.is_nearby(&bounds)));

        let mut ball = ball(0);
        if let Some(trigger) = set.get_mut(0) {
            trigger.fire(&mut ball, &mut []);
        }
        assert_eq!(set.active_count(), 0);
        assert!(set.get(0).is_some_and(|t| !t.is_nearby(&bounds)));
    }
}
