//! Fixed-tick force integration.
//!
//! Time is counted in ticks and a velocity is the motion of one tick, so
//! integration is a single semi-implicit Euler step on velocity:
//!
//! ```text
//! 1. a     = forces(ball)
//! 2. v_new = v + a            (this module)
//! 3. x_new = resolve(x, v_new) (collision::resolution)
//! ```
//!
//! Position is left alone: the resolution loop moves the ball
//! along `v_new` and is the only code that writes `pos`.

use crate::types::{BallState, Vec3};

/// Computes the acceleration acting on a ball, in tiles per tick².
pub trait ForceModel {
    fn acceleration(&self, state: &BallState) -> Vec3;
}

/// Velocity-only integrator for the fixed physics tick.
pub struct TickIntegrator;

impl TickIntegrator {
    /// Add one tick of acceleration to the ball's velocity and return the
    /// acceleration used.
    pub fn apply<F: ForceModel>(state: &mut BallState, forces: &F) -> Vec3 {
        let acceleration = forces.acceleration(state);
        state.vel += acceleration;
        acceleration
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColorId;
    use approx::assert_abs_diff_eq;

    struct Constant(Vec3);

    impl ForceModel for Constant {
        fn acceleration(&self, _state: &BallState) -> Vec3 {
            self.0
        }
    }

    #[test]
    fn test_apply_changes_velocity_only() {
        let mut ball = BallState::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.1, 0.0, 0.0), 0.3, ColorId(0));
        let acc = TickIntegrator::apply(&mut ball, &Constant(Vec3::new(0.0, 0.0, -0.002)));

        assert_eq!(acc, Vec3::new(0.0, 0.0, -0.002));
        assert_eq!(ball.pos, Vec3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(ball.vel.z, -0.002);
        assert_abs_diff_eq!(ball.vel.x, 0.1);
    }

    #[test]
    fn test_repeated_ticks_accumulate() {
        let mut ball = BallState::at_rest(Vec3::ZERO, 0.3, ColorId(0));
        let gravity = Constant(Vec3::new(0.0, 0.0, -0.001));
        for _ in 0..10 {
            TickIntegrator::apply(&mut ball, &gravity);
        }
        assert_abs_diff_eq!(ball.vel.z, -0.01, epsilon = 1e-15);
    }
}
