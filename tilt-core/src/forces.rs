//! Forces acting on a ball on the tilting board.
//!
//! - **Gravity**: constant pull along -Z
//! - **Tilt**: tipping the board by a small angle accelerates the ball
//!   along the board plane, approximated as a horizontal acceleration
//!
//! ```text
//!   tilt.x > 0            tilt.y > 0
//!   ball drifts → +X      ball drifts ↑ +Y (north)
//! ```
//!
//! The tilt comes from the input layer and is clamped to `tilt_limit` in
//! magnitude so a stuck key cannot fling the ball.

use crate::integrator::ForceModel;
use crate::materials::SolverSettings;
use crate::types::{BallState, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardForces {
    /// Downward acceleration, tiles per tick².
    pub gravity: f64,
    /// Largest tilt acceleration accepted by [`BoardForces::set_tilt`].
    pub tilt_limit: f64,
    tilt: Vec2,
}

impl Default for BoardForces {
    fn default() -> Self {
        Self::from(&SolverSettings::default())
    }
}

impl From<&SolverSettings> for BoardForces {
    fn from(settings: &SolverSettings) -> Self {
        Self {
            gravity: settings.gravity,
            tilt_limit: settings.tilt_limit,
            tilt: Vec2::ZERO,
        }
    }
}

impl BoardForces {
    /// Gravity with a zero tilt limit, so the board always stays level.
    pub fn gravity_only(gravity: f64) -> Self {
        Self {
            gravity,
            tilt_limit: 0.0,
            tilt: Vec2::ZERO,
        }
    }

    pub fn tilt(&self) -> Vec2 {
        self.tilt
    }

    /// Set the board tilt, clamping its length to `tilt_limit`. Non-finite
    /// input levels the board.
    pub fn set_tilt(&mut self, tilt: Vec2) {
        if !tilt.is_finite() {
            self.tilt = Vec2::ZERO;
            return;
        }
        let len = tilt.magnitude();
        self.tilt = if len > self.tilt_limit {
            tilt.normalized() * self.tilt_limit
        } else {
            tilt
        };
    }
}

impl ForceModel for BoardForces {
    fn acceleration(&self, _state: &BallState) -> Vec3 {
        Vec3::new(self.tilt.x, self.tilt.y, -self.gravity)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::TickIntegrator;
    use crate::types::ColorId;
    use approx::assert_abs_diff_eq;

    fn ball() -> BallState {
        BallState::at_rest(Vec3::ZERO, 0.35, ColorId(0))
    }

    #[test]
    fn test_gravity_only() {
        let forces = BoardForces::gravity_only(0.002);
        let acc = forces.acceleration(&ball());
        assert_eq!(acc, Vec3::new(0.0, 0.0, -0.002));
    }

    #[test]
    fn test_tilt_within_limit_passes_through() {
        let mut forces = BoardForces::default();
        forces.set_tilt(Vec2::new(0.0005, -0.0002));
        let acc = forces.acceleration(&ball());
        assert_abs_diff_eq!(acc.x, 0.0005);
        assert_abs_diff_eq!(acc.y, -0.0002);
        assert_abs_diff_eq!(acc.z, -forces.gravity);
    }

    #[test]
    fn test_tilt_is_clamped() {
        let mut forces = BoardForces::default();
        forces.set_tilt(Vec2::new(3.0, 4.0));
        let tilt = forces.tilt();
        assert_abs_diff_eq!(tilt.magnitude(), forces.tilt_limit, epsilon = 1e-15);
        assert_abs_diff_eq!(tilt.x / tilt.y, 0.75, epsilon = 1e-12);

        forces.set_tilt(Vec2::new(f64::NAN, 0.0));
        assert_eq!(forces.tilt(), Vec2::ZERO);
    }

    #[test]
    fn test_tilted_ball_drifts_downhill() {
        let mut forces = BoardForces::default();
        forces.set_tilt(Vec2::new(forces.tilt_limit, 0.0));
        let mut state = ball();
        for _ in 0..5 {
            TickIntegrator::apply(&mut state, &forces);
        }
        assert!(state.vel.x > 0.0);
        assert!(state.vel.z < 0.0);
        assert_abs_diff_eq!(state.vel.y, 0.0);
    }
}
