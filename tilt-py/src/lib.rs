//! Python bindings for the tilt-core board physics engine.
//!
//! Provides a simple Python API for the scene and audio layers:
//!
//! ```python
//! from tilt_physics import Level, Simulation
//!
//! level = Level(3, 1)
//! level.set_hole(2, 0, goal=1)
//! level.enclose()
//!
//! sim = Simulation(level, materials_dir="materials")
//! ball = sim.add_ball(0.35, 1, 0.5, -0.5, 0.35)
//! sim.set_tilt(0.001, 0.0)
//!
//! for _ in range(600):
//!     for ball_id, event in sim.step():
//!         print(ball_id, event)
//!     if sim.all_goals_reached():
//!         break
//! ```

use std::path::PathBuf;

use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;

use tilt_core::collision::TriggerEvent;
use tilt_core::level::{Level as CoreLevel, Side, Tile};
use tilt_core::materials::{BallProperties, MaterialLoader, Materials};
use tilt_core::simulation::{BallId, Simulation as CoreSimulation, SimulationError};
use tilt_core::types::{BallState, ColorId, ExplosionState, Vec2, Vec3 as CoreVec3};

fn to_py_err(err: SimulationError) -> PyErr {
    match err {
        SimulationError::UnknownBall(_) => PyIndexError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn parse_side(side: &str) -> PyResult<Side> {
    match side {
        "north" => Ok(Side::North),
        "east" => Ok(Side::East),
        "south" => Ok(Side::South),
        "west" => Ok(Side::West),
        other => Err(PyValueError::new_err(format!(
            "unknown side {other:?}, expected north/east/south/west"
        ))),
    }
}

fn event_name(event: TriggerEvent) -> &'static str {
    match event {
        TriggerEvent::Died => "died",
        TriggerEvent::GoalReached { .. } => "goal_reached",
        TriggerEvent::WrongGoal { .. } => "wrong_goal",
        TriggerEvent::ExplosionRequested => "explosion_requested",
        TriggerEvent::ExplosionSuppressed => "explosion_suppressed",
    }
}

/// 3D vector for positions and velocities.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn magnitude(&self) -> f64 {
        CoreVec3::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

/// Level grid under construction. Every tile starts as floor.
#[pyclass]
#[derive(Clone)]
pub struct Level {
    inner: CoreLevel,
}

#[pymethods]
impl Level {
    #[new]
    fn new(width: usize, height: usize) -> PyResult<Self> {
        let inner =
            CoreLevel::new(width, height).map_err(|e| to_py_err(SimulationError::from(e)))?;
        Ok(Self { inner })
    }

    #[getter]
    fn width(&self) -> usize {
        self.inner.width()
    }

    #[getter]
    fn height(&self) -> usize {
        self.inner.height()
    }

    #[getter]
    fn hole_radius(&self) -> f64 {
        self.inner.hole_radius()
    }

    #[setter]
    fn set_hole_radius(&mut self, radius: f64) -> PyResult<()> {
        self.inner
            .set_hole_radius(radius)
            .map_err(|e| to_py_err(e.into()))
    }

    fn set_floor(&mut self, col: usize, row: usize) -> PyResult<()> {
        self.set_tile(col, row, Tile::Floor)
    }

    fn set_empty(&mut self, col: usize, row: usize) -> PyResult<()> {
        self.set_tile(col, row, Tile::Empty)
    }

    /// Turn a tile into a hole; with `goal` set it only accepts balls of
    /// that colour.
    #[pyo3(signature = (col, row, goal=None))]
    fn set_hole(&mut self, col: usize, row: usize, goal: Option<u32>) -> PyResult<()> {
        self.set_tile(
            col,
            row,
            Tile::Hole {
                goal: goal.map(ColorId),
            },
        )
    }

    /// Set or clear the wall on one side ("north", "east", "south", "west").
    #[pyo3(signature = (col, row, side, present=true))]
    fn set_wall(&mut self, col: usize, row: usize, side: &str, present: bool) -> PyResult<()> {
        let side = parse_side(side)?;
        self.inner
            .set_wall(col, row, side, present)
            .map_err(|e| to_py_err(e.into()))
    }

    fn has_wall(&self, col: usize, row: usize, side: &str) -> PyResult<bool> {
        Ok(self.inner.has_wall(col, row, parse_side(side)?))
    }

    /// Wall in the outer border.
    fn enclose(&mut self) {
        self.inner.enclose();
    }

    fn __repr__(&self) -> String {
        format!(
            "Level({}x{}, holes={})",
            self.inner.width(),
            self.inner.height(),
            self.inner.holes().len()
        )
    }
}

impl Level {
    fn set_tile(&mut self, col: usize, row: usize, tile: Tile) -> PyResult<()> {
        self.inner
            .set_tile(col, row, tile)
            .map_err(|e| to_py_err(e.into()))
    }
}

/// Main simulation class.
///
/// One call to `step` is one fixed physics tick for every ball.
#[pyclass]
pub struct Simulation {
    inner: CoreSimulation,
    loader: Option<MaterialLoader>,
}

#[pymethods]
impl Simulation {
    /// Create a simulation for `level`. Without `materials_dir` the
    /// built-in surface and solver defaults are used.
    #[new]
    #[pyo3(signature = (level, materials_dir=None, solver="default"))]
    fn new(level: PyRef<'_, Level>, materials_dir: Option<PathBuf>, solver: &str) -> PyResult<Self> {
        let level = level.inner.clone();
        let Some(dir) = materials_dir else {
            return Ok(Self {
                inner: CoreSimulation::with_defaults(level),
                loader: None,
            });
        };
        let loader = MaterialLoader::new(dir);
        let materials =
            Materials::load(&loader, solver).map_err(|e| to_py_err(SimulationError::from(e)))?;
        let inner = CoreSimulation::new(level, materials).map_err(to_py_err)?;
        Ok(Self {
            inner,
            loader: Some(loader),
        })
    }

    /// Ticks since creation or the last reset.
    #[getter]
    fn tick(&self) -> u64 {
        self.inner.tick()
    }

    /// Add a ball at rest. Returns its id.
    fn add_ball(&mut self, radius: f64, color: u32, x: f64, y: f64, z: f64) -> PyResult<usize> {
        let props = BallProperties {
            name: "custom".to_string(),
            radius,
            color: ColorId(color),
        };
        self.add(&props, x, y, z)
    }

    /// Add a ball from a preset in `<materials_dir>/balls/`.
    fn add_ball_preset(&mut self, name: &str, x: f64, y: f64, z: f64) -> PyResult<usize> {
        let Some(loader) = &self.loader else {
            return Err(PyValueError::new_err(
                "ball presets need a simulation created with materials_dir",
            ));
        };
        let props = loader
            .load_ball(name)
            .map_err(|e| to_py_err(SimulationError::from(e)))?;
        self.add(&props, x, y, z)
    }

    fn ball_count(&self) -> usize {
        self.inner.ball_count()
    }

    /// Tilt the board; the acceleration is clamped to the solver's limit.
    fn set_tilt(&mut self, x: f64, y: f64) {
        self.inner.set_tilt(Vec2::new(x, y));
    }

    fn tilt(&self) -> (f64, f64) {
        let tilt = self.inner.tilt();
        (tilt.x, tilt.y)
    }

    fn ball_position(&self, ball: usize) -> PyResult<Vec3> {
        Ok(self.ball(ball)?.pos.into())
    }

    fn ball_velocity(&self, ball: usize) -> PyResult<Vec3> {
        Ok(self.ball(ball)?.vel.into())
    }

    fn ball_dead(&self, ball: usize) -> PyResult<bool> {
        Ok(self.ball(ball)?.dead)
    }

    fn ball_reached_goal(&self, ball: usize) -> PyResult<bool> {
        Ok(self.ball(ball)?.reached_goal)
    }

    fn explosion_requested(&self, ball: usize) -> PyResult<bool> {
        Ok(self.ball(ball)?.explosion == ExplosionState::Requested)
    }

    /// Velocity change over the last tick, for impact sounds.
    fn last_impact(&self, ball: usize) -> PyResult<f64> {
        Ok(self.ball(ball)?.last_impact)
    }

    fn begin_explosion(&mut self, ball: usize) -> PyResult<bool> {
        self.inner.begin_explosion(BallId(ball)).map_err(to_py_err)
    }

    fn finish_explosion(&mut self, ball: usize) -> PyResult<bool> {
        self.inner.finish_explosion(BallId(ball)).map_err(to_py_err)
    }

    fn all_goals_reached(&self) -> bool {
        self.inner.all_goals_reached()
    }

    /// Reached flag of every hole, in row order.
    fn holes_reached(&self) -> Vec<bool> {
        self.inner.holes().iter().map(|h| h.reached_goal).collect()
    }

    /// Advance one tick. Returns `(ball_id, event)` pairs for triggers
    /// that fired.
    fn step(&mut self) -> Vec<(usize, &'static str)> {
        self.inner
            .step()
            .into_iter()
            .map(|(id, event)| (id.0, event_name(event)))
            .collect()
    }

    /// Run several ticks at once, collecting every event.
    fn step_n(&mut self, steps: usize) -> Vec<(usize, &'static str)> {
        self.inner
            .step_n(steps)
            .into_iter()
            .map(|(id, event)| (id.0, event_name(event)))
            .collect()
    }

    /// Re-arm triggers and put every ball back on its spawn point.
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Replace the level and reset.
    fn set_level(&mut self, level: PyRef<'_, Level>) {
        self.inner.set_level(level.inner.clone());
    }

    /// Get one ball's state as dict for easy inspection.
    fn state_dict(&self, ball: usize) -> PyResult<PyObject> {
        let state = *self.ball(ball)?;
        Python::with_gil(|py| {
            let dict = pyo3::types::PyDict::new(py);
            dict.set_item("tick", self.inner.tick())?;
            dict.set_item("ball_x", state.pos.x)?;
            dict.set_item("ball_y", state.pos.y)?;
            dict.set_item("ball_z", state.pos.z)?;
            dict.set_item("ball_vx", state.vel.x)?;
            dict.set_item("ball_vy", state.vel.y)?;
            dict.set_item("ball_vz", state.vel.z)?;
            dict.set_item("radius", state.radius)?;
            dict.set_item("color", state.color.0)?;
            dict.set_item("dead", state.dead)?;
            dict.set_item("reached_goal", state.reached_goal)?;
            dict.set_item(
                "explosion_requested",
                state.explosion == ExplosionState::Requested,
            )?;
            dict.set_item("last_impact", state.last_impact)?;
            Ok(dict.into_any().unbind())
        })
    }
}

impl Simulation {
    fn ball(&self, ball: usize) -> PyResult<&BallState> {
        self.inner.ball(BallId(ball)).map_err(to_py_err)
    }

    fn add(&mut self, props: &BallProperties, x: f64, y: f64, z: f64) -> PyResult<usize> {
        let id = self
            .inner
            .add_ball(props, CoreVec3::new(x, y, z))
            .map_err(to_py_err)?;
        Ok(id.0)
    }
}

/// Python module definition.
#[pymodule]
fn tilt_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<Level>()?;
    m.add_class::<Simulation>()?;
    Ok(())
}
