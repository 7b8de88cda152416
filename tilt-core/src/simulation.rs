//! Simulation orchestrator.
//!
//! Owns the level, its colliders and triggers, the hole states and every
//! ball, and runs the per-tick pipeline:
//!
//! ```text
//! for each live ball:
//!     forces ──▶ velocity          (integrator)
//!     motion bounds ──▶ near-set   (broad phase)
//!     near-set ──▶ bounce loop     (resolution, triggers fire here)
//! ```
//!
//! Collider sets depend on the ball radius and are built once per distinct
//! radius, then reused every tick. Each ball carries its own copy of the
//! trigger set, so a trigger fired by one ball stays armed for the others.
//! A fired trigger stays fired until [`Simulation::reset`]. Hole states are
//! level state and shared.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::builder::LevelColliderBuilder;
use crate::collision::{
    Collider, NearSet, ResolutionConfig, ResolutionReport, Resolver, TriggerEvent, TriggerSet,
};
use crate::forces::BoardForces;
use crate::geometry::motion_bounds;
use crate::integrator::TickIntegrator;
use crate::level::{Hole, Level, LevelError};
use crate::materials::{BallProperties, MaterialError, Materials};
use crate::types::{BallState, ExplosionState, Vec2, Vec3};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no ball with id {0}")]
    UnknownBall(usize),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Material(#[from] MaterialError),
}

/// Handle to a ball added with [`Simulation::add_ball`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BallId(pub usize);

#[derive(Debug, Clone)]
struct BallSlot {
    state: BallState,
    spawn: Vec3,
    triggers: TriggerSet,
    near: NearSet,
    last_report: Option<ResolutionReport>,
}

impl BallSlot {
    fn respawn(&mut self, armed: &TriggerSet) {
        self.state = BallState::new(self.spawn, Vec3::ZERO, self.state.radius, self.state.color);
        self.triggers = armed.clone();
        self.near = NearSet::new();
        self.last_report = None;
    }
}

/// Collider sets keyed by the bit pattern of the ball radius.
type ColliderCache = HashMap<u64, Vec<Collider>>;

pub struct Simulation {
    level: Level,
    materials: Materials,
    forces: BoardForces,
    resolver: Resolver,
    colliders: ColliderCache,
    /// Freshly armed triggers, copied into every ball on spawn.
    armed: TriggerSet,
    holes: Vec<Hole>,
    balls: Vec<BallSlot>,
    tick: u64,
}

impl Simulation {
    pub fn new(level: Level, materials: Materials) -> Result<Self, SimulationError> {
        materials.validate()?;
        Ok(Self::assemble(level, materials))
    }

    /// Simulation with built-in surface and solver defaults.
    pub fn with_defaults(level: Level) -> Self {
        Self::assemble(level, Materials::default())
    }

    fn assemble(level: Level, materials: Materials) -> Self {
        let armed = LevelColliderBuilder::new(&level, &materials.surfaces).triggers();
        Self {
            forces: BoardForces::from(&materials.solver),
            resolver: Resolver::new(ResolutionConfig::from(&materials.solver)),
            colliders: ColliderCache::new(),
            armed,
            holes: level.holes(),
            balls: Vec::new(),
            tick: 0,
            level,
            materials,
        }
    }

    /// Place a ball at rest at `position`. Its collider set is built now if
    /// no ball of the same radius exists yet.
    pub fn add_ball(
        &mut self,
        props: &BallProperties,
        position: Vec3,
    ) -> Result<BallId, SimulationError> {
        props.validate()?;
        let state = BallState::at_rest(position, props.radius, props.color);
        self.colliders_for_radius(state.radius);
        self.balls.push(BallSlot {
            state,
            spawn: position,
            triggers: self.armed.clone(),
            near: NearSet::new(),
            last_report: None,
        });
        Ok(BallId(self.balls.len() - 1))
    }

    fn colliders_for_radius(&mut self, radius: f64) -> &[Collider] {
        let level = &self.level;
        let surfaces = &self.materials.surfaces;
        self.colliders
            .entry(radius.to_bits())
            .or_insert_with(|| LevelColliderBuilder::new(level, surfaces).build(radius))
    }

    /// Colliders built for balls of `radius`, if any ball uses it.
    pub fn colliders(&self, radius: f64) -> Option<&[Collider]> {
        self.colliders.get(&radius.to_bits()).map(Vec::as_slice)
    }

    pub fn set_tilt(&mut self, tilt: Vec2) {
        self.forces.set_tilt(tilt);
    }

    pub fn tilt(&self) -> Vec2 {
        self.forces.tilt()
    }

    /// Advance every live ball by one tick. Returns the trigger events of
    /// this tick, tagged with the ball that caused them.
    pub fn step(&mut self) -> Vec<(BallId, TriggerEvent)> {
        self.tick += 1;
        let mut events = Vec::new();

        for (index, slot) in self.balls.iter_mut().enumerate() {
            if slot.state.dead {
                continue;
            }
            TickIntegrator::apply(&mut slot.state, &self.forces);

            let radius = slot.state.radius;
            let level = &self.level;
            let surfaces = &self.materials.surfaces;
            let colliders: &[Collider] = self
                .colliders
                .entry(radius.to_bits())
                .or_insert_with(|| LevelColliderBuilder::new(level, surfaces).build(radius));

            slot.near
                .rebuild(colliders, &slot.triggers, &motion_bounds(&slot.state));
            let report = self.resolver.resolve(
                &mut slot.state,
                colliders,
                &mut slot.triggers,
                &slot.near,
                &mut self.holes,
            );
            events.extend(report.events.iter().map(|event| (BallId(index), *event)));
            slot.last_report = Some(report);
        }
        events
    }

    /// Run `n` ticks, collecting every trigger event.
    pub fn step_n(&mut self, n: usize) -> Vec<(BallId, TriggerEvent)> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(self.step());
        }
        events
    }

    /// Re-arm every ball's triggers, clear hole and ball flags and put
    /// every ball back on its spawn point.
    pub fn reset(&mut self) {
        self.armed = LevelColliderBuilder::new(&self.level, &self.materials.surfaces).triggers();
        self.holes = self.level.holes();
        for slot in &mut self.balls {
            slot.respawn(&self.armed);
        }
        self.forces.set_tilt(Vec2::ZERO);
        self.tick = 0;
        debug!(balls = self.balls.len(), holes = self.holes.len(), "level reset");
    }

    /// Swap in a new level, rebuilding colliders for every ball radius in
    /// use, and reset.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
        self.colliders.clear();
        let radii: Vec<f64> = self.balls.iter().map(|b| b.state.radius).collect();
        for radius in radii {
            self.colliders_for_radius(radius);
        }
        self.reset();
    }

    fn slot(&self, id: BallId) -> Result<&BallSlot, SimulationError> {
        self.balls.get(id.0).ok_or(SimulationError::UnknownBall(id.0))
    }

    fn slot_mut(&mut self, id: BallId) -> Result<&mut BallSlot, SimulationError> {
        self.balls
            .get_mut(id.0)
            .ok_or(SimulationError::UnknownBall(id.0))
    }

    pub fn ball(&self, id: BallId) -> Result<&BallState, SimulationError> {
        Ok(&self.slot(id)?.state)
    }

    /// Report of the ball's last resolved tick.
    pub fn last_report(&self, id: BallId) -> Result<Option<&ResolutionReport>, SimulationError> {
        Ok(self.slot(id)?.last_report.as_ref())
    }

    pub fn balls(&self) -> impl Iterator<Item = (BallId, &BallState)> {
        self.balls
            .iter()
            .enumerate()
            .map(|(i, slot)| (BallId(i), &slot.state))
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    /// The ball's own triggers, with the ones it already fired disarmed.
    pub fn triggers(&self, id: BallId) -> Result<&TriggerSet, SimulationError> {
        Ok(&self.slot(id)?.triggers)
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn materials(&self) -> &Materials {
        &self.materials
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// True once every goal hole has been reached. A level without goal
    /// holes is never won.
    pub fn all_goals_reached(&self) -> bool {
        let mut goals = self.holes.iter().filter(|h| h.is_goal()).peekable();
        goals.peek().is_some() && goals.all(|h| h.reached_goal)
    }

    /// The animation layer picked up a requested explosion. Returns whether
    /// one was pending.
    pub fn begin_explosion(&mut self, id: BallId) -> Result<bool, SimulationError> {
        let state = &mut self.slot_mut(id)?.state;
        if state.explosion != ExplosionState::Requested {
            return Ok(false);
        }
        state.explosion = ExplosionState::Playing;
        Ok(true)
    }

    /// The explosion animation ended: the ball is gone.
    pub fn finish_explosion(&mut self, id: BallId) -> Result<bool, SimulationError> {
        let state = &mut self.slot_mut(id)?.state;
        if state.explosion != ExplosionState::Playing {
            return Ok(false);
        }
        state.explosion = ExplosionState::Idle;
        state.dead = true;
        info!(ball = id.0, "ball exploded");
        Ok(true)
    }
}

// =============================================================================
// Tests
// =============================================================================
