//! Block creation and the rest anchor of the first block.

use glam::Vec2;
use rand::Rng;

use crate::body::{BodyError, BodyId, BodySpec, Color, Shape};
use crate::config::SimConfig;
use crate::constraint::{Constraint, ConstraintKind};
use crate::physics::PhysicsWorld;

/// Creates blocks and tracks which one is the latest of the drag chain.
#[derive(Debug, Clone)]
pub struct SpawnManager {
    block: Shape,
    initial_center: Vec2,
    snap_damping: f32,
    latest: Option<BodyId>,
    anchor_released: bool,
}

impl Default for SpawnManager {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl SpawnManager {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            block: config.block(),
            initial_center: config.initial_center(),
            snap_damping: config.snap_damping,
            latest: None,
            anchor_released: false,
        }
    }

    /// Spawns the first block and anchors it to the initial centre.
    ///
    /// Does nothing if the world already has bodies. The anchor is only
    /// attached while it has never been released.
    pub fn start(&mut self, world: &mut PhysicsWorld, rng: &mut impl Rng) -> Result<Option<BodyId>, BodyError> {
        if !world.is_empty() {
            return Ok(None);
        }
        let id = self.spawn_at(world, self.initial_center, rng)?;
        if !self.anchor_released {
            world.set_constraint(Constraint::new(
                ConstraintKind::RestAnchor,
                id,
                self.initial_center,
                self.snap_damping,
            ));
        }
        tracing::info!("[spawn] started with block {} at {}", id, self.initial_center);
        Ok(Some(id))
    }

    /// Creates a default block centred at `location` and makes it the only
    /// latest body.
    pub fn spawn_at(&mut self, world: &mut PhysicsWorld, location: Vec2, rng: &mut impl Rng) -> Result<BodyId, BodyError> {
        let spec = BodySpec::block(self.block, location)
            .with_color(Color::random(rng))
            .latest(true);
        let id = world.add_body(spec)?;

        for other in world.ids() {
            if other == id {
                continue;
            }
            if let Some(body) = world.body_mut(other) {
                body.is_latest = false;
            }
        }
        self.latest = Some(id);
        tracing::debug!("[spawn] block {} at {}", id, location);
        Ok(id)
    }

    /// Makes an existing block the only latest body, restarting a chain whose
    /// latest block was destroyed. Returns false for fragments and unknown ids.
    pub fn adopt(&mut self, world: &mut PhysicsWorld, id: BodyId) -> bool {
        if !world.body(id).is_some_and(|b| b.is_block()) {
            return false;
        }
        for other in world.ids() {
            if let Some(body) = world.body_mut(other) {
                body.is_latest = other == id;
            }
        }
        self.latest = Some(id);
        tracing::info!("[spawn] block {} restarts the chain", id);
        true
    }

    /// Drops the rest anchor for good. Returns true if one was attached.
    pub fn release_anchor(&mut self, world: &mut PhysicsWorld) -> bool {
        self.anchor_released = true;
        let released = world.remove_constraint(ConstraintKind::RestAnchor).is_some();
        if released {
            tracing::info!("[spawn] rest anchor released");
        }
        released
    }

    /// Id of the most recently spawned block, if it is still alive.
    pub fn latest(&self, world: &PhysicsWorld) -> Option<BodyId> {
        self.latest.filter(|id| world.body(*id).is_some())
    }

    pub fn anchor_released(&self) -> bool {
        self.anchor_released
    }
}
