//! Single-pointer drag handling.
//!
//! A contact on a block installs a drag spring anchored at the pointer. Each
//! move replaces the spring. Pulling the latest block further than the spawn
//! distance hands the drag over to a freshly spawned block.

use glam::Vec2;
use rand::Rng;

use crate::body::{BodyError, BodyId};
use crate::config::SimConfig;
use crate::constraint::{Constraint, ConstraintKind};
use crate::physics::PhysicsWorld;
use crate::spawn::SpawnManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        body: BodyId,
    },
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    spawn_distance: f32,
    damping: f32,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl DragController {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            state: DragState::Idle,
            spawn_distance: config.spawn_distance,
            damping: config.snap_damping,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Body currently being dragged.
    pub fn dragged(&self) -> Option<BodyId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { body } => Some(body),
        }
    }

    /// Starts dragging the block under `point`.
    ///
    /// A second contact while already dragging is ignored, as is a contact
    /// that misses every block. Grabbing a block while no latest block is
    /// alive makes the grabbed block latest.
    pub fn contact_began(
        &mut self,
        world: &mut PhysicsWorld,
        spawner: &mut SpawnManager,
        point: Vec2,
    ) -> Option<BodyId> {
        if let DragState::Dragging { body } = self.state {
            tracing::trace!("[drag] ignoring second contact while dragging {}", body);
            return None;
        }
        let id = world.block_at(point)?;
        if spawner.latest(world).is_none() {
            spawner.adopt(world, id);
        }
        world.set_constraint(Constraint::new(ConstraintKind::Drag, id, point, self.damping));
        self.state = DragState::Dragging { body: id };
        tracing::debug!("[drag] grabbed block {} at {}", id, point);
        Some(id)
    }

    /// Moves the drag anchor to `point`, spawning a new block when the latest
    /// block is pulled past the spawn distance. Returns the spawned id.
    pub fn contact_moved(
        &mut self,
        world: &mut PhysicsWorld,
        spawner: &mut SpawnManager,
        point: Vec2,
        rng: &mut impl Rng,
    ) -> Result<Option<BodyId>, BodyError> {
        let DragState::Dragging { body } = self.state else {
            tracing::trace!("[drag] move without an active drag");
            return Ok(None);
        };

        world.remove_constraint(ConstraintKind::Drag);
        let Some(dragged) = world.body(body).cloned() else {
            tracing::debug!("[drag] dragged block {} is gone", body);
            self.state = DragState::Idle;
            return Ok(None);
        };
        world.set_constraint(Constraint::new(ConstraintKind::Drag, body, point, self.damping));

        if !dragged.is_latest || dragged.position.distance(point) <= self.spawn_distance {
            return Ok(None);
        }

        let spawned = spawner.spawn_at(world, dragged.position, rng)?;
        if let Some(old) = world.body_mut(body) {
            old.is_latest = false;
        }
        spawner.release_anchor(world);
        world.set_constraint(Constraint::new(ConstraintKind::Drag, spawned, point, self.damping));
        self.state = DragState::Dragging { body: spawned };
        tracing::info!("[drag] block {} pulled out block {}", body, spawned);
        Ok(Some(spawned))
    }

    /// Releases the drag. The body keeps whatever velocity it has.
    pub fn contact_ended(&mut self, world: &mut PhysicsWorld) {
        if let DragState::Dragging { body } = self.state {
            world.remove_constraint(ConstraintKind::Drag);
            tracing::debug!("[drag] released block {}", body);
        }
        self.state = DragState::Idle;
    }
}
