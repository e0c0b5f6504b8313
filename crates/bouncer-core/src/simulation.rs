//! The tick loop tying input, integration and collision resolution together.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::body::{BodyError, BodyId};
use crate::collision::{CollisionResolver, ResolveReport};
use crate::config::SimConfig;
use crate::constraint::ConstraintKind;
use crate::drag::{DragController, DragState};
use crate::input::{InputEvent, InputQueue};
use crate::orientation::InterfaceOrientation;
use crate::physics::PhysicsWorld;
use crate::render::{BodyView, FrameInfo, RenderSink};
use crate::spawn::SpawnManager;

/// Coarse state of the whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// Nothing has been spawned yet (or everything was destroyed).
    NoBodies,
    /// The first block is resting on its anchor.
    OneBodyAnchored,
    /// No pointer is down.
    Idle { bodies: usize },
    /// A pointer is dragging a block.
    Dragging { bodies: usize },
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    pub time: f64,
    /// Blocks spawned by drag input during this tick.
    pub spawned: Vec<BodyId>,
    pub collisions: ResolveReport,
}

/// Owns every component and is the only mutator of the body set.
pub struct Simulation {
    config: SimConfig,
    world: PhysicsWorld,
    resolver: CollisionResolver,
    drag: DragController,
    spawner: SpawnManager,
    input: InputQueue,
    rng: ChaCha8Rng,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("drag", &self.drag.state())
            .field("pending_input", &self.input.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Builds an empty simulation. Fails if the configured playfield or
    /// block shape is degenerate.
    pub fn new(config: SimConfig) -> Result<Self, BodyError> {
        config.validate()?;
        Ok(Self {
            world: PhysicsWorld::new(&config),
            resolver: CollisionResolver::new(&config),
            drag: DragController::new(&config),
            spawner: SpawnManager::new(&config),
            input: InputQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    /// Spawns the anchored first block if the world is empty.
    pub fn start(&mut self) -> Result<Option<BodyId>, BodyError> {
        self.spawner.start(&mut self.world, &mut self.rng)
    }

    /// Handle for producers on other threads.
    pub fn input(&self) -> InputQueue {
        self.input.clone()
    }

    /// Runs one tick: apply queued input, integrate, resolve collisions.
    ///
    /// A non-positive or non-finite `dt` still applies input but does not
    /// advance the world.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        for event in self.input.drain() {
            if let Some(id) = self.apply(event) {
                report.spawned.push(id);
            }
        }

        if dt.is_finite() && dt > 0.0 {
            self.world.step(dt);
            report.collisions = self.resolver.resolve(&mut self.world, &mut self.rng);
            self.promote_dragged();
        } else {
            tracing::trace!("[simulation] skipped step with dt {}", dt);
        }

        report.frame = self.world.current_frame();
        report.time = self.world.time();
        report
    }

    /// Hands the chain to the dragged block when a collision consumed the
    /// latest one.
    fn promote_dragged(&mut self) {
        if self.spawner.latest(&self.world).is_some() {
            return;
        }
        if let Some(id) = self.drag.dragged() {
            self.spawner.adopt(&mut self.world, id);
        }
    }

    /// Queues a raw accelerometer sample, scaled by the configured
    /// `accelerometer_scale`.
    pub fn push_accelerometer(&self, accel: Vec2, orientation: InterfaceOrientation) {
        self.input
            .push_accelerometer(accel, orientation, self.config.accelerometer_scale);
    }

    /// Applies one event immediately. Returns a block spawned by the event.
    pub fn apply(&mut self, event: InputEvent) -> Option<BodyId> {
        match event {
            InputEvent::ContactBegan(point) => {
                self.drag.contact_began(&mut self.world, &mut self.spawner, point);
                None
            }
            InputEvent::ContactMoved(point) => {
                match self
                    .drag
                    .contact_moved(&mut self.world, &mut self.spawner, point, &mut self.rng)
                {
                    Ok(spawned) => spawned,
                    Err(err) => {
                        tracing::warn!("[simulation] spawn failed: {}", err);
                        None
                    }
                }
            }
            InputEvent::ContactEnded => {
                self.drag.contact_ended(&mut self.world);
                None
            }
            InputEvent::Gravity(gravity) => {
                self.world.set_gravity(gravity);
                None
            }
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.world.set_gravity(gravity);
    }

    pub fn phase(&self) -> SimPhase {
        let bodies = self.world.len();
        if bodies == 0 {
            return SimPhase::NoBodies;
        }
        match self.drag.state() {
            DragState::Dragging { .. } => SimPhase::Dragging { bodies },
            DragState::Idle
                if bodies == 1 && self.world.constraint(ConstraintKind::RestAnchor).is_some() =>
            {
                SimPhase::OneBodyAnchored
            }
            DragState::Idle => SimPhase::Idle { bodies },
        }
    }

    /// Current body set as render records, in id order.
    pub fn views(&self) -> Vec<BodyView> {
        self.world.bodies().map(BodyView::from).collect()
    }

    pub fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            frame: self.world.current_frame(),
            time: self.world.time(),
        }
    }

    /// Hands the current body set to `sink`.
    pub fn present(&self, sink: &mut impl RenderSink) {
        sink.present(&self.frame_info(), &self.views());
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn spawner(&self) -> &SpawnManager {
        &self.spawner
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
