//! Bouncer Core Library
//!
//! Deterministic 2-D block toy: blocks fall under a gravity field, bounce off
//! the playfield and each other, split into fragments on hard impacts, and a
//! drag pointer pulls new blocks out of the latest one.
//!
//! [`Simulation`] is the entry point. Hosts push [`InputEvent`]s into its
//! [`InputQueue`] from any thread and call [`Simulation::tick`] from one loop.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod collision;
pub mod config;
pub mod constraint;
pub mod drag;
pub mod input;
pub mod orientation;
pub mod physics;
pub mod render;
pub mod simulation;
pub mod spawn;

pub use body::{Aabb, Body, BodyError, BodyId, BodyKind, BodySpec, Color, Shape};
pub use collision::{CollisionResolver, Contact, ResolveReport, Split};
pub use config::{BlockShape, DEFAULT_DT, SimConfig};
pub use constraint::{Constraint, ConstraintKind};
pub use drag::{DragController, DragState};
pub use input::{InputEvent, InputQueue};
pub use orientation::{InterfaceOrientation, gravity_from_accelerometer};
pub use physics::PhysicsWorld;
pub use render::{BodyView, FrameInfo, RenderSink};
pub use simulation::{SimPhase, Simulation, TickReport};
pub use spawn::SpawnManager;
