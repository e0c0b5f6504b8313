//! Per-tick output handed to whatever draws the bodies.

use glam::Vec2;
use serde::Serialize;

use crate::body::{Body, BodyId, BodyKind, Color, Shape};

/// What a renderer needs to draw one body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyView {
    pub id: BodyId,
    pub shape: Shape,
    pub kind: BodyKind,
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub color: Color,
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id,
            shape: body.shape,
            kind: body.kind,
            position: body.position.to_array(),
            size: body.shape.size().to_array(),
            color: body.color,
        }
    }
}

impl BodyView {
    pub fn center(&self) -> Vec2 {
        Vec2::from(self.position)
    }
}

/// Tick metadata accompanying each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameInfo {
    pub frame: u64,
    /// Simulation time in seconds; strictly increasing between frames.
    pub time: f64,
}

/// Consumer of the body set after every tick.
pub trait RenderSink {
    fn present(&mut self, frame: &FrameInfo, bodies: &[BodyView]);
}
