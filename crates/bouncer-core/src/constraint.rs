//! Snap springs that pull a body toward a point.

use glam::Vec2;

use crate::body::BodyId;

/// The two constraint slots. At most one of each exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Holds the very first block near its spawn point until released.
    RestAnchor,
    /// Follows the active pointer.
    Drag,
}

/// Damped spring attached to a body by id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub body: BodyId,
    pub anchor: Vec2,
    /// Damping ratio: 0 oscillates freely, 1 is critically damped.
    pub damping: f32,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, body: BodyId, anchor: Vec2, damping: f32) -> Self {
        Self {
            kind,
            body,
            anchor,
            damping: damping.clamp(0.0, 1.0),
        }
    }

    /// Spring acceleration `w²(anchor - x) - 2·z·w·v` for angular frequency `w`.
    pub fn acceleration(&self, position: Vec2, velocity: Vec2, frequency: f32) -> Vec2 {
        let stiffness = frequency * frequency;
        let friction = 2.0 * self.damping * frequency;
        (self.anchor - position) * stiffness - velocity * friction
    }
}
