//! Accelerometer to gravity-direction mapping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Interface orientation reported by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    Unknown,
}

/// Turns a raw device acceleration into a gravity direction in screen
/// coordinates (y down). Both axes are scaled by the same `scale`.
/// An unknown orientation yields the zero vector.
pub fn gravity_from_accelerometer(accel: Vec2, orientation: InterfaceOrientation, scale: f32) -> Vec2 {
    let Vec2 { x, y } = accel * scale;
    match orientation {
        InterfaceOrientation::Portrait => Vec2::new(x, -y),
        InterfaceOrientation::PortraitUpsideDown => Vec2::new(-x, y),
        InterfaceOrientation::LandscapeLeft => Vec2::new(y, x),
        InterfaceOrientation::LandscapeRight => Vec2::new(-y, -x),
        InterfaceOrientation::Unknown => Vec2::ZERO,
    }
}
