//! Simulation tuning parameters.
//!
//! Every constant the core relies on lives in [`SimConfig`]. A JSON document
//! may override any subset of fields.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body::{BodyError, Shape};

/// Fixed timestep used by the headless runner (60Hz).
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Which shape newly spawned blocks take.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockShape {
    #[default]
    Rectangle,
    Circle,
}

/// Tunable parameters for the whole simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Playfield size in points. The boundary spans `[0, w] x [0, h]`.
    pub playfield: [f32; 2],
    /// Restitution applied on boundary and body-body bounces.
    pub elasticity: f32,
    /// Density coefficient. Scales viscous damping and fragment pushes.
    pub density: f32,
    /// Linear damping per unit of density (per second).
    pub damping_per_density: f32,
    /// Acceleration in points/s² for a gravity direction of length 1.
    pub gravity_strength: f32,
    /// Angular frequency (rad/s) of snap springs.
    pub spring_frequency: f32,
    /// Damping ratio of the rest anchor and drag springs.
    pub snap_damping: f32,
    /// Pointer distance from the dragged block's centre that spawns a new block.
    pub spawn_distance: f32,
    /// Speed gap above which the slower block of a pair is destroyed.
    pub speed_differential: f32,
    /// Seconds of immunity after a split, both global and per fragment.
    pub immunity_window: f64,
    /// Size of a freshly spawned block (diameter for circles).
    pub block_size: [f32; 2],
    /// Shape used for spawned blocks.
    pub block_shape: BlockShape,
    /// Centre of the first block and target of the rest anchor.
    pub initial_center: [f32; 2],
    /// Velocity (points/s) imparted per unit of push magnitude.
    pub push_velocity_per_unit: f32,
    /// Symmetric factor applied to raw accelerometer readings.
    pub accelerometer_scale: f32,
    /// Seed for the deterministic RNG.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            playfield: [375.0, 667.0],
            elasticity: 0.5,
            density: 3.0,
            damping_per_density: 0.1,
            gravity_strength: 1000.0,
            spring_frequency: 12.0,
            snap_damping: 0.5,
            spawn_distance: 110.0,
            speed_differential: 250.0,
            immunity_window: 2.0,
            block_size: [60.0, 60.0],
            block_shape: BlockShape::Rectangle,
            initial_center: [75.0, 80.0],
            push_velocity_per_unit: 20.0,
            accelerometer_scale: 0.2,
            seed: 12345,
        }
    }
}

impl SimConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks that the playfield and default block are non-degenerate.
    pub fn validate(&self) -> Result<(), BodyError> {
        let [w, h] = self.playfield;
        if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
            return Err(BodyError::InvalidSpec(Shape::Rectangle {
                width: w,
                height: h,
            }));
        }
        self.block().validate()
    }

    /// Shape of a freshly spawned block.
    pub fn block(&self) -> Shape {
        let [w, h] = self.block_size;
        match self.block_shape {
            BlockShape::Rectangle => Shape::Rectangle {
                width: w,
                height: h,
            },
            BlockShape::Circle => Shape::Circle { radius: w / 2.0 },
        }
    }

    pub fn playfield_size(&self) -> Vec2 {
        Vec2::from(self.playfield)
    }

    pub fn initial_center(&self) -> Vec2 {
        Vec2::from(self.initial_center)
    }

    /// Linear damping rate derived from the density coefficient.
    pub fn linear_damping(&self) -> f32 {
        self.density * self.damping_per_density
    }
}
