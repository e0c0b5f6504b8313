//! Rigid bodies: shape, kinematic state and lifecycle flags.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Unique identifier for a body. Never reused within a process.
pub type BodyId = u32;

/// Error returned when a body cannot be created.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BodyError {
    #[error("invalid body spec: dimensions must be positive and finite, got {0:?}")]
    InvalidSpec(Shape),
}

/// RGBA color tag. Carried through splits, otherwise ignored by the core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Opaque color with each channel drawn from 200 evenly spaced levels.
    pub fn random(rng: &mut impl Rng) -> Self {
        let mut channel = || {
            let level: u32 = rng.random_range(0..200);
            u8::try_from(level * 255 / 200).unwrap_or(u8::MAX)
        };
        Self::rgb(channel(), channel(), channel())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Geometric shape of a body, centred on its position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
}

impl Shape {
    /// Rejects non-positive or non-finite dimensions.
    pub fn validate(&self) -> Result<(), BodyError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        let valid = match *self {
            Self::Rectangle { width, height } => ok(width) && ok(height),
            Self::Circle { radius } => ok(radius),
        };
        if valid { Ok(()) } else { Err(BodyError::InvalidSpec(*self)) }
    }

    /// Half of the bounding box size.
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Self::Rectangle { width, height } => Vec2::new(width, height) / 2.0,
            Self::Circle { radius } => Vec2::splat(radius),
        }
    }

    /// Bounding box size.
    pub fn size(&self) -> Vec2 {
        self.half_extents() * 2.0
    }

    pub fn area(&self) -> f32 {
        match *self {
            Self::Rectangle { width, height } => width * height,
            Self::Circle { radius } => std::f32::consts::PI * radius * radius,
        }
    }

    /// Same shape kind with every linear dimension halved.
    pub fn halved(&self) -> Self {
        match *self {
            Self::Rectangle { width, height } => Self::Rectangle {
                width: width / 2.0,
                height: height / 2.0,
            },
            Self::Circle { radius } => Self::Circle {
                radius: radius / 2.0,
            },
        }
    }

    /// Whether `point` lies inside the shape centred at `center`.
    pub fn contains(&self, center: Vec2, point: Vec2) -> bool {
        let d = point - center;
        match *self {
            Self::Rectangle { .. } => {
                let half = self.half_extents();
                d.x.abs() <= half.x && d.y.abs() <= half.y
            }
            Self::Circle { radius } => d.length_squared() <= radius * radius,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Role a body plays in the collision rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Spawned by the spawn manager. Draggable and splittable.
    Block,
    /// One of the four pieces left behind by a split.
    Fragment,
}

/// Everything needed to insert a body into the world.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    pub shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub kind: BodyKind,
    pub latest: bool,
}

impl BodySpec {
    /// A resting, non-latest block.
    pub fn block(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            velocity: Vec2::ZERO,
            color: Color::default(),
            kind: BodyKind::Block,
            latest: false,
        }
    }

    /// A split fragment. Fragments are never latest.
    pub fn fragment(shape: Shape, position: Vec2, color: Color) -> Self {
        Self {
            kind: BodyKind::Fragment,
            color,
            ..Self::block(shape, position)
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest && self.kind == BodyKind::Block;
        self
    }
}

/// A live body owned by the physics world.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub shape: Shape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub kind: BodyKind,
    pub is_latest: bool,
    pub is_temporarily_immune: bool,
    /// Simulation time at which `is_temporarily_immune` clears.
    pub immune_until: Option<f64>,
    pub created_at: f64,
}

impl Body {
    pub(crate) fn from_spec(id: BodyId, spec: BodySpec, now: f64, immunity_window: f64) -> Self {
        let immune_until = (spec.kind == BodyKind::Fragment).then_some(now + immunity_window);
        Self {
            id,
            shape: spec.shape,
            position: spec.position,
            velocity: spec.velocity,
            color: spec.color,
            kind: spec.kind,
            is_latest: spec.latest,
            is_temporarily_immune: immune_until.is_some(),
            immune_until,
            created_at: now,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.shape.half_extents())
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Mass proxy used to share bounce impulses.
    pub fn mass(&self) -> f32 {
        self.shape.area()
    }

    pub fn is_block(&self) -> bool {
        self.kind == BodyKind::Block
    }

    /// Clears the fragment immunity once `now` reaches its deadline.
    /// Returns true on the single transition.
    pub(crate) fn expire_immunity(&mut self, now: f64) -> bool {
        match self.immune_until {
            Some(until) if self.is_temporarily_immune && now >= until => {
                self.is_temporarily_immune = false;
                true
            }
            _ => false,
        }
    }

    /// Shapes and centres of the four quadrant fragments, ordered top-left,
    /// top-right, bottom-left, bottom-right.
    pub fn quadrants(&self) -> [(Shape, Vec2); 4] {
        let piece = self.shape.halved();
        let q = self.shape.half_extents() / 2.0;
        let c = self.position;
        [
            (piece, Vec2::new(c.x - q.x, c.y - q.y)),
            (piece, Vec2::new(c.x + q.x, c.y - q.y)),
            (piece, Vec2::new(c.x - q.x, c.y + q.y)),
            (piece, Vec2::new(c.x + q.x, c.y + q.y)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn block_at(x: f32, y: f32) -> Body {
        let spec = BodySpec::block(
            Shape::Rectangle {
                width: 60.0,
                height: 60.0,
            },
            Vec2::new(x, y),
        );
        Body::from_spec(0, spec, 0.0, 2.0)
    }

    #[test]
    fn test_shape_validation() {
        assert!(Shape::Rectangle { width: 1.0, height: 1.0 }.validate().is_ok());
        assert!(Shape::Rectangle { width: 0.0, height: 1.0 }.validate().is_err());
        assert!(Shape::Rectangle { width: 3.0, height: -1.0 }.validate().is_err());
        assert!(Shape::Circle { radius: f32::NAN }.validate().is_err());
        assert!(Shape::Circle { radius: 0.5 }.validate().is_ok());
    }

    #[test]
    fn test_quadrants_tile_bounding_box() {
        let body = block_at(130.0, 230.0);
        let whole = body.aabb();
        let pieces = body.quadrants();

        let boxes: Vec<Aabb> = pieces
            .iter()
            .map(|(shape, center)| Aabb::from_center(*center, shape.half_extents()))
            .collect();

        assert_eq!(boxes[0].min, whole.min);
        assert_eq!(boxes[1].min, Vec2::new(130.0, 200.0));
        assert_eq!(boxes[2].min, Vec2::new(100.0, 230.0));
        assert_eq!(boxes[3].max, whole.max);
        for b in &boxes {
            assert_eq!(b.size(), Vec2::new(30.0, 30.0));
        }

        let total: f32 = boxes.iter().map(|b| b.size().x * b.size().y).sum();
        assert_eq!(total, whole.size().x * whole.size().y);
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_circle_quadrants_halve_radius() {
        let spec = BodySpec::block(Shape::Circle { radius: 30.0 }, Vec2::new(0.0, 0.0));
        let body = Body::from_spec(1, spec, 0.0, 2.0);
        for (shape, center) in body.quadrants() {
            assert_eq!(shape, Shape::Circle { radius: 15.0 });
            assert_eq!(center.abs(), Vec2::splat(15.0));
        }
    }

    #[test]
    fn test_fragment_immunity_starts_and_expires_once() {
        let spec = BodySpec::fragment(Shape::Circle { radius: 5.0 }, Vec2::ZERO, Color::WHITE);
        let mut body = Body::from_spec(3, spec, 1.0, 2.0);
        assert!(body.is_temporarily_immune);
        assert!(!body.expire_immunity(2.5));
        assert!(body.is_temporarily_immune);
        assert!(body.expire_immunity(3.0));
        assert!(!body.is_temporarily_immune);
        assert!(!body.expire_immunity(10.0));
        assert!(!body.is_temporarily_immune);
    }

    #[test]
    fn test_blocks_never_immune_and_fragments_never_latest() {
        let block = block_at(0.0, 0.0);
        assert!(!block.is_temporarily_immune);
        assert!(block.immune_until.is_none());

        let spec = BodySpec::fragment(Shape::Circle { radius: 5.0 }, Vec2::ZERO, Color::WHITE)
            .latest(true);
        assert!(!spec.latest);
    }

    #[test]
    fn test_random_color_is_opaque_and_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let ca = Color::random(&mut a);
        assert_eq!(ca, Color::random(&mut b));
        assert_eq!(ca.a, 255);
        assert!(ca.r < 255 && ca.g < 255 && ca.b < 255);
    }

    #[test]
    fn test_contains_point() {
        let body = block_at(100.0, 100.0);
        assert!(body.shape.contains(body.position, Vec2::new(129.0, 71.0)));
        assert!(!body.shape.contains(body.position, Vec2::new(131.0, 100.0)));
        let circle = Shape::Circle { radius: 10.0 };
        assert!(circle.contains(Vec2::ZERO, Vec2::new(6.0, 8.0)));
        assert!(!circle.contains(Vec2::ZERO, Vec2::new(8.0, 8.0)));
    }
}
