//! Physics world: body table, gravity, boundary and spring integration.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use glam::Vec2;

use crate::body::{Body, BodyError, BodyId, BodySpec};
use crate::config::SimConfig;
use crate::constraint::{Constraint, ConstraintKind};

/// Default gravity direction (straight down, unit length).
pub fn default_gravity() -> Vec2 {
    Vec2::new(0.0, 1.0)
}

/// Integration parameters copied out of [`SimConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldParams {
    pub playfield: Vec2,
    pub elasticity: f32,
    pub linear_damping: f32,
    pub gravity_strength: f32,
    pub spring_frequency: f32,
    pub immunity_window: f64,
}

impl From<&SimConfig> for WorldParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            playfield: config.playfield_size(),
            elasticity: config.elasticity,
            linear_damping: config.linear_damping(),
            gravity_strength: config.gravity_strength,
            spring_frequency: config.spring_frequency,
            immunity_window: config.immunity_window,
        }
    }
}

/// Authoritative owner of every live body and constraint.
pub struct PhysicsWorld {
    bodies: BTreeMap<BodyId, Body>,
    constraints: Vec<Constraint>,
    params: WorldParams,
    gravity: Vec2,
    next_id: BodyId,
    time: f64,
    frame: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("frame", &self.frame)
            .field("time", &self.time)
            .field("body_count", &self.bodies.len())
            .field("constraint_count", &self.constraints.len())
            .field("gravity", &self.gravity)
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Creates an empty world with default gravity.
    pub fn new(config: &SimConfig) -> Self {
        Self::with_params(WorldParams::from(config))
    }

    fn with_params(params: WorldParams) -> Self {
        Self {
            bodies: BTreeMap::new(),
            constraints: Vec::new(),
            params,
            gravity: default_gravity(),
            next_id: 0,
            time: 0.0,
            frame: 0,
        }
    }

    /// Inserts a body and returns its fresh id.
    pub fn add_body(&mut self, spec: BodySpec) -> Result<BodyId, BodyError> {
        spec.shape.validate()?;
        let id = self.next_id;
        self.next_id += 1;
        let body = Body::from_spec(id, spec, self.time, self.params.immunity_window);
        tracing::trace!("[world] add body {} ({:?}) at {}", id, body.kind, body.position);
        self.bodies.insert(id, body);
        Ok(id)
    }

    /// Removes a body and every constraint attached to it.
    /// Unknown ids are ignored.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.remove(&id)?;
        let before = self.constraints.len();
        self.constraints.retain(|c| c.body != id);
        if self.constraints.len() != before {
            tracing::debug!("[world] detached constraints of removed body {}", id);
        }
        Some(body)
    }

    /// Replaces the gravity direction. Applied from the next step.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = if gravity.is_finite() { gravity } else { Vec2::ZERO };
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Installs a constraint, replacing any existing one of the same kind.
    /// Returns false (and installs nothing) if the target body is gone.
    pub fn set_constraint(&mut self, constraint: Constraint) -> bool {
        self.remove_constraint(constraint.kind);
        if !self.bodies.contains_key(&constraint.body) {
            tracing::trace!("[world] constraint target {} missing", constraint.body);
            return false;
        }
        self.constraints.push(constraint);
        true
    }

    pub fn remove_constraint(&mut self, kind: ConstraintKind) -> Option<Constraint> {
        let pos = self.constraints.iter().position(|c| c.kind == kind)?;
        Some(self.constraints.remove(pos))
    }

    pub fn constraint(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.kind == kind)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Semi-implicit Euler: velocity first (gravity, springs, viscous
    /// damping), then position, then boundary reflection. Fragment immunity
    /// deadlines are evaluated against the advanced clock.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            tracing::trace!("[world] ignoring non-positive dt {}", dt);
            return;
        }
        let params = self.params;
        let gravity = self.gravity * params.gravity_strength;
        let damping = 1.0 / (1.0 + dt * params.linear_damping);

        for body in self.bodies.values_mut() {
            let mut accel = gravity;
            for c in self.constraints.iter().filter(|c| c.body == body.id) {
                accel += c.acceleration(body.position, body.velocity, params.spring_frequency);
            }
            body.velocity += accel * dt;
            body.velocity *= damping;
            body.position += body.velocity * dt;
            if reflect_from_boundary(body, params.playfield, params.elasticity) {
                tracing::trace!("[world] body {} bounced off the boundary", body.id);
            }
        }

        self.time += f64::from(dt);
        self.frame += 1;

        let now = self.time;
        for body in self.bodies.values_mut() {
            if body.expire_immunity(now) {
                tracing::debug!("[world] fragment {} no longer immune", body.id);
            }
        }
    }

    /// Advances the simulation by `n` steps of `dt`.
    pub fn step_n(&mut self, n: u32, dt: f32) {
        for _ in 0..n {
            self.step(dt);
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    /// Bodies in ascending id order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn ids(&self) -> Vec<BodyId> {
        self.bodies.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Topmost (most recently created) block containing `point`.
    pub fn block_at(&self, point: Vec2) -> Option<BodyId> {
        self.bodies
            .values()
            .rev()
            .find(|b| b.is_block() && b.shape.contains(b.position, point))
            .map(|b| b.id)
    }

    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    /// Simulation clock in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Deterministic hash of ids, positions and velocities.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.frame.hash(&mut hasher);
        for body in self.bodies.values() {
            body.id.hash(&mut hasher);
            for v in [body.position.x, body.position.y, body.velocity.x, body.velocity.y] {
                v.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

/// Pushes a body back inside the playfield, reflecting the normal velocity
/// component with `elasticity`. Returns true if any edge was hit.
fn reflect_from_boundary(body: &mut Body, playfield: Vec2, elasticity: f32) -> bool {
    let half = body.shape.half_extents();
    let mut hit = false;

    if body.position.x - half.x < 0.0 {
        body.position.x = half.x;
        if body.velocity.x < 0.0 {
            body.velocity.x = -body.velocity.x * elasticity;
        }
        hit = true;
    } else if body.position.x + half.x > playfield.x {
        body.position.x = playfield.x - half.x;
        if body.velocity.x > 0.0 {
            body.velocity.x = -body.velocity.x * elasticity;
        }
        hit = true;
    }

    if body.position.y - half.y < 0.0 {
        body.position.y = half.y;
        if body.velocity.y < 0.0 {
            body.velocity.y = -body.velocity.y * elasticity;
        }
        hit = true;
    } else if body.position.y + half.y > playfield.y {
        body.position.y = playfield.y - half.y;
        if body.velocity.y > 0.0 {
            body.velocity.y = -body.velocity.y * elasticity;
        }
        hit = true;
    }

    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Shape;

    const SQUARE: Shape = Shape::Rectangle {
        width: 60.0,
        height: 60.0,
    };

    fn undamped() -> SimConfig {
        SimConfig {
            damping_per_density: 0.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_world_creation() {
        let world = PhysicsWorld::default();
        assert_eq!(world.current_frame(), 0);
        assert!(world.is_empty());
        assert_eq!(world.gravity(), default_gravity());
    }

    #[test]
    fn test_add_body_rejects_invalid_spec() {
        let mut world = PhysicsWorld::default();
        let bad = BodySpec::block(Shape::Rectangle { width: 0.0, height: 10.0 }, Vec2::ZERO);
        assert!(matches!(world.add_body(bad), Err(BodyError::InvalidSpec(_))));
        assert!(world.is_empty());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut world = PhysicsWorld::default();
        let a = world.add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0))).unwrap();
        world.remove_body(a);
        let b = world.add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_body_detaches_constraints() {
        let mut world = PhysicsWorld::default();
        let id = world.add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0))).unwrap();
        assert!(world.set_constraint(Constraint::new(
            ConstraintKind::Drag,
            id,
            Vec2::new(150.0, 150.0),
            0.5
        )));
        assert!(world.remove_body(id).is_some());
        assert!(world.constraints().is_empty());

        // absent id is a no-op
        assert!(world.remove_body(id).is_none());
        assert!(world.remove_body(9999).is_none());
    }

    #[test]
    fn test_set_constraint_replaces_same_kind() {
        let mut world = PhysicsWorld::default();
        let id = world.add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0))).unwrap();
        for x in [110.0, 120.0, 130.0] {
            world.set_constraint(Constraint::new(ConstraintKind::Drag, id, Vec2::new(x, 0.0), 0.5));
        }
        assert_eq!(world.constraints().len(), 1);
        assert_eq!(world.constraint(ConstraintKind::Drag).unwrap().anchor.x, 130.0);

        assert!(!world.set_constraint(Constraint::new(ConstraintKind::RestAnchor, 42, Vec2::ZERO, 0.5)));
        assert!(world.constraint(ConstraintKind::RestAnchor).is_none());
    }

    #[test]
    fn test_gravity_accelerates_bodies() {
        let mut world = PhysicsWorld::new(&undamped());
        let id = world.add_body(BodySpec::block(SQUARE, Vec2::new(150.0, 100.0))).unwrap();
        world.step(0.25);
        let body = world.body(id).unwrap();
        assert_eq!(body.velocity, Vec2::new(0.0, 250.0));
        assert_eq!(body.position, Vec2::new(150.0, 162.5));
    }

    #[test]
    fn test_zero_gravity_is_valid() {
        let mut world = PhysicsWorld::new(&undamped());
        world.set_gravity(Vec2::ZERO);
        let id = world.add_body(BodySpec::block(SQUARE, Vec2::new(150.0, 100.0))).unwrap();
        world.step_n(4, 0.25);
        assert_eq!(world.body(id).unwrap().position, Vec2::new(150.0, 100.0));
        assert_eq!(world.current_frame(), 4);
    }

    #[test]
    fn test_viscous_damping_slows_bodies() {
        let mut world = PhysicsWorld::default();
        world.set_gravity(Vec2::ZERO);
        let id = world
            .add_body(BodySpec::block(SQUARE, Vec2::new(150.0, 300.0)).with_velocity(Vec2::new(100.0, 0.0)))
            .unwrap();
        world.step(0.25);
        let vx = world.body(id).unwrap().velocity.x;
        assert!(vx < 100.0 && vx > 90.0);
    }

    #[test]
    fn test_boundary_reflects_normal_velocity() {
        let mut world = PhysicsWorld::new(&undamped());
        world.set_gravity(Vec2::ZERO);
        let id = world
            .add_body(
                BodySpec::block(SQUARE, Vec2::new(340.0, 300.0)).with_velocity(Vec2::new(100.0, 20.0)),
            )
            .unwrap();
        world.step(0.25);
        let body = world.body(id).unwrap();
        assert_eq!(body.velocity.x, -50.0);
        assert_eq!(body.velocity.y, 20.0);
        assert_eq!(body.position.x, 375.0 - 30.0);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_floor_bounce_and_never_destroyed() {
        let mut world = PhysicsWorld::default();
        let id = world.add_body(BodySpec::block(SQUARE, Vec2::new(150.0, 100.0))).unwrap();
        for _ in 0..600 {
            world.step(1.0 / 64.0);
            let body = world.body(id).expect("boundary never destroys");
            assert!(body.aabb().max.y <= 667.0);
        }
    }

    #[test]
    fn test_spring_pulls_toward_anchor() {
        let mut world = PhysicsWorld::new(&undamped());
        world.set_gravity(Vec2::ZERO);
        let id = world.add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0))).unwrap();
        world.set_constraint(Constraint::new(ConstraintKind::Drag, id, Vec2::new(200.0, 100.0), 0.5));
        for _ in 0..240 {
            world.step(1.0 / 64.0);
        }
        let pos = world.body(id).unwrap().position;
        assert!((pos.x - 200.0).abs() < 1.0, "settled at {pos}");
    }

    #[test]
    fn test_deterministic_simulation() {
        let build = || {
            let mut world = PhysicsWorld::default();
            world
                .add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0)).with_velocity(Vec2::new(40.0, -10.0)))
                .unwrap();
            world.step_n(100, 1.0 / 60.0);
            world
        };
        assert_eq!(build().compute_hash(), build().compute_hash());
    }

    #[test]
    fn test_block_at_prefers_newest() {
        let mut world = PhysicsWorld::default();
        let a = world.add_body(BodySpec::block(SQUARE, Vec2::new(100.0, 100.0))).unwrap();
        let b = world.add_body(BodySpec::block(SQUARE, Vec2::new(110.0, 100.0))).unwrap();
        assert_eq!(world.block_at(Vec2::new(105.0, 100.0)), Some(b));
        assert_eq!(world.block_at(Vec2::new(75.0, 100.0)), Some(a));
        assert_eq!(world.block_at(Vec2::new(300.0, 300.0)), None);
    }

    #[test]
    fn test_non_positive_dt_is_ignored() {
        let mut world = PhysicsWorld::default();
        world.step(0.0);
        world.step(-1.0);
        world.step(f32::NAN);
        assert_eq!(world.current_frame(), 0);
        assert_eq!(world.time(), 0.0);
    }
}
