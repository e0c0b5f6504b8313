//! Post-step contact detection and the split/destroy policy.
//!
//! Every tick the resolver takes a snapshot of the body set, finds all
//! overlapping pairs and, for pairs whose contact just began, decides whether
//! one side is destroyed. Destroyed blocks split into four fragments; a
//! destroyed fragment is simply removed. All overlapping pairs then receive an
//! elastic bounce.
//!
//! Destruction rules for a freshly begun contact:
//!
//! | pair                 | outcome                                              |
//! |----------------------|------------------------------------------------------|
//! | latest vs latest     | bounce only                                          |
//! | block vs block       | slower block splits if the speed gap exceeds `Δ`     |
//! | block vs fragment    | fragment removed unless it or the world is immune    |
//! | fragment vs fragment | bounce only                                          |
//!
//! Any split starts a global immunity window during which no destruction
//! happens at all.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use crate::body::{Body, BodyId, BodyKind, BodySpec, Shape};
use crate::config::SimConfig;
use crate::physics::PhysicsWorld;

/// Penetration between two overlapping bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first body to the second.
    pub normal: Vec2,
    pub depth: f32,
}

/// A block that was replaced by four fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub destroyed: BodyId,
    pub fragments: Vec<BodyId>,
}

/// What a resolver pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub splits: Vec<Split>,
    /// Fragments removed without splitting.
    pub removed: Vec<BodyId>,
    /// Number of pairs whose contact began this pass.
    pub contacts_began: usize,
}

impl ResolveReport {
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Survive,
    Split(BodyId),
    Remove(BodyId),
}

/// Collision policy state carried across ticks.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    speed_differential: f32,
    immunity_window: f64,
    elasticity: f32,
    density: f32,
    push_velocity_per_unit: f32,
    global_immunity_until: Option<f64>,
    contacts: BTreeSet<(BodyId, BodyId)>,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl CollisionResolver {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            speed_differential: config.speed_differential,
            immunity_window: config.immunity_window,
            elasticity: config.elasticity,
            density: config.density,
            push_velocity_per_unit: config.push_velocity_per_unit,
            global_immunity_until: None,
            contacts: BTreeSet::new(),
        }
    }

    /// Whether a recent split currently suppresses all destruction.
    pub fn is_globally_immune(&self, now: f64) -> bool {
        self.global_immunity_until.is_some_and(|until| now < until)
    }

    pub fn global_immunity_until(&self) -> Option<f64> {
        self.global_immunity_until
    }

    /// Runs one pass over the post-step body set.
    ///
    /// Pairs are gathered before any mutation, so fragments created during
    /// the pass are only examined on the next call.
    pub fn resolve(&mut self, world: &mut PhysicsWorld, rng: &mut impl Rng) -> ResolveReport {
        let now = world.time();
        if self.global_immunity_until.is_some() && !self.is_globally_immune(now) {
            tracing::debug!("[collision] global immunity expired at {:.2}s", now);
            self.global_immunity_until = None;
        }

        let snapshot: Vec<Body> = world.bodies().cloned().collect();
        let mut pairs = Vec::new();
        for (i, a) in snapshot.iter().enumerate() {
            for b in &snapshot[i + 1..] {
                if detect(a, b).is_some() {
                    pairs.push((a.id, b.id));
                }
            }
        }

        let mut report = ResolveReport::default();
        for &(a_id, b_id) in &pairs {
            let (Some(a), Some(b)) = (world.body(a_id).cloned(), world.body(b_id).cloned()) else {
                tracing::trace!("[collision] skipping stale pair ({}, {})", a_id, b_id);
                continue;
            };

            if !self.contacts.contains(&(a_id, b_id)) {
                report.contacts_began += 1;
                match self.judge(&a, &b, now) {
                    Verdict::Survive => {}
                    Verdict::Split(id) => {
                        self.split(world, id, rng, &mut report);
                        continue;
                    }
                    Verdict::Remove(id) => {
                        tracing::debug!("[collision] fragment {} destroyed", id);
                        world.remove_body(id);
                        report.removed.push(id);
                        continue;
                    }
                }
            }

            if let Some(contact) = detect(&a, &b) {
                bounce(world, &a, &b, contact, self.elasticity);
            }
        }

        self.contacts = pairs
            .into_iter()
            .filter(|(a, b)| world.body(*a).is_some() && world.body(*b).is_some())
            .collect();
        report
    }

    fn judge(&self, a: &Body, b: &Body, now: f64) -> Verdict {
        let globally_immune = self.is_globally_immune(now);
        match (a.kind, b.kind) {
            (BodyKind::Block, BodyKind::Block) => {
                if a.is_latest && b.is_latest {
                    tracing::trace!("[collision] latest pair ({}, {}) bounces", a.id, b.id);
                    return Verdict::Survive;
                }
                let (speed_a, speed_b) = (a.speed(), b.speed());
                let victim = if speed_a > speed_b + self.speed_differential {
                    b.id
                } else if speed_b > speed_a + self.speed_differential {
                    a.id
                } else {
                    return Verdict::Survive;
                };
                if globally_immune {
                    tracing::debug!("[collision] split of {} suppressed by global immunity", victim);
                    return Verdict::Survive;
                }
                Verdict::Split(victim)
            }
            (BodyKind::Block, BodyKind::Fragment) | (BodyKind::Fragment, BodyKind::Block) => {
                let fragment = if a.kind == BodyKind::Fragment { a } else { b };
                if globally_immune || fragment.is_temporarily_immune {
                    Verdict::Survive
                } else {
                    Verdict::Remove(fragment.id)
                }
            }
            (BodyKind::Fragment, BodyKind::Fragment) => Verdict::Survive,
        }
    }

    /// Replaces a block with four pushed fragments and starts global immunity.
    fn split(&mut self, world: &mut PhysicsWorld, id: BodyId, rng: &mut impl Rng, report: &mut ResolveReport) {
        let Some(body) = world.remove_body(id) else {
            return;
        };

        let mut fragments = Vec::with_capacity(4);
        for (shape, center) in body.quadrants() {
            let push = self.random_push(rng);
            let spec = BodySpec::fragment(shape, center, body.color).with_velocity(push);
            match world.add_body(spec) {
                Ok(fragment) => fragments.push(fragment),
                Err(err) => tracing::warn!("[collision] fragment of {} rejected: {}", id, err),
            }
        }

        let now = world.time();
        self.global_immunity_until = Some(now + self.immunity_window);
        tracing::info!(
            "[collision] block {} split into {:?} at {}, immune until {:.2}s",
            id,
            fragments,
            body.position,
            now + self.immunity_window
        );
        report.splits.push(Split {
            destroyed: id,
            fragments,
        });
    }

    /// Instantaneous push: angle uniform in [0, 360) degrees, magnitude
    /// uniform in [0.5, 2.5) times density.
    fn random_push(&self, rng: &mut impl Rng) -> Vec2 {
        let angle: f32 = rng.random_range(0.0..360.0);
        let magnitude = rng.random_range(0.5..2.5_f32) * self.density;
        Vec2::from_angle(angle.to_radians()) * magnitude * self.push_velocity_per_unit
    }
}

/// Overlap test. The normal points from `a` toward `b`.
pub fn detect(a: &Body, b: &Body) -> Option<Contact> {
    match (a.shape, b.shape) {
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
            boxes(a.position, a.shape.half_extents(), b.position, b.shape.half_extents())
        }
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let d = b.position - a.position;
            let reach = ra + rb;
            let dist_sq = d.length_squared();
            if dist_sq >= reach * reach {
                return None;
            }
            let dist = dist_sq.sqrt();
            let normal = if dist > f32::EPSILON { d / dist } else { Vec2::Y };
            Some(Contact {
                normal,
                depth: reach - dist,
            })
        }
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => {
            box_circle(a.position, a.shape.half_extents(), b.position, radius)
        }
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
            box_circle(b.position, b.shape.half_extents(), a.position, radius).map(|c| Contact {
                normal: -c.normal,
                depth: c.depth,
            })
        }
    }
}

fn boxes(pa: Vec2, ha: Vec2, pb: Vec2, hb: Vec2) -> Option<Contact> {
    let d = pb - pa;
    let overlap = ha + hb - d.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }
    let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    Some(if overlap.x < overlap.y {
        Contact {
            normal: Vec2::new(sign(d.x), 0.0),
            depth: overlap.x,
        }
    } else {
        Contact {
            normal: Vec2::new(0.0, sign(d.y)),
            depth: overlap.y,
        }
    })
}

/// Box at `pb` with half extents `half` against a circle at `pc`.
/// The normal points from the box to the circle.
fn box_circle(pb: Vec2, half: Vec2, pc: Vec2, radius: f32) -> Option<Contact> {
    let closest = pc.clamp(pb - half, pb + half);
    let d = pc - closest;
    let dist_sq = d.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }
    if dist_sq > f32::EPSILON {
        let dist = dist_sq.sqrt();
        Some(Contact {
            normal: d / dist,
            depth: radius - dist,
        })
    } else {
        // circle centre inside the box
        boxes(pb, half, pc, Vec2::splat(radius))
    }
}

/// Separates the pair along the contact normal and exchanges an elastic
/// impulse weighted by area.
fn bounce(world: &mut PhysicsWorld, a: &Body, b: &Body, contact: Contact, elasticity: f32) {
    let inv_a = 1.0 / a.mass();
    let inv_b = 1.0 / b.mass();
    let inv_total = inv_a + inv_b;

    let correction = contact.normal * (contact.depth / inv_total);
    let mut pos_a = a.position - correction * inv_a;
    let mut pos_b = b.position + correction * inv_b;
    if !pos_a.is_finite() || !pos_b.is_finite() {
        pos_a = a.position;
        pos_b = b.position;
    }

    let mut vel_a = a.velocity;
    let mut vel_b = b.velocity;
    let approaching = (b.velocity - a.velocity).dot(contact.normal);
    if approaching < 0.0 {
        let impulse = -(1.0 + elasticity) * approaching / inv_total;
        vel_a -= contact.normal * (impulse * inv_a);
        vel_b += contact.normal * (impulse * inv_b);
    }

    if let Some(body) = world.body_mut(a.id) {
        body.position = pos_a;
        body.velocity = vel_a;
    }
    if let Some(body) = world.body_mut(b.id) {
        body.position = pos_b;
        body.velocity = vel_b;
    }
}
