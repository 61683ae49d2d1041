//! Steering agents: [`Goal`]s, the weighted [`Behavior`] that blends them,
//! and the [`Agent`] component that integrates the blend every frame.
//!
//! A goal is identified by its [`GoalId`], not by its objective: two goals
//! with the same objective are still distinct entries in a behavior. The
//! behavior keeps one weight per goal; the agent's steering force is the
//! weighted sum of every goal's force.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::component::{Component, ComponentContext, ComponentKind};
use crate::entity::EntityId;

/// Kind under which the [`Agent`] component is stored.
pub const AGENT: ComponentKind = ComponentKind::new("agent");

// ---------------------------------------------------------------------------
// Goal
// ---------------------------------------------------------------------------

static NEXT_GOAL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a created goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalId(u64);

impl GoalId {
    fn next() -> Self {
        Self(NEXT_GOAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// What a goal steers towards.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Head for a point at full speed.
    Seek(Vec2),
    /// Head away from a point at full speed.
    Flee(Vec2),
    /// Drift in a randomly jittered direction at `speed`.
    Wander { speed: f32 },
    /// Accelerate or brake along the current heading until at `speed`.
    TargetSpeed(f32),
}

impl Objective {
    /// Unweighted steering force for an agent in the given motion state.
    pub fn force(
        &self,
        position: Vec2,
        velocity: Vec2,
        max_speed: f32,
        rng: &mut impl Rng,
    ) -> Vec2 {
        match self {
            Objective::Seek(target) => {
                (*target - position).normalize_or_zero() * max_speed - velocity
            }
            Objective::Flee(threat) => {
                (position - *threat).normalize_or_zero() * max_speed - velocity
            }
            Objective::Wander { speed } => {
                let heading = velocity.normalize_or_zero();
                let direction = if heading == Vec2::ZERO {
                    Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
                } else {
                    Vec2::from_angle(rng.gen_range(-0.5..0.5)).rotate(heading)
                };
                direction * *speed - velocity
            }
            Objective::TargetSpeed(speed) => {
                let current = velocity.length();
                velocity.normalize_or_zero() * (*speed - current)
            }
        }
    }
}

/// A single steering objective with its own identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    id: GoalId,
    objective: Objective,
}

impl Goal {
    /// Create a goal with a fresh identity.
    pub fn new(objective: Objective) -> Self {
        Self {
            id: GoalId::next(),
            objective,
        }
    }

    pub fn id(&self) -> GoalId {
        self.id
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// An ordered set of goals, each with an influence weight.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    goals: Vec<(Goal, f32)>,
    mutations: u64,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weight for `goal`, adding it if not yet present.
    pub fn set_weight(&mut self, goal: &Goal, weight: f32) {
        self.mutations += 1;
        match self.goals.iter_mut().find(|(g, _)| g.id == goal.id) {
            Some((_, w)) => *w = weight,
            None => self.goals.push((goal.clone(), weight)),
        }
    }

    /// Remove `goal`. Returns `false` if it was not present.
    pub fn remove(&mut self, goal: &Goal) -> bool {
        let before = self.goals.len();
        self.goals.retain(|(g, _)| g.id != goal.id);
        let removed = self.goals.len() != before;
        if removed {
            self.mutations += 1;
        }
        removed
    }

    /// Weight recorded for `goal`, or `None` if it is not part of the behavior.
    pub fn weight(&self, goal: &Goal) -> Option<f32> {
        self.weight_of(goal.id)
    }

    pub fn weight_of(&self, id: GoalId) -> Option<f32> {
        self.goals
            .iter()
            .find(|(g, _)| g.id == id)
            .map(|(_, w)| *w)
    }

    pub fn contains(&self, goal: &Goal) -> bool {
        self.weight_of(goal.id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Goal, f32)> {
        self.goals.iter().map(|(g, w)| (g, *w))
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// How many times the behavior's contents have been written to. Every
    /// `set_weight` counts, even when the weight is unchanged.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A steering agent in the plane.
///
/// Each frame the weighted goal forces are summed, clamped to
/// `max_acceleration`, divided by `mass` and integrated into `velocity`
/// (clamped to `max_speed`) and then `position`.
#[derive(Debug, Clone)]
pub struct Agent {
    entity: Option<EntityId>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub mass: f32,
    behavior: Option<Behavior>,
    rng: Pcg32,
}

impl Agent {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Agent whose wander jitter comes from a generator seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            entity: None,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            max_speed: 100.0,
            max_acceleration: 200.0,
            mass: 1.0,
            behavior: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn behavior(&self) -> Option<&Behavior> {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> Option<&mut Behavior> {
        self.behavior.as_mut()
    }

    pub fn set_behavior(&mut self, behavior: Option<Behavior>) {
        self.behavior = behavior;
    }

    /// The behavior, created empty if there is none yet.
    pub fn behavior_or_default(&mut self) -> &mut Behavior {
        self.behavior.get_or_insert_with(Behavior::new)
    }

    /// Weighted sum of every goal's force, clamped to `max_acceleration`.
    pub fn steering_force(&mut self) -> Vec2 {
        let Some(behavior) = &self.behavior else {
            return Vec2::ZERO;
        };
        let mut force = Vec2::ZERO;
        for (goal, weight) in behavior.iter() {
            if weight == 0.0 {
                continue;
            }
            force += goal
                .objective()
                .force(self.position, self.velocity, self.max_speed, &mut self.rng)
                * weight;
        }
        force.clamp_length_max(self.max_acceleration)
    }

    /// Advance the agent by `delta_time` seconds.
    pub fn integrate(&mut self, delta_time: f32) {
        let acceleration = self.steering_force() / self.mass.max(f32::EPSILON);
        self.velocity = (self.velocity + acceleration * delta_time).clamp_length_max(self.max_speed);
        self.position += self.velocity * delta_time;
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Agent {
    fn kind(&self) -> ComponentKind {
        AGENT
    }

    fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    fn set_entity(&mut self, entity: Option<EntityId>) {
        self.entity = entity;
    }

    fn update(&mut self, _ctx: &mut ComponentContext<'_>, delta_time: f64) {
        self.integrate(delta_time as f32);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
