//! The agent-goal component: contributes one weighted [`Goal`] to the
//! behavior of its entity's [`Agent`].
//!
//! The goal is created lazily by a [`GoalFactory`] the first time it is
//! applied (normally when the component is added). Changing the weight or
//! pausing only rewrites the agent's recorded weight; the goal itself is only
//! rebuilt by [`AgentGoalComponent::recreate_and_reapply_goal`].
//!
//! Detaching the component takes its goal out of the agent's behavior but
//! keeps the goal, weight and pause flag, so the same component can be added
//! again later.
//!
//! Operations that touch the agent take a [`ComponentContext`]; from outside
//! a hook use [`Entity::with_component`](crate::entity::Entity::with_component):
//!
//! ```
//! use kraken_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let id = world.spawn_named("hunter");
//! let hunter = world.entity_mut(id).unwrap();
//! hunter.add_components(vec![
//!     Box::new(Agent::new()) as Box<dyn Component>,
//!     Box::new(AgentGoalComponent::for_objective(Objective::Wander { speed: 3.0 })),
//! ]);
//!
//! hunter.with_component::<AgentGoalComponent, _>(AGENT_GOAL, |goal, ctx| {
//!     goal.set_weight(ctx, 0.5);
//! });
//!
//! let agent = hunter.component::<Agent>(AGENT).unwrap();
//! assert_eq!(agent.behavior().unwrap().len(), 1);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::agent::{Agent, Goal, Objective, AGENT};
use crate::component::{Component, ComponentContext, ComponentKind};
use crate::entity::EntityId;
use crate::CoreError;

/// Default kind for agent-goal components. Give each goal component on the
/// same entity its own kind with [`AgentGoalComponent::with_kind`].
pub const AGENT_GOAL: ComponentKind = ComponentKind::new("agent_goal");

const REQUIRES: &[ComponentKind] = &[AGENT];

/// Builds the goal for an [`AgentGoalComponent`]. Returning `None` means no
/// goal could be produced; the component then stays inert.
pub type GoalFactory = Rc<dyn Fn() -> Option<Goal>>;

/// Contributes one goal to the entity's [`Agent`] behavior while attached.
///
/// The goal comes from an objective or a factory and is removed from the
/// behavior again when the component leaves the entity.
#[derive(Clone)]
pub struct AgentGoalComponent {
    entity: Option<EntityId>,
    kind: ComponentKind,
    goal: Option<Goal>,
    weight: f32,
    paused: bool,
    factory: Option<GoalFactory>,
}

impl AgentGoalComponent {
    /// A component with no goal factory. Applying it logs a configuration
    /// warning until a factory is set.
    pub fn new() -> Self {
        Self {
            entity: None,
            kind: AGENT_GOAL,
            goal: None,
            weight: 1.0,
            paused: false,
            factory: None,
        }
    }

    /// A component whose goals are built from `objective`.
    pub fn for_objective(objective: Objective) -> Self {
        Self::new().with_factory(move || Some(Goal::new(objective.clone())))
    }

    pub fn with_factory(mut self, factory: impl Fn() -> Option<Goal> + 'static) -> Self {
        self.factory = Some(Rc::new(factory));
        self
    }

    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    /// The stored weight, unaffected by pausing.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Weight the agent should record for this goal right now.
    pub fn effective_weight(&self) -> f32 {
        if self.paused {
            0.0
        } else {
            self.weight
        }
    }

    /// Replace the goal factory. The current goal is kept; call
    /// [`recreate_and_reapply_goal`](Self::recreate_and_reapply_goal) to
    /// rebuild it with the new factory.
    pub fn set_factory(&mut self, factory: impl Fn() -> Option<Goal> + 'static) {
        self.factory = Some(Rc::new(factory));
    }

    /// Discard the stored goal without touching the agent. The next
    /// application creates a fresh one.
    pub fn invalidate_goal(&mut self) {
        self.goal = None;
    }

    /// Build a goal with the factory. Without a factory this logs a warning
    /// and produces nothing.
    pub fn create_goal(&self, ctx: &ComponentContext<'_>) -> Option<Goal> {
        match &self.factory {
            Some(factory) => factory(),
            None => {
                let err = CoreError::Configuration {
                    component: self.kind,
                    details: "no goal factory configured".to_owned(),
                };
                ctx.log().warn(format!("{} {err}", ctx.describe_entity()));
                None
            }
        }
    }

    /// Apply the goal to the co-component agent at the effective weight,
    /// creating the goal (and the agent's behavior) if needed.
    ///
    /// Calling this repeatedly leaves the agent in the same state.
    pub fn apply_goal_to_agent(&mut self, ctx: &mut ComponentContext<'_>) {
        if !ctx.has_co_component(AGENT) {
            let err = CoreError::MissingDependency {
                entity: ctx.describe_entity(),
                component: self.kind,
                missing: vec![AGENT],
            };
            ctx.log().warn(err.to_string());
            return;
        }

        if self.goal.is_none() {
            self.goal = self.create_goal(ctx);
        }
        let Some(goal) = &self.goal else {
            ctx.log()
                .warn(format!("{} {} missing goal", ctx.describe_entity(), self.kind));
            return;
        };

        let weight = self.effective_weight();
        if let Some(agent) = ctx.co_component_mut::<Agent>(AGENT) {
            agent.behavior_or_default().set_weight(goal, weight);
        }
    }

    /// Take the goal out of the agent's behavior. The goal is kept.
    pub fn remove_goal_from_agent(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(goal) = &self.goal else {
            return;
        };
        if let Some(behavior) = ctx
            .co_component_mut::<Agent>(AGENT)
            .and_then(|agent| agent.behavior_mut())
        {
            behavior.remove(goal);
        }
    }

    /// Remove the current goal from the agent, discard it, and build and
    /// apply a new one. Use after changing whatever the factory reads.
    pub fn recreate_and_reapply_goal(&mut self, ctx: &mut ComponentContext<'_>) {
        self.remove_goal_from_agent(ctx);
        self.goal = None;
        self.apply_goal_to_agent(ctx);
    }

    /// Change the stored weight. Assigning the current value does nothing.
    /// While paused the agent keeps recording zero.
    pub fn set_weight(&mut self, ctx: &mut ComponentContext<'_>, weight: f32) {
        if weight == self.weight {
            return;
        }
        self.weight = weight;
        if !self.paused {
            self.write_agent_weight(ctx, weight);
        }
    }

    /// Pause or resume the goal. Pausing records zero on the agent; resuming
    /// restores the stored weight. Assigning the current value does nothing.
    pub fn set_paused(&mut self, ctx: &mut ComponentContext<'_>, paused: bool) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        let weight = self.effective_weight();
        self.write_agent_weight(ctx, weight);
    }

    /// Rewrite the agent's weight for our goal, if both exist.
    fn write_agent_weight(&self, ctx: &mut ComponentContext<'_>, weight: f32) {
        let Some(goal) = &self.goal else {
            return;
        };
        if let Some(behavior) = ctx
            .co_component_mut::<Agent>(AGENT)
            .and_then(|agent| agent.behavior_mut())
        {
            behavior.set_weight(goal, weight);
        }
    }
}

impl Default for AgentGoalComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AgentGoalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentGoalComponent")
            .field("kind", &self.kind)
            .field("entity", &self.entity)
            .field("goal", &self.goal.as_ref().map(|g| g.id()))
            .field("weight", &self.weight)
            .field("paused", &self.paused)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

impl Component for AgentGoalComponent {
    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn required_kinds(&self) -> &[ComponentKind] {
        REQUIRES
    }

    fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    fn set_entity(&mut self, entity: Option<EntityId>) {
        self.entity = entity;
    }

    fn did_add_to_entity(&mut self, ctx: &mut ComponentContext<'_>) {
        self.apply_goal_to_agent(ctx);
    }

    fn will_remove_from_entity(&mut self, ctx: &mut ComponentContext<'_>) {
        self.remove_goal_from_agent(ctx);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
