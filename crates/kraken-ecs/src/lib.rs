//! Kraken ECS -- entity/component lifecycle core with dependency checks,
//! weighted steering goals and per-entity state machines.
//!
//! Entities own their components by value, one per [`ComponentKind`](component::ComponentKind).
//! Components declare the kinds they require; the entity checks them after
//! every add and logs what is missing instead of refusing the add, so
//! components can arrive in any order over several frames. Entity states
//! attach and detach components as a state machine moves between them.
//!
//! Nothing here panics or returns an error for wiring problems: missing
//! dependencies and unconfigured hooks are reported to the [`Logbook`](log::Logbook)
//! and the affected component simply does nothing. Only state transitions
//! and stale entity handles are rejected with a [`CoreError`].
//!
//! # Quick Start
//!
//! ```
//! use kraken_ecs::prelude::*;
//! use glam::Vec2;
//!
//! let mut world = World::new();
//! let id = world.spawn_named("scout");
//! let scout = world.entity_mut(id).unwrap();
//!
//! let patrol = EntityState::new("patrol").adding_on_entry(vec![
//!     Box::new(Agent::new()) as Box<dyn Component>,
//!     Box::new(AgentGoalComponent::for_objective(Objective::Seek(Vec2::new(10.0, 0.0)))),
//! ]);
//! scout.set_state_machine(EntityStateMachine::new([patrol, EntityState::new("rest")]));
//! scout.enter_state("patrol").unwrap();
//!
//! world.update(0.1);
//! let scout = world.entity(id).unwrap();
//! assert!(scout.component::<Agent>(AGENT).unwrap().position.x > 0.0);
//! ```

#![deny(unsafe_code)]

pub mod agent;
pub mod component;
pub mod entity;
pub mod goal;
pub mod log;
pub mod state;
pub mod state_machine;
pub mod world;

use component::{join_kinds, ComponentKind};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Conditions reported by the core. Dependency and configuration problems
/// are logged rather than returned from add operations; transitions and
/// entity lookups return them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A component's required co-components are absent.
    #[error("{entity} {component} is missing required components: {}", join_kinds(.missing))]
    MissingDependency {
        entity: String,
        component: ComponentKind,
        missing: Vec<ComponentKind>,
    },

    /// The requested state was never registered with the state machine.
    #[error("state '{to}' is not registered")]
    UnregisteredState { to: String },

    /// The current state does not allow moving to the requested one.
    #[error("transition from '{from}' to '{to}' is not permitted")]
    IllegalTransition { from: String, to: String },

    /// The entity has no state machine to drive.
    #[error("{entity} has no state machine")]
    NoStateMachine { entity: String },

    /// A component hook was not configured.
    #[error("{component}: {details}")]
    Configuration {
        component: ComponentKind,
        details: String,
    },

    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::agent::{Agent, Behavior, Goal, GoalId, Objective, AGENT};
    pub use crate::component::{Component, ComponentContext, ComponentKind, ComponentMap};
    pub use crate::entity::{Entity, EntityId};
    pub use crate::goal::{AgentGoalComponent, GoalFactory, AGENT_GOAL};
    pub use crate::log::{LogCategory, LogRecord, Logbook};
    pub use crate::state::EntityState;
    pub use crate::state_machine::EntityStateMachine;
    pub use crate::world::World;
    pub use crate::CoreError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
