//! Per-entity finite state machine over [`EntityState`]s.
//!
//! There is no implicit initial state: the machine has no current state
//! until the first successful [`EntityStateMachine::enter`]. A transition is
//! accepted only if the target state is registered and the current state (if
//! any) allows it. A rejected transition runs nothing. An accepted one runs
//! the old state's `will_exit` to completion, including its component
//! removals, before the new state's `did_enter` begins.
//!
//! The machine normally lives on the entity it drives (see
//! [`Entity::enter_state`]), but it can also be driven against any entity
//! directly. State handlers move their own entity on with
//! [`Entity::request_state`].

use crate::entity::Entity;
use crate::state::EntityState;
use crate::CoreError;

/// Registered states keyed by name, plus the current one.
#[derive(Debug, Default)]
pub struct EntityStateMachine {
    states: Vec<EntityState>,
    current: Option<usize>,
}

impl EntityStateMachine {
    /// A machine over `states`. Later states with an already-used name are
    /// dropped.
    pub fn new(states: impl IntoIterator<Item = EntityState>) -> Self {
        let mut machine = Self::default();
        for state in states {
            machine.register(state);
        }
        machine
    }

    /// Register a state. Returns `false` (and drops `state`) if a state with
    /// the same name is already registered.
    pub fn register(&mut self, state: EntityState) -> bool {
        if self.index_of(state.name()).is_some() {
            tracing::warn!(state = state.name(), "duplicate state name ignored");
            return false;
        }
        self.states.push(state);
        true
    }

    pub fn state(&self, name: &str) -> Option<&EntityState> {
        self.index_of(name).map(|i| &self.states[i])
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut EntityState> {
        self.index_of(name).map(move |i| &mut self.states[i])
    }

    /// Registered state names in registration order.
    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().map(|s| s.name()).collect()
    }

    pub fn current_state(&self) -> Option<&EntityState> {
        self.current.map(|i| &self.states[i])
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current_state().map(|s| s.name())
    }

    /// Whether [`enter`](Self::enter) with `name` would be accepted.
    pub fn can_enter_state(&self, name: &str) -> bool {
        self.check_transition(name).is_ok()
    }

    /// Move to the state called `name`, running the old state's exit and the
    /// new state's entry against `entity`.
    pub fn enter(&mut self, entity: &mut Entity, name: &str) -> Result<(), CoreError> {
        let target = match self.check_transition(name) {
            Ok(target) => target,
            Err(err) => {
                tracing::debug!(entity = %entity.id(), %err, "transition rejected");
                return Err(err);
            }
        };

        let previous = self.current;
        let previous_name = previous.map(|i| self.states[i].name().to_owned());
        if let Some(old) = previous {
            self.states[old].will_exit(entity, name);
        }
        self.current = Some(target);
        self.states[target].did_enter(entity, previous_name.as_deref());
        Ok(())
    }

    /// Forward a frame to the current state.
    pub fn update(&mut self, entity: &mut Entity, delta_time: f64) {
        if let Some(current) = self.current {
            self.states[current].update(entity, delta_time);
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name() == name)
    }

    fn check_transition(&self, name: &str) -> Result<usize, CoreError> {
        let target = self
            .index_of(name)
            .ok_or_else(|| CoreError::UnregisteredState {
                to: name.to_owned(),
            })?;
        if let Some(current) = self.current_state() {
            if !current.is_valid_next_state(name) {
                return Err(CoreError::IllegalTransition {
                    from: current.name().to_owned(),
                    to: name.to_owned(),
                });
            }
        }
        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
