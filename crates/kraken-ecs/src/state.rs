//! Entity states: nodes of a per-entity state machine that decide which
//! components the entity carries.
//!
//! A state may list components to attach when it is entered and component
//! kinds to detach when it is exited. The entry list holds templates: each
//! entry attaches fresh clones, so a state can be entered any number of
//! times. The two lists are independent; call
//! [`EntityState::sync_remove_on_exit_with_add_on_entry`] to derive the exit
//! list from the entry list.
//!
//! Extra behavior is supplied as handler closures instead of by subclassing.
//! Handlers run after the built-in component bookkeeping.

use std::fmt;

use crate::component::{join_kinds, Component, ComponentKind};
use crate::entity::Entity;

type EnterHandler = Box<dyn FnMut(&mut Entity, Option<&str>)>;
type ExitHandler = Box<dyn FnMut(&mut Entity, &str)>;
type UpdateHandler = Box<dyn FnMut(&mut Entity, f64)>;

/// A named state: components to add on entry and remove on exit, optional
/// enter/exit/update handlers, and the states it may move to next.
pub struct EntityState {
    name: String,
    components_to_add_on_entry: Option<Vec<Box<dyn Component>>>,
    component_kinds_to_remove_on_exit: Option<Vec<ComponentKind>>,
    valid_next_states: Option<Vec<String>>,
    on_enter: Option<EnterHandler>,
    on_exit: Option<ExitHandler>,
    on_update: Option<UpdateHandler>,
}

impl EntityState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components_to_add_on_entry: None,
            component_kinds_to_remove_on_exit: None,
            valid_next_states: None,
            on_enter: None,
            on_exit: None,
            on_update: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- builders ------------------------------------------------------------

    pub fn adding_on_entry(mut self, components: Vec<Box<dyn Component>>) -> Self {
        self.components_to_add_on_entry = Some(components);
        self
    }

    pub fn removing_on_exit(mut self, kinds: &[ComponentKind]) -> Self {
        self.component_kinds_to_remove_on_exit = Some(kinds.to_vec());
        self
    }

    /// Restrict which states may follow this one.
    pub fn allowing_next(mut self, states: &[&str]) -> Self {
        self.valid_next_states = Some(states.iter().map(|s| (*s).to_owned()).collect());
        self
    }

    /// Run `handler` after the entry components have been attached. It
    /// receives the name of the previous state, if any.
    pub fn on_enter(mut self, handler: impl FnMut(&mut Entity, Option<&str>) + 'static) -> Self {
        self.on_enter = Some(Box::new(handler));
        self
    }

    /// Run `handler` after the exit kinds have been detached. It receives
    /// the name of the next state.
    pub fn on_exit(mut self, handler: impl FnMut(&mut Entity, &str) + 'static) -> Self {
        self.on_exit = Some(Box::new(handler));
        self
    }

    /// Run `handler` every frame while this is the current state.
    pub fn on_update(mut self, handler: impl FnMut(&mut Entity, f64) + 'static) -> Self {
        self.on_update = Some(Box::new(handler));
        self
    }

    // -- configuration -------------------------------------------------------

    pub fn components_to_add_on_entry(&self) -> Option<&[Box<dyn Component>]> {
        self.components_to_add_on_entry.as_deref()
    }

    /// Replace the entry list. The exit list is left alone.
    pub fn set_components_to_add_on_entry(&mut self, components: Option<Vec<Box<dyn Component>>>) {
        self.components_to_add_on_entry = components;
    }

    pub fn component_kinds_to_remove_on_exit(&self) -> Option<&[ComponentKind]> {
        self.component_kinds_to_remove_on_exit.as_deref()
    }

    pub fn set_component_kinds_to_remove_on_exit(&mut self, kinds: Option<Vec<ComponentKind>>) {
        self.component_kinds_to_remove_on_exit = kinds;
    }

    /// Make the exit list exactly the kinds of the entry list, or unset it
    /// when the entry list is unset.
    pub fn sync_remove_on_exit_with_add_on_entry(&mut self) {
        self.component_kinds_to_remove_on_exit = self
            .components_to_add_on_entry
            .as_ref()
            .map(|components| components.iter().map(|c| c.kind()).collect());
    }

    /// Whether the machine may move from this state to `next`. Any state is
    /// allowed unless an allow-list was configured.
    pub fn is_valid_next_state(&self, next: &str) -> bool {
        match &self.valid_next_states {
            Some(allowed) => allowed.iter().any(|s| s == next),
            None => true,
        }
    }

    // -- transitions ---------------------------------------------------------

    /// Log the transition, attach clones of the entry list as one batch,
    /// then run the enter handler.
    pub fn did_enter(&mut self, entity: &mut Entity, previous: Option<&str>) {
        entity.log().state(format!(
            "{} {} → {}",
            quoted_name(entity),
            previous.unwrap_or("nil"),
            self.name
        ));

        if let Some(templates) = &self.components_to_add_on_entry {
            let fresh: Vec<Box<dyn Component>> = templates.iter().map(|c| c.clone_box()).collect();
            entity.add_components(fresh);
        }

        if let Some(handler) = self.on_enter.as_mut() {
            handler(entity, previous);
        }
    }

    /// Log the transition, detach the exit kinds, then run the exit handler.
    pub fn will_exit(&mut self, entity: &mut Entity, next: &str) {
        entity.log().state(format!(
            "{} {} → {}",
            quoted_name(entity),
            self.name,
            next
        ));

        if let Some(kinds) = &self.component_kinds_to_remove_on_exit {
            for &kind in kinds {
                entity.remove_component(kind);
            }
        }

        if let Some(handler) = self.on_exit.as_mut() {
            handler(entity, next);
        }
    }

    pub fn update(&mut self, entity: &mut Entity, delta_time: f64) {
        if let Some(handler) = self.on_update.as_mut() {
            handler(entity, delta_time);
        }
    }
}

fn quoted_name(entity: &Entity) -> String {
    format!("\"{}\"", entity.name().unwrap_or("nil"))
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self
            .components_to_add_on_entry
            .as_ref()
            .map(|c| join_kinds(&c.iter().map(|c| c.kind()).collect::<Vec<_>>()));
        let exit = self
            .component_kinds_to_remove_on_exit
            .as_ref()
            .map(|k| join_kinds(k));
        f.debug_struct("EntityState")
            .field("name", &self.name)
            .field("add_on_entry", &entry)
            .field("remove_on_exit", &exit)
            .field("valid_next_states", &self.valid_next_states)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
