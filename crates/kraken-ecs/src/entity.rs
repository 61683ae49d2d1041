//! Entity identifiers, allocation, and the [`Entity`] component container.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and an *index* in the low 32 bits. The generation is bumped
//! every time an index is recycled, which allows immediate stale-ID detection.
//! Components refer back to their entity through this handle, never through
//! an owning pointer.
//!
//! An [`Entity`] owns its components by value, at most one per
//! [`ComponentKind`], and runs their lifecycle hooks:
//!
//! - `add_component` inserts (or replaces) and then calls `did_add_to_entity`.
//! - `add_components` inserts the whole batch first, then calls every hook,
//!   then checks dependencies, so components added in the same batch can
//!   satisfy each other's requirements.
//! - `remove_component` calls `will_remove_from_entity` while the component
//!   is still attached, then detaches it and clears its back-reference.
//!
//! Missing requirements are logged as warnings; the component stays attached.

use std::collections::VecDeque;
use std::fmt;

use crate::component::{
    describe_entity, join_kinds, Component, ComponentContext, ComponentKind, ComponentMap,
};
use crate::log::Logbook;
use crate::state_machine::EntityStateMachine;
use crate::CoreError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s with generational tracking.
///
/// Free indices are kept in a FIFO queue so that generations are spread out
/// over time rather than concentrated on a hot index.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: VecDeque<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`EntityId`], reusing a recycled index when one is
    /// available.
    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was already bumped on deallocate.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Deallocate an entity, bumping the generation for its index so that
    /// outstanding handles become stale.
    ///
    /// Returns `false` if the entity was already dead or the handle is stale.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Transitions requested from state handlers are followed at most this many
/// times in a row before the rest of the chain is dropped.
pub const MAX_CHAINED_TRANSITIONS: usize = 16;

/// A named container of components forming one game object.
pub struct Entity {
    id: EntityId,
    name: Option<String>,
    components: ComponentMap,
    state_machine: Option<EntityStateMachine>,
    /// Set by [`Entity::request_state`], consumed once the machine is back.
    requested_state: Option<String>,
    log: Logbook,
}

impl Entity {
    /// Create an unnamed entity reporting to `log`.
    pub fn new(id: EntityId, log: Logbook) -> Self {
        Self {
            id,
            name: None,
            components: ComponentMap::new(),
            state_machine: None,
            requested_state: None,
            log,
        }
    }

    /// Create a named entity. The name only appears in diagnostics.
    pub fn named(id: EntityId, name: impl Into<String>, log: Logbook) -> Self {
        let mut entity = Self::new(id, log);
        entity.name = Some(name.into());
        entity
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn log(&self) -> &Logbook {
        &self.log
    }

    /// `"name" (3v0)` or `(3v0)`.
    pub fn describe(&self) -> String {
        describe_entity(self.id, self.name.as_deref())
    }

    // -- component queries ---------------------------------------------------

    pub fn components(&self) -> &ComponentMap {
        &self.components
    }

    /// Kinds currently attached, in insertion order.
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.components.kinds()
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains(kind)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// The component of `kind` as `T`, or `None` if absent or of another type.
    pub fn component<T: Component>(&self, kind: ComponentKind) -> Option<&T> {
        self.components.get_as::<T>(kind)
    }

    pub fn component_mut<T: Component>(&mut self, kind: ComponentKind) -> Option<&mut T> {
        self.components.get_as_mut::<T>(kind)
    }

    /// Required kinds of the component of `kind` that are not attached.
    /// Empty if the component is absent or has no requirements.
    pub fn missing_dependencies(&self, kind: ComponentKind) -> Vec<ComponentKind> {
        match self.components.get(kind) {
            Some(component) => self.components.missing(component.required_kinds()),
            None => Vec::new(),
        }
    }

    pub fn check_dependencies(&self, kind: ComponentKind) -> Result<(), CoreError> {
        let missing = self.missing_dependencies(kind);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingDependency {
                entity: self.describe(),
                component: kind,
                missing,
            })
        }
    }

    // -- add / remove --------------------------------------------------------

    /// Attach `component`, replacing any component of the same kind.
    ///
    /// The replaced component (if any) gets `will_remove_from_entity`, loses
    /// its back-reference, and is returned. Requirements of the new component
    /// are checked after its `did_add_to_entity` hook runs.
    pub fn add_component(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        let kind = component.kind();
        let replaced = self.insert_component(component, true);
        self.run_hook(kind, |c, ctx| c.did_add_to_entity(ctx));
        self.warn_if_dependencies_missing(kind);
        replaced
    }

    /// Attach a batch: every component is inserted before any
    /// `did_add_to_entity` hook runs, and requirements are checked once all
    /// hooks have run.
    ///
    /// If the batch holds two components of the same kind the later one wins;
    /// the earlier one is returned without having seen any hook. Components
    /// replaced from before the batch are returned after their
    /// `will_remove_from_entity` hook.
    pub fn add_components(
        &mut self,
        components: impl IntoIterator<Item = Box<dyn Component>>,
    ) -> Vec<Box<dyn Component>> {
        let mut batch: Vec<ComponentKind> = Vec::new();
        let mut replaced = Vec::new();

        for component in components {
            let kind = component.kind();
            let fresh = !batch.contains(&kind);
            if let Some(old) = self.insert_component(component, fresh) {
                replaced.push(old);
            }
            if fresh {
                batch.push(kind);
            }
        }

        for &kind in &batch {
            self.run_hook(kind, |c, ctx| c.did_add_to_entity(ctx));
        }
        for &kind in &batch {
            self.warn_if_dependencies_missing(kind);
        }
        replaced
    }

    /// Detach the component of `kind` and return it with its back-reference
    /// cleared. `None` if no such component is attached.
    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Box<dyn Component>> {
        if !self.components.contains(kind) {
            return None;
        }
        self.run_hook(kind, |c, ctx| c.will_remove_from_entity(ctx));
        let mut removed = self.components.remove(kind)?;
        removed.set_entity(None);
        self.log
            .debug(format!("{} removed {}", self.describe(), kind));
        Some(removed)
    }

    /// Detach everything, most recently added first.
    pub fn remove_all_components(&mut self) -> Vec<Box<dyn Component>> {
        let mut kinds = self.components.kinds();
        kinds.reverse();
        kinds
            .into_iter()
            .filter_map(|kind| self.remove_component(kind))
            .collect()
    }

    /// Run `f` on the component of `kind` (as `T`) with a context over its
    /// co-components. This is how component operations that reach into
    /// siblings are invoked from outside a hook.
    ///
    /// Returns `None` if the kind is absent or holds another type.
    pub fn with_component<T, R>(
        &mut self,
        kind: ComponentKind,
        f: impl FnOnce(&mut T, &mut ComponentContext<'_>) -> R,
    ) -> Option<R>
    where
        T: Component,
    {
        let index = self.components.position(kind)?;
        let mut component = self.components.take_at(index);
        let result = match component.downcast_mut::<T>() {
            Some(typed) => {
                let mut ctx = ComponentContext::new(
                    self.id,
                    self.name.as_deref(),
                    &mut self.components,
                    &self.log,
                );
                Some(f(typed, &mut ctx))
            }
            None => None,
        };
        self.components.restore_at(index, component);
        result
    }

    // -- per-frame -----------------------------------------------------------

    /// Update every component in insertion order, then the current state.
    pub fn update(&mut self, delta_time: f64) {
        for index in 0..self.components.len() {
            let mut component = self.components.take_at(index);
            {
                let mut ctx = ComponentContext::new(
                    self.id,
                    self.name.as_deref(),
                    &mut self.components,
                    &self.log,
                );
                component.update(&mut ctx, delta_time);
            }
            self.components.restore_at(index, component);
        }

        if let Some(mut machine) = self.state_machine.take() {
            machine.update(self, delta_time);
            self.restore_state_machine(machine);
        }
        self.apply_requested_state();
    }

    // -- state machine -------------------------------------------------------

    pub fn state_machine(&self) -> Option<&EntityStateMachine> {
        self.state_machine.as_ref()
    }

    pub fn state_machine_mut(&mut self) -> Option<&mut EntityStateMachine> {
        self.state_machine.as_mut()
    }

    /// Install a state machine, returning the previous one.
    pub fn set_state_machine(&mut self, machine: EntityStateMachine) -> Option<EntityStateMachine> {
        self.state_machine.replace(machine)
    }

    pub fn take_state_machine(&mut self) -> Option<EntityStateMachine> {
        self.state_machine.take()
    }

    /// Name of the current state, if a state machine is installed and has
    /// entered a state.
    pub fn current_state(&self) -> Option<&str> {
        self.state_machine
            .as_ref()
            .and_then(|m| m.current_state_name())
    }

    /// Transition this entity's own state machine to `state`.
    ///
    /// While the transition runs the machine is detached from the entity, so
    /// state hooks see `current_state()` as `None` and cannot call this
    /// method; they use [`request_state`](Self::request_state) instead.
    pub fn enter_state(&mut self, state: &str) -> Result<(), CoreError> {
        let result = self.transition(state);
        self.apply_requested_state();
        result
    }

    /// Ask for a transition to `state` once the running state hook returns.
    ///
    /// This is how `on_enter`, `on_exit` and `on_update` handlers move their
    /// own entity on. The request is checked like [`enter_state`](Self::enter_state)
    /// when it is applied: right after the current transition or state update,
    /// or at the next [`update`](Self::update) if nothing is running. A later
    /// request replaces an earlier one that has not been applied yet. A
    /// rejected request is logged as a warning.
    pub fn request_state(&mut self, state: impl Into<String>) {
        self.requested_state = Some(state.into());
    }

    /// The transition waiting to be applied, if any.
    pub fn requested_state(&self) -> Option<&str> {
        self.requested_state.as_deref()
    }

    // -- internals -----------------------------------------------------------

    fn transition(&mut self, state: &str) -> Result<(), CoreError> {
        let Some(mut machine) = self.state_machine.take() else {
            return Err(CoreError::NoStateMachine {
                entity: self.describe(),
            });
        };
        let result = machine.enter(self, state);
        self.restore_state_machine(machine);
        result
    }

    /// Follow requested transitions until none is left, up to
    /// [`MAX_CHAINED_TRANSITIONS`].
    fn apply_requested_state(&mut self) {
        let mut followed = 0;
        while let Some(next) = self.requested_state.take() {
            if followed == MAX_CHAINED_TRANSITIONS {
                self.log.warn(format!(
                    "{} dropped request for {next}: more than {MAX_CHAINED_TRANSITIONS} chained transitions",
                    self.describe()
                ));
                return;
            }
            followed += 1;
            if let Err(err) = self.transition(&next) {
                self.log
                    .warn(format!("{} requested transition failed: {err}", self.describe()));
            }
        }
    }

    /// Put `machine` back unless a hook installed a different one meanwhile.
    fn restore_state_machine(&mut self, machine: EntityStateMachine) {
        if self.state_machine.is_none() {
            self.state_machine = Some(machine);
        } else {
            self.log.warn(format!(
                "{} state machine replaced during its own hook; keeping the new one",
                self.describe()
            ));
        }
    }

    /// Insert `component` with its back-reference set. A replaced component
    /// gets `will_remove_from_entity` first when `notify_replaced` is set.
    fn insert_component(
        &mut self,
        mut component: Box<dyn Component>,
        notify_replaced: bool,
    ) -> Option<Box<dyn Component>> {
        let kind = component.kind();
        if notify_replaced && self.components.contains(kind) {
            self.run_hook(kind, |c, ctx| c.will_remove_from_entity(ctx));
        }
        component.set_entity(Some(self.id));
        let mut replaced = self.components.insert(component)?;
        replaced.set_entity(None);
        self.log
            .debug(format!("{} replaced {}", self.describe(), kind));
        Some(replaced)
    }

    /// Take the component of `kind` out, run `hook` with a context over the
    /// rest, and put it back in the same slot.
    fn run_hook(
        &mut self,
        kind: ComponentKind,
        hook: impl FnOnce(&mut dyn Component, &mut ComponentContext<'_>),
    ) {
        let Some(index) = self.components.position(kind) else {
            return;
        };
        let mut component = self.components.take_at(index);
        {
            let mut ctx = ComponentContext::new(
                self.id,
                self.name.as_deref(),
                &mut self.components,
                &self.log,
            );
            hook(&mut *component, &mut ctx);
        }
        self.components.restore_at(index, component);
    }

    fn warn_if_dependencies_missing(&self, kind: ComponentKind) {
        if let Err(err) = self.check_dependencies(kind) {
            self.log.warn(err.to_string());
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("components", &join_kinds(&self.components.kinds()))
            .field("state", &self.current_state())
            .field("requested_state", &self.requested_state)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogCategory;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SPRITE: ComponentKind = ComponentKind::new("sprite");
    const TOUCH: ComponentKind = ComponentKind::new("touch");
    const ROTATION: ComponentKind = ComponentKind::new("rotation");

    type Events = Rc<RefCell<Vec<String>>>;

    /// Records every hook call into a shared list.
    #[derive(Clone)]
    struct Tracker {
        entity: Option<EntityId>,
        kind: ComponentKind,
        requires: Vec<ComponentKind>,
        events: Events,
        label: &'static str,
        ticks: f64,
    }

    impl Tracker {
        fn new(kind: ComponentKind, events: &Events) -> Self {
            Self {
                entity: None,
                kind,
                requires: Vec::new(),
                events: Rc::clone(events),
                label: kind.name(),
                ticks: 0.0,
            }
        }

        fn requiring(mut self, kinds: &[ComponentKind]) -> Self {
            self.requires = kinds.to_vec();
            self
        }

        fn labelled(mut self, label: &'static str) -> Self {
            self.label = label;
            self
        }
    }

    impl Component for Tracker {
        fn kind(&self) -> ComponentKind {
            self.kind
        }
        fn required_kinds(&self) -> &[ComponentKind] {
            &self.requires
        }
        fn entity(&self) -> Option<EntityId> {
            self.entity
        }
        fn set_entity(&mut self, entity: Option<EntityId>) {
            self.entity = entity;
        }
        fn did_add_to_entity(&mut self, ctx: &mut ComponentContext<'_>) {
            let seen = self
                .requires
                .iter()
                .filter(|k| ctx.has_co_component(**k))
                .count();
            self.events
                .borrow_mut()
                .push(format!("add {} sees {}", self.label, seen));
        }
        fn will_remove_from_entity(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.events
                .borrow_mut()
                .push(format!("remove {}", self.label));
        }
        fn update(&mut self, _ctx: &mut ComponentContext<'_>, delta_time: f64) {
            self.ticks += delta_time;
        }
    }

    fn entity() -> Entity {
        Entity::named(EntityId::new(0, 0), "hero", Logbook::new())
    }

    fn events() -> Events {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn add_sets_back_reference_and_fires_hook() {
        let ev = events();
        let mut e = entity();
        assert!(e.add_component(Box::new(Tracker::new(SPRITE, &ev))).is_none());

        let tracker = e.component::<Tracker>(SPRITE).unwrap();
        assert_eq!(tracker.entity, Some(e.id()));
        assert_eq!(*ev.borrow(), vec!["add sprite sees 0"]);
    }

    #[test]
    fn adding_same_kind_replaces_and_detaches_old() {
        let ev = events();
        let mut e = entity();
        e.add_component(Box::new(Tracker::new(SPRITE, &ev).labelled("old")));
        let old = e
            .add_component(Box::new(Tracker::new(SPRITE, &ev).labelled("new")))
            .unwrap();

        assert_eq!(old.entity(), None);
        assert_eq!(e.component_count(), 1);
        assert_eq!(e.component::<Tracker>(SPRITE).unwrap().label, "new");
        assert_eq!(
            *ev.borrow(),
            vec!["add old sees 0", "remove old", "add new sees 0"]
        );
    }

    #[test]
    fn single_add_with_missing_dependency_warns_but_attaches() {
        let ev = events();
        let mut e = entity();
        e.add_component(Box::new(Tracker::new(ROTATION, &ev).requiring(&[SPRITE, TOUCH])));

        assert!(e.has_component(ROTATION));
        assert_eq!(e.missing_dependencies(ROTATION), vec![SPRITE, TOUCH]);
        let warnings = e.log().messages_in(LogCategory::Warnings);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sprite, touch"), "{warnings:?}");
    }

    #[test]
    fn batch_add_satisfies_dependencies_before_hooks() {
        let ev = events();
        let mut e = entity();
        e.add_components(vec![
            Box::new(Tracker::new(ROTATION, &ev).requiring(&[SPRITE, TOUCH])) as Box<dyn Component>,
            Box::new(Tracker::new(SPRITE, &ev)),
            Box::new(Tracker::new(TOUCH, &ev)),
        ]);

        assert_eq!(ev.borrow()[0], "add rotation sees 2");
        assert_eq!(e.log().count(LogCategory::Warnings), 0);
        assert!(e.check_dependencies(ROTATION).is_ok());
    }

    #[test]
    fn batch_duplicate_kind_keeps_last_without_hooks_for_first() {
        let ev = events();
        let mut e = entity();
        let replaced = e.add_components(vec![
            Box::new(Tracker::new(SPRITE, &ev).labelled("first")) as Box<dyn Component>,
            Box::new(Tracker::new(SPRITE, &ev).labelled("second")),
        ]);

        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].entity(), None);
        assert_eq!(e.component::<Tracker>(SPRITE).unwrap().label, "second");
        assert_eq!(*ev.borrow(), vec!["add second sees 0"]);
    }

    #[test]
    fn remove_runs_hook_then_clears_back_reference() {
        let ev = events();
        let mut e = entity();
        e.add_component(Box::new(Tracker::new(SPRITE, &ev)));
        let removed = e.remove_component(SPRITE).unwrap();

        assert_eq!(removed.entity(), None);
        assert!(e.component::<Tracker>(SPRITE).is_none());
        assert_eq!(ev.borrow().last().unwrap(), "remove sprite");
        assert!(e.remove_component(SPRITE).is_none());
    }

    #[test]
    fn remove_all_goes_newest_first() {
        let ev = events();
        let mut e = entity();
        e.add_component(Box::new(Tracker::new(SPRITE, &ev)));
        e.add_component(Box::new(Tracker::new(TOUCH, &ev)));
        let removed = e.remove_all_components();

        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].kind(), TOUCH);
        assert_eq!(e.component_count(), 0);
    }

    #[test]
    fn with_component_sees_siblings_and_restores_slot() {
        let ev = events();
        let mut e = entity();
        e.add_component(Box::new(Tracker::new(SPRITE, &ev)));
        e.add_component(Box::new(Tracker::new(TOUCH, &ev)));

        let saw_touch = e
            .with_component::<Tracker, _>(SPRITE, |_, ctx| ctx.has_co_component(TOUCH))
            .unwrap();
        assert!(saw_touch);
        assert_eq!(e.component_kinds(), vec![SPRITE, TOUCH]);
        assert!(e
            .with_component::<Tracker, _>(ROTATION, |_, _| ())
            .is_none());
    }

    #[test]
    fn update_reaches_every_component() {
        let ev = events();
        let mut e = entity();
        e.add_component(Box::new(Tracker::new(SPRITE, &ev)));
        e.add_component(Box::new(Tracker::new(TOUCH, &ev)));
        e.update(0.5);
        e.update(0.25);

        assert_eq!(e.component::<Tracker>(SPRITE).unwrap().ticks, 0.75);
        assert_eq!(e.component::<Tracker>(TOUCH).unwrap().ticks, 0.75);
        assert_eq!(e.component_kinds(), vec![SPRITE, TOUCH]);
    }

    #[test]
    fn enter_state_without_machine_is_an_error() {
        let mut e = entity();
        assert!(matches!(
            e.enter_state("idle"),
            Err(CoreError::NoStateMachine { .. })
        ));
    }

    #[test]
    fn on_update_request_moves_to_next_state() {
        use crate::state::EntityState;

        let mut e = entity();
        e.set_state_machine(EntityStateMachine::new([
            EntityState::new("countdown").on_update(|e, _| e.request_state("done")),
            EntityState::new("done"),
        ]));
        e.enter_state("countdown").unwrap();
        assert_eq!(e.current_state(), Some("countdown"));

        e.update(0.1);

        assert_eq!(e.current_state(), Some("done"));
        assert_eq!(e.requested_state(), None);
    }

    #[test]
    fn on_enter_request_chains_after_transition() {
        use crate::state::EntityState;

        let mut e = entity();
        e.set_state_machine(EntityStateMachine::new([
            EntityState::new("spawn").on_enter(|e, _| e.request_state("idle")),
            EntityState::new("idle"),
        ]));

        e.enter_state("spawn").unwrap();

        assert_eq!(e.current_state(), Some("idle"));
        assert_eq!(
            e.log().messages_in(LogCategory::States),
            vec![
                "\"hero\" nil → spawn",
                "\"hero\" spawn → idle",
                "\"hero\" spawn → idle"
            ]
        );
    }

    #[test]
    fn rejected_request_warns_and_keeps_state() {
        use crate::state::EntityState;

        let mut e = entity();
        e.set_state_machine(EntityStateMachine::new([
            EntityState::new("locked")
                .allowing_next(&[])
                .on_update(|e, _| e.request_state("free")),
            EntityState::new("free"),
        ]));
        e.enter_state("locked").unwrap();

        e.update(0.1);

        assert_eq!(e.current_state(), Some("locked"));
        let warnings = e.log().messages_in(LogCategory::Warnings);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not permitted"), "{warnings:?}");
    }

    #[test]
    fn endless_request_chain_is_cut_off() {
        use crate::state::EntityState;

        let mut e = entity();
        e.set_state_machine(EntityStateMachine::new([
            EntityState::new("ping").on_enter(|e, _| e.request_state("pong")),
            EntityState::new("pong").on_enter(|e, _| e.request_state("ping")),
        ]));

        e.enter_state("ping").unwrap();

        assert!(e.requested_state().is_none());
        assert_eq!(e.log().count(LogCategory::Warnings), 1);
        // The initial entry plus the followed requests.
        assert_eq!(
            e.log().count(LogCategory::States),
            1 + 2 * MAX_CHAINED_TRANSITIONS
        );
    }

    #[test]
    fn request_without_machine_warns_on_next_update() {
        let mut e = entity();
        e.request_state("idle");
        assert_eq!(e.requested_state(), Some("idle"));

        e.update(0.1);

        assert!(e.requested_state().is_none());
        assert_eq!(e.log().count(LogCategory::Warnings), 1);
    }

    // -- allocator -----------------------------------------------------------

    #[test]
    fn generation_increments_on_recycle() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        let e1 = alloc.allocate();
        assert_eq!(e1.index(), e0.index());
        assert_eq!(e1.generation(), 1);
        assert!(!alloc.is_alive(e0), "stale ID should not be alive");
    }

    #[test]
    fn double_deallocate_returns_false() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn entity_id_roundtrip() {
        let id = EntityId::new(42, 7);
        assert_eq!(id.index(), 42);
        assert_eq!(id.generation(), 7);
        assert_eq!(EntityId::from_raw(id.to_raw()), id);
        assert_eq!(id.to_string(), "42v7");
    }
}
