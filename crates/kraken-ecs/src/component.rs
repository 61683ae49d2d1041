//! Component kinds, the [`Component`] trait and per-entity component storage.
//!
//! Every component declares a [`ComponentKind`]: a named tag that identifies
//! it on its entity. An entity holds at most one component per kind. A
//! component may also declare the kinds it *requires*; the entity checks
//! those after every add and logs a warning for anything missing.
//!
//! Lifecycle hooks receive a [`ComponentContext`], a view over the entity's
//! other components (the *co-components*) plus the injected log book.

use std::any::Any;
use std::fmt;

use crate::entity::EntityId;
use crate::log::Logbook;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Named tag identifying a kind of component.
///
/// Kinds compare by name, so two kinds built from the same string are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(&'static str);

impl ComponentKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.0)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Render a list of kinds as `a, b, c`.
pub fn join_kinds(kinds: &[ComponentKind]) -> String {
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// Type-erasure helpers implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Boxed cloning, implemented for every `Clone` component.
pub trait CloneComponent {
    fn clone_box(&self) -> Box<dyn Component>;
}

impl<T: Component + Clone> CloneComponent for T {
    fn clone_box(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// A unit of behavior or data attached to an [`Entity`](crate::entity::Entity).
///
/// Implementors store their own back-reference (an `Option<EntityId>`); the
/// entity sets it on attach and clears it on detach. All hooks default to
/// no-ops.
pub trait Component: AsAny + CloneComponent {
    /// The kind this component is stored under.
    fn kind(&self) -> ComponentKind;

    /// Kinds that must also be present on the entity for this component to
    /// function. Checked after adding; absence is logged, not enforced.
    fn required_kinds(&self) -> &[ComponentKind] {
        &[]
    }

    /// The entity this component is attached to, if any.
    fn entity(&self) -> Option<EntityId>;

    /// Set or clear the back-reference. Called by the entity only.
    fn set_entity(&mut self, entity: Option<EntityId>);

    /// Called after the component has been inserted into the entity.
    fn did_add_to_entity(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Called before the component is taken out of the entity, while its
    /// co-components are still present.
    fn will_remove_from_entity(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Per-frame update with the elapsed time in seconds.
    fn update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f64) {}
}

impl dyn Component {
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Recover the concrete component from a detached box.
    pub fn downcast<T: Component>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast::<T>().ok()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind())
            .field("entity", &self.entity())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentMap
// ---------------------------------------------------------------------------

/// Insertion-ordered storage with at most one component per kind.
///
/// Mutation that changes membership is crate-private so that hooks, which
/// only see the map through a [`ComponentContext`], cannot add or remove
/// siblings while they run.
#[derive(Debug, Default)]
pub struct ComponentMap {
    slots: Vec<Box<dyn Component>>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn position(&self, kind: ComponentKind) -> Option<usize> {
        self.slots.iter().position(|c| c.kind() == kind)
    }

    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.position(kind).is_some()
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&(dyn Component + 'static)> {
        self.slots.iter().find(|c| c.kind() == kind).map(|c| &**c)
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut (dyn Component + 'static)> {
        self.slots
            .iter_mut()
            .find(|c| c.kind() == kind)
            .map(|c| &mut **c)
    }

    /// Typed lookup. `None` if the kind is absent or holds another type.
    pub fn get_as<T: Component>(&self, kind: ComponentKind) -> Option<&T> {
        self.get(kind).and_then(|c| c.downcast_ref::<T>())
    }

    pub fn get_as_mut<T: Component>(&mut self, kind: ComponentKind) -> Option<&mut T> {
        self.get_mut(kind).and_then(|c| c.downcast_mut::<T>())
    }

    /// Kinds in insertion order.
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.slots.iter().map(|c| c.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Component + 'static)> {
        self.slots.iter().map(|c| &**c)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Which of `required` are not present.
    pub fn missing(&self, required: &[ComponentKind]) -> Vec<ComponentKind> {
        required
            .iter()
            .copied()
            .filter(|k| !self.contains(*k))
            .collect()
    }

    /// Insert, replacing in place any component of the same kind. Returns
    /// the replaced component untouched (hooks are the caller's business).
    pub(crate) fn insert(&mut self, component: Box<dyn Component>) -> Option<Box<dyn Component>> {
        match self.position(component.kind()) {
            Some(index) => Some(std::mem::replace(&mut self.slots[index], component)),
            None => {
                self.slots.push(component);
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, kind: ComponentKind) -> Option<Box<dyn Component>> {
        let index = self.position(kind)?;
        Some(self.slots.remove(index))
    }

    pub(crate) fn take_at(&mut self, index: usize) -> Box<dyn Component> {
        self.slots.remove(index)
    }

    pub(crate) fn restore_at(&mut self, index: usize, component: Box<dyn Component>) {
        self.slots.insert(index, component);
    }
}

// ---------------------------------------------------------------------------
// ComponentContext
// ---------------------------------------------------------------------------

/// What a component sees while one of its hooks runs: its entity's identity,
/// its co-components (itself excluded) and the log book.
pub struct ComponentContext<'a> {
    entity: EntityId,
    entity_name: Option<&'a str>,
    siblings: &'a mut ComponentMap,
    log: &'a Logbook,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        entity: EntityId,
        entity_name: Option<&'a str>,
        siblings: &'a mut ComponentMap,
        log: &'a Logbook,
    ) -> Self {
        Self {
            entity,
            entity_name,
            siblings,
            log,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.entity_name
    }

    /// `"name" (3v0)` or `(3v0)` for log messages.
    pub fn describe_entity(&self) -> String {
        describe_entity(self.entity, self.entity_name)
    }

    pub fn log(&self) -> &Logbook {
        self.log
    }

    pub fn has_co_component(&self, kind: ComponentKind) -> bool {
        self.siblings.contains(kind)
    }

    /// The sibling of `kind` as `T`, or `None`.
    pub fn co_component<T: Component>(&self, kind: ComponentKind) -> Option<&T> {
        self.siblings.get_as::<T>(kind)
    }

    pub fn co_component_mut<T: Component>(&mut self, kind: ComponentKind) -> Option<&mut T> {
        self.siblings.get_as_mut::<T>(kind)
    }
}

pub(crate) fn describe_entity(entity: EntityId, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("\"{name}\" ({entity})"),
        None => format!("({entity})"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
