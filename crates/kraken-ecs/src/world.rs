//! The [`World`] is the registry of entities. It owns the entity allocator,
//! every [`Entity`], and the [`Logbook`] they all report to, and drives the
//! per-frame update pass.
//!
//! Entities are addressed by [`EntityId`] handles. A handle outlives its
//! entity harmlessly: once the entity is despawned the handle's generation no
//! longer matches and every lookup returns `None` or
//! [`CoreError::StaleEntity`].

use crate::component::Component;
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::log::Logbook;
use crate::CoreError;

/// Owns every live entity and the shared log book, and updates them each frame.
#[derive(Debug)]
pub struct World {
    allocator: EntityAllocator,
    /// Indexed by `EntityId::index()`.
    slots: Vec<Option<Entity>>,
    log: Logbook,
    frame: u64,
}

impl World {
    pub fn new() -> Self {
        Self::with_logbook(Logbook::new())
    }

    /// A world whose entities report to `log`.
    pub fn with_logbook(log: Logbook) -> Self {
        Self {
            allocator: EntityAllocator::new(),
            slots: Vec::new(),
            log,
            frame: 0,
        }
    }

    pub fn log(&self) -> &Logbook {
        &self.log
    }

    /// Number of completed update passes.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // -- spawn / despawn -----------------------------------------------------

    pub fn spawn(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.place(Entity::new(id, self.log.clone()));
        self.log.framework(format!("spawned ({id})"));
        id
    }

    pub fn spawn_named(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.allocator.allocate();
        let entity = Entity::named(id, name, self.log.clone());
        self.log.framework(format!("spawned {}", entity.describe()));
        self.place(entity);
        id
    }

    /// Remove an entity, detaching all of its components (hooks run, back-
    /// references cleared). The detached components are returned.
    pub fn despawn(&mut self, id: EntityId) -> Result<Vec<Box<dyn Component>>, CoreError> {
        if !self.allocator.is_alive(id) {
            return Err(CoreError::StaleEntity { entity: id });
        }
        let mut entity = self.slots[id.index() as usize]
            .take()
            .ok_or(CoreError::StaleEntity { entity: id })?;
        self.allocator.deallocate(id);

        let detached = entity.remove_all_components();
        self.log.framework(format!("despawned {}", entity.describe()));
        Ok(detached)
    }

    // -- lookup --------------------------------------------------------------

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get(id.index() as usize)?.as_ref()
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index() as usize)?.as_mut()
    }

    /// Like [`entity_mut`](Self::entity_mut) but with an error for stale
    /// handles, for use with `?`.
    pub fn try_entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, CoreError> {
        self.entity_mut(id)
            .ok_or(CoreError::StaleEntity { entity: id })
    }

    /// The first live entity with this name.
    pub fn find_named(&self, name: &str) -> Option<EntityId> {
        self.entities()
            .find(|e| e.name() == Some(name))
            .map(|e| e.id())
    }

    /// Live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities().map(|e| e.id()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    // -- per-frame -----------------------------------------------------------

    /// Update every entity in slot order, then advance the frame counter.
    pub fn update(&mut self, delta_time: f64) {
        for entity in self.slots.iter_mut().flatten() {
            entity.update(delta_time);
        }
        self.frame += 1;
        self.log.set_frame(self.frame);
    }

    fn place(&mut self, entity: Entity) {
        let index = entity.id().index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(entity);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
