//! State machine transition tests against full entities: ordering of exit
//! and entry bookkeeping, rejected transitions, transitions requested by
//! state handlers, and log output.

use std::cell::RefCell;
use std::rc::Rc;

use kraken_ecs::prelude::*;

const WEAPON: ComponentKind = ComponentKind::new("weapon");
const AIM: ComponentKind = ComponentKind::new("aim");

type Journal = Rc<RefCell<Vec<String>>>;

/// Writes every attach/detach to a shared journal.
#[derive(Clone)]
struct Recorder {
    entity: Option<EntityId>,
    kind: ComponentKind,
    tag: &'static str,
    journal: Journal,
}

impl Recorder {
    fn boxed(kind: ComponentKind, tag: &'static str, journal: &Journal) -> Box<dyn Component> {
        Box::new(Recorder {
            entity: None,
            kind,
            tag,
            journal: Rc::clone(journal),
        })
    }
}

impl Component for Recorder {
    fn kind(&self) -> ComponentKind {
        self.kind
    }
    fn entity(&self) -> Option<EntityId> {
        self.entity
    }
    fn set_entity(&mut self, entity: Option<EntityId>) {
        self.entity = entity;
    }
    fn did_add_to_entity(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.journal
            .borrow_mut()
            .push(format!("+{} {}", self.kind, self.tag));
    }
    fn will_remove_from_entity(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.journal
            .borrow_mut()
            .push(format!("-{} {}", self.kind, self.tag));
    }
}

fn soldier(world: &mut World, states: Vec<EntityState>) -> EntityId {
    let id = world.spawn_named("soldier");
    world
        .entity_mut(id)
        .unwrap()
        .set_state_machine(EntityStateMachine::new(states));
    id
}

#[test]
fn exit_removal_happens_before_entry_addition() {
    let journal: Journal = Rc::default();
    let mut holster = EntityState::new("holstered")
        .adding_on_entry(vec![Recorder::boxed(WEAPON, "holstered", &journal)]);
    holster.sync_remove_on_exit_with_add_on_entry();
    let armed = EntityState::new("armed")
        .adding_on_entry(vec![Recorder::boxed(WEAPON, "drawn", &journal)]);

    let mut world = World::new();
    let id = soldier(&mut world, vec![holster, armed]);
    let e = world.entity_mut(id).unwrap();

    e.enter_state("holstered").unwrap();
    e.enter_state("armed").unwrap();

    assert_eq!(
        *journal.borrow(),
        vec!["+weapon holstered", "-weapon holstered", "+weapon drawn"]
    );
    assert!(e.has_component(WEAPON));
}

#[test]
fn entry_dependency_check_sees_post_exit_entity() {
    // `aim` requires `weapon`. Leaving "armed" removes both; entering
    // "aiming" adds both again in one batch, so no warning may appear.
    #[derive(Clone)]
    struct Aim {
        entity: Option<EntityId>,
    }
    impl Component for Aim {
        fn kind(&self) -> ComponentKind {
            AIM
        }
        fn required_kinds(&self) -> &[ComponentKind] {
            &[WEAPON]
        }
        fn entity(&self) -> Option<EntityId> {
            self.entity
        }
        fn set_entity(&mut self, entity: Option<EntityId>) {
            self.entity = entity;
        }
    }

    let journal: Journal = Rc::default();
    let mut armed = EntityState::new("armed")
        .adding_on_entry(vec![Recorder::boxed(WEAPON, "a", &journal)]);
    armed.sync_remove_on_exit_with_add_on_entry();
    let aiming = EntityState::new("aiming").adding_on_entry(vec![
        Box::new(Aim { entity: None }) as Box<dyn Component>,
        Recorder::boxed(WEAPON, "b", &journal),
    ]);

    let mut world = World::new();
    let id = soldier(&mut world, vec![armed, aiming]);
    let e = world.entity_mut(id).unwrap();
    e.enter_state("armed").unwrap();
    e.enter_state("aiming").unwrap();

    assert_eq!(e.log().count(LogCategory::Warnings), 0);
    assert_eq!(e.component_kinds(), vec![AIM, WEAPON]);
}

#[test]
fn unregistered_state_changes_nothing() {
    let journal: Journal = Rc::default();
    let hooks = Rc::new(RefCell::new(0u32));
    let (h1, h2) = (Rc::clone(&hooks), Rc::clone(&hooks));
    let mut idle = EntityState::new("idle")
        .adding_on_entry(vec![Recorder::boxed(WEAPON, "idle", &journal)])
        .on_enter(move |_, _| *h1.borrow_mut() += 1)
        .on_exit(move |_, _| *h2.borrow_mut() += 1);
    idle.sync_remove_on_exit_with_add_on_entry();

    let mut world = World::new();
    let id = soldier(&mut world, vec![idle]);
    let e = world.entity_mut(id).unwrap();
    e.enter_state("idle").unwrap();
    let hooks_before = *hooks.borrow();
    let journal_before = journal.borrow().len();

    let result = e.enter_state("flying");

    assert_eq!(
        result,
        Err(CoreError::UnregisteredState {
            to: "flying".into()
        })
    );
    assert_eq!(e.current_state(), Some("idle"));
    assert_eq!(*hooks.borrow(), hooks_before);
    assert_eq!(journal.borrow().len(), journal_before);
    assert!(e.has_component(WEAPON));
}

#[test]
fn first_transition_has_no_exit() {
    let exits = Rc::new(RefCell::new(0u32));
    let counted = Rc::clone(&exits);
    let idle = EntityState::new("idle").on_exit(move |_, _| *counted.borrow_mut() += 1);

    let mut world = World::new();
    let id = soldier(&mut world, vec![idle]);
    world.entity_mut(id).unwrap().enter_state("idle").unwrap();

    assert_eq!(*exits.borrow(), 0);
    assert_eq!(
        world.log().messages_in(LogCategory::States),
        vec!["\"soldier\" nil → idle"]
    );
}

#[test]
fn exit_and_entry_each_log_the_transition() {
    let mut world = World::new();
    let id = soldier(
        &mut world,
        vec![EntityState::new("idle"), EntityState::new("run")],
    );
    let e = world.entity_mut(id).unwrap();
    e.enter_state("idle").unwrap();
    e.enter_state("run").unwrap();

    assert_eq!(
        world.log().messages_in(LogCategory::States),
        vec![
            "\"soldier\" nil → idle",
            "\"soldier\" idle → run",
            "\"soldier\" idle → run"
        ]
    );
}

#[test]
fn countdown_state_moves_itself_on_during_world_update() {
    let remaining = Rc::new(RefCell::new(0.25f64));
    let clock = Rc::clone(&remaining);
    let countdown = EntityState::new("countdown").on_update(move |e, dt| {
        let mut left = clock.borrow_mut();
        *left -= dt;
        if *left <= 0.0 {
            e.request_state("done");
        }
    });

    let mut world = World::new();
    let id = world.spawn_named("timer");
    let timer = world.entity_mut(id).unwrap();
    timer.set_state_machine(EntityStateMachine::new([countdown, EntityState::new("done")]));
    timer.enter_state("countdown").unwrap();

    world.update(0.1);
    world.update(0.1);
    assert_eq!(world.entity(id).unwrap().current_state(), Some("countdown"));

    world.update(0.1);
    assert_eq!(world.entity(id).unwrap().current_state(), Some("done"));
    assert_eq!(world.log().count(LogCategory::Warnings), 0);
}
