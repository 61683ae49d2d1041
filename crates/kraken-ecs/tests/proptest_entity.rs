//! Property tests for entity and agent-goal operations.
//!
//! These tests use `proptest` to generate random sequences of component
//! operations and verify that entity invariants hold after each step.

use glam::Vec2;
use kraken_ecs::prelude::*;
use proptest::prelude::*;

const BODY: ComponentKind = ComponentKind::new("body");
const SENSOR: ComponentKind = ComponentKind::new("sensor");
const BRAIN: ComponentKind = ComponentKind::new("brain");
const KINDS: [ComponentKind; 3] = [BODY, SENSOR, BRAIN];
const GOAL: ComponentKind = ComponentKind::new("seek_goal");

/// A component that needs nothing, or (for `brain`) needs `body` and `sensor`.
#[derive(Debug, Clone)]
struct Part {
    entity: Option<EntityId>,
    kind: ComponentKind,
}

impl Part {
    fn boxed(kind: ComponentKind) -> Box<dyn Component> {
        Box::new(Part { entity: None, kind })
    }
}

impl Component for Part {
    fn kind(&self) -> ComponentKind {
        self.kind
    }
    fn required_kinds(&self) -> &[ComponentKind] {
        if self.kind == BRAIN {
            &[BODY, SENSOR]
        } else {
            &[]
        }
    }
    fn entity(&self) -> Option<EntityId> {
        self.entity
    }
    fn set_entity(&mut self, entity: Option<EntityId>) {
        self.entity = entity;
    }
}

#[derive(Debug, Clone)]
enum PartOp {
    Add(usize),
    Remove(usize),
    Batch(Vec<usize>),
}

fn part_op_strategy() -> impl Strategy<Value = PartOp> {
    prop_oneof![
        (0..3usize).prop_map(PartOp::Add),
        (0..3usize).prop_map(PartOp::Remove),
        prop::collection::vec(0..3usize, 1..5).prop_map(PartOp::Batch),
    ]
}

fn fresh_entity() -> Entity {
    Entity::named(EntityId::new(4, 2), "subject", Logbook::new())
}

/// Weights that survive exact float comparison.
fn weight() -> impl Strategy<Value = f32> {
    (-10_000i32..10_000i32).prop_map(|v| v as f32 * 0.01)
}

fn with_seek_goal(weight: f32) -> Entity {
    let mut e = fresh_entity();
    e.add_components(vec![
        Box::new(Agent::new()) as Box<dyn Component>,
        Box::new(
            AgentGoalComponent::for_objective(Objective::Seek(Vec2::ONE))
                .with_kind(GOAL)
                .with_weight(weight),
        ),
    ]);
    e
}

fn agent_weight(e: &Entity) -> Option<f32> {
    let goal = e.component::<AgentGoalComponent>(GOAL)?.goal()?.clone();
    e.component::<Agent>(AGENT)?.behavior()?.weight(&goal)
}

fn mutations(e: &Entity) -> u64 {
    e.component::<Agent>(AGENT)
        .and_then(|a| a.behavior())
        .map(|b| b.mutation_count())
        .unwrap_or(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_entity_invariants(ops in prop::collection::vec(part_op_strategy(), 1..40)) {
        let mut e = fresh_entity();

        for op in ops {
            match op {
                PartOp::Add(k) => {
                    e.add_component(Part::boxed(KINDS[k]));
                }
                PartOp::Remove(k) => {
                    let kind = KINDS[k];
                    let was_present = e.has_component(kind);
                    let removed = e.remove_component(kind);
                    prop_assert_eq!(removed.is_some(), was_present);
                    if let Some(removed) = removed {
                        prop_assert_eq!(removed.entity(), None);
                    }
                    prop_assert!(e.component::<Part>(kind).is_none());
                }
                PartOp::Batch(ks) => {
                    let replaced = e.add_components(ks.iter().map(|&k| Part::boxed(KINDS[k])));
                    for old in &replaced {
                        prop_assert_eq!(old.entity(), None);
                    }
                }
            }

            // Invariant: kinds are unique.
            let mut kinds = e.component_kinds();
            let count = kinds.len();
            kinds.sort();
            kinds.dedup();
            prop_assert_eq!(kinds.len(), count);

            // Invariant: every attached component points back at the entity.
            for component in e.components().iter() {
                prop_assert_eq!(component.entity(), Some(e.id()));
            }
        }
    }

    #[test]
    fn complete_batch_never_warns(extra in prop::collection::vec(0..2usize, 0..4), brain_first in any::<bool>()) {
        let mut e = fresh_entity();
        let mut batch: Vec<Box<dyn Component>> = vec![Part::boxed(BODY), Part::boxed(SENSOR)];
        batch.extend(extra.iter().map(|&k| Part::boxed(KINDS[k])));
        if brain_first {
            batch.insert(0, Part::boxed(BRAIN));
        } else {
            batch.push(Part::boxed(BRAIN));
        }

        e.add_components(batch);

        prop_assert_eq!(e.log().count(LogCategory::Warnings), 0);
        prop_assert!(e.missing_dependencies(BRAIN).is_empty());
    }

    #[test]
    fn pause_round_trip_restores_weight(w in weight()) {
        let mut e = with_seek_goal(w);
        e.with_component::<AgentGoalComponent, _>(GOAL, |g, ctx| g.set_paused(ctx, true));
        prop_assert_eq!(agent_weight(&e), Some(0.0));
        prop_assert_eq!(e.component::<AgentGoalComponent>(GOAL).unwrap().weight(), w);

        e.with_component::<AgentGoalComponent, _>(GOAL, |g, ctx| g.set_paused(ctx, false));
        prop_assert_eq!(agent_weight(&e), Some(w));
        prop_assert_eq!(e.component::<AgentGoalComponent>(GOAL).unwrap().weight(), w);
    }

    #[test]
    fn apply_is_idempotent(w in weight(), paused in any::<bool>()) {
        let mut e = with_seek_goal(w);
        e.with_component::<AgentGoalComponent, _>(GOAL, |g, ctx| g.set_paused(ctx, paused));
        e.with_component::<AgentGoalComponent, _>(GOAL, |g, ctx| g.apply_goal_to_agent(ctx));
        let once = agent_weight(&e);
        e.with_component::<AgentGoalComponent, _>(GOAL, |g, ctx| g.apply_goal_to_agent(ctx));
        prop_assert_eq!(agent_weight(&e), once);
        prop_assert_eq!(e.component::<Agent>(AGENT).unwrap().behavior().unwrap().len(), 1);
    }

    #[test]
    fn redundant_weight_assignment_is_silent(w in weight()) {
        let mut e = with_seek_goal(w);
        let before = mutations(&e);
        e.with_component::<AgentGoalComponent, _>(GOAL, |g, ctx| g.set_weight(ctx, w));
        prop_assert_eq!(mutations(&e), before);
    }
}
