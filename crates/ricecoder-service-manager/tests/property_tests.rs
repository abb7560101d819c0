//! Property-based tests for registration and lookup invariants

use std::collections::HashSet;

use proptest::prelude::*;
use ricecoder_service_manager::*;

fn arb_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,15}"
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Factory,
    Invokable,
    Alias,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Factory), Just(Op::Invokable), Just(Op::Alias)]
}

fn apply(repository: &DependenciesRepository, op: Op, id: &str) {
    match op {
        Op::Factory => repository.set_factory(id, "SomeFactory").unwrap(),
        Op::Invokable => repository.set_invokable(id).unwrap(),
        Op::Alias => repository.set_alias(id, "Target").unwrap(),
    }
}

fn rank(kind: DependencyKind) -> u8 {
    match kind {
        DependencyKind::Alias => 3,
        DependencyKind::Invokable => 2,
        DependencyKind::Factory => 1,
    }
}

fn op_kind(op: Op) -> DependencyKind {
    match op {
        Op::Factory => DependencyKind::Factory,
        Op::Invokable => DependencyKind::Invokable,
        Op::Alias => DependencyKind::Alias,
    }
}

proptest! {
    #[test]
    fn test_unregistered_identifiers_fail(
        registered in prop::collection::hash_set(arb_id(), 0..10),
        probe in arb_id(),
    ) {
        prop_assume!(!registered.contains(&probe));

        let repository = DependenciesRepository::new();
        for id in &registered {
            repository.set_invokable(id).unwrap();
        }

        prop_assert!(!repository.has(&probe));
        let is_unknown = matches!(
            repository.get(&probe),
            Err(DIError::UnknownIdentifier { .. })
        );
        prop_assert!(is_unknown);
        prop_assert_eq!(repository.len(), registered.len());
    }

    #[test]
    fn test_highest_precedence_kind_wins(
        id in arb_id(),
        ops in prop::collection::vec(arb_op(), 1..6),
    ) {
        let repository = DependenciesRepository::new();
        for op in &ops {
            apply(&repository, *op, &id);
        }

        let expected = ops
            .iter()
            .map(|op| op_kind(*op))
            .max_by_key(|kind| rank(*kind))
            .unwrap();
        prop_assert_eq!(repository.get_type(&id).unwrap(), expected);
    }

    #[test]
    fn test_merged_view_has_unique_identifiers(
        entries in prop::collection::vec((arb_id(), arb_op()), 0..30),
    ) {
        let repository = DependenciesRepository::new();
        for (id, op) in &entries {
            apply(&repository, *op, id);
        }

        let dependencies = repository.get_dependencies();
        let ids: HashSet<_> = dependencies.iter().map(|dep| dep.id.clone()).collect();
        prop_assert_eq!(ids.len(), dependencies.len());
        prop_assert_eq!(dependencies.len(), repository.len());

        for dependency in &dependencies {
            prop_assert_eq!(repository.get_type(&dependency.id).unwrap(), dependency.kind);
        }
    }

    #[test]
    fn test_bind_without_override_preserves_existing(
        existing in prop::collection::hash_set(arb_id(), 1..8),
        incoming in prop::collection::hash_set(arb_id(), 1..8),
    ) {
        let manager = ServiceManager::default();
        let first = DependenciesRepository::new();
        for id in &existing {
            first.set_factory(id, "Original").unwrap();
        }
        manager.bind(&first).unwrap();

        let second = DependenciesRepository::new();
        for id in &incoming {
            second.set_factory(id, "Replacement").unwrap();
        }
        let result = manager.bind(&second);

        if existing.is_disjoint(&incoming) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(manager.dependencies_manager().len(), existing.len() + incoming.len());
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(manager.dependencies_manager().len(), existing.len());
            for id in &existing {
                let concrete = manager.dependencies_manager().get(id).unwrap();
                prop_assert_eq!(concrete.class_name(), Some("Original"));
            }
        }
    }
}
