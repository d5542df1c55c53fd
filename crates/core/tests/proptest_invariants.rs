//! Property-based tests for allocation invariants.
//!
//! These tests use proptest to verify that the rebalancing, validation and
//! derivation laws hold across randomly generated allocations.

use allocation_core::models::allocation::AllocationTree;
use allocation_core::models::weights::Weights;
use allocation_core::services::rebalance_service::Rebalancer;
use allocation_core::services::validation_service::AllocationValidator;
use allocation_core::storage::format::{export_json, import_json};
use allocation_core::storage::session::SessionSnapshot;
use proptest::prelude::*;

/// Generate a holding or class name (may collide, which exercises dedup)
fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{0,5}"
}

/// Generate a percentage in the editable range, two decimals
fn percent_strategy() -> impl Strategy<Value = f64> {
    (0u32..=10_000u32).prop_map(|cents| f64::from(cents) / 100.0)
}

/// Generate a non-empty mapping of names to percentages
fn weights_strategy() -> impl Strategy<Value = Weights> {
    prop::collection::vec((name_strategy(), percent_strategy()), 1..12)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Generate a whole tree; some classes get no holdings
fn tree_strategy() -> impl Strategy<Value = AllocationTree> {
    prop::collection::vec(
        (
            name_strategy(),
            percent_strategy(),
            prop::option::of(weights_strategy()),
        ),
        0..8,
    )
    .prop_map(|classes| {
        let mut tree = AllocationTree::empty();
        for (class, pct, holdings) in classes {
            tree.set_macro(&class, pct);
            tree.set_holdings(&class, holdings.unwrap_or_default());
        }
        tree
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // REBALANCING
    // ========================================================================

    /// An equal split always satisfies the 100% rule
    #[test]
    fn equal_split_is_balanced(keys in prop::collection::vec(name_strategy(), 1..50)) {
        let split = Rebalancer::new().equal_split(keys).unwrap();
        prop_assert!(AllocationValidator::new().is_balanced(split.values().copied()));
    }

    /// Proportional rebalance sums to 100 and scales every entry by 100/S
    #[test]
    fn proportional_rebalance_scales_uniformly(weights in weights_strategy()) {
        let sum = weights.sum();
        prop_assume!(sum > 0.0);

        let out = Rebalancer::new().rebalance_proportional(&weights);
        prop_assert!((out.sum() - 100.0).abs() <= 0.01);

        let factor = 100.0 / sum;
        for (name, &before) in weights.iter() {
            let after = *out.get(name).unwrap();
            prop_assert!((after - before * factor).abs() < 1e-9,
                "{} scaled to {} instead of {}", name, after, before * factor);
        }
    }

    /// Rebalancing an all-zero mapping changes nothing
    #[test]
    fn zero_mapping_is_unchanged(keys in prop::collection::vec(name_strategy(), 1..20)) {
        let zeros: Weights = keys.into_iter().map(|k| (k, 0.0)).collect();
        prop_assert_eq!(Rebalancer::new().rebalance_proportional(&zeros), zeros);
    }

    // ========================================================================
    // DERIVATION
    // ========================================================================

    /// Doubling the patrimony doubles every derived value
    #[test]
    fn derive_values_is_linear(tree in tree_strategy(), total in 0.0f64..1e9) {
        let once = tree.derive_values(total);
        let twice = tree.derive_values(total * 2.0);

        for (a, b) in once.classes.iter().zip(&twice.classes) {
            prop_assert!((b.value - 2.0 * a.value).abs() <= 1e-6 * (1.0 + a.value.abs()));
            for (ha, hb) in a.holdings.iter().zip(&b.holdings) {
                prop_assert!((hb.value - 2.0 * ha.value).abs() <= 1e-6 * (1.0 + ha.value.abs()));
            }
        }
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    /// Four results, always, whatever the tree
    #[test]
    fn full_validation_has_four_results(tree in tree_strategy()) {
        prop_assert_eq!(AllocationValidator::new().full_validation(&tree).len(), 4);
    }

    /// A class without holdings never fails the sub-allocation rule
    #[test]
    fn undecomposed_classes_never_fail_sub_rule(tree in tree_strategy()) {
        let mut undecomposed = tree.clone();
        let classes: Vec<String> = undecomposed.macro_allocation.keys().map(str::to_string).collect();
        for class in &classes {
            undecomposed.set_holdings(class, Weights::new());
        }
        let result = AllocationValidator::new().validate_sub(&undecomposed);
        prop_assert!(result.passed);
    }

    // ========================================================================
    // EXCHANGE FORMAT
    // ========================================================================

    /// Rescaled values (full precision, not two decimals) survive the
    /// exchange format and the session snapshot exactly
    #[test]
    fn rebalanced_json_roundtrip(macro_w in weights_strategy(), holdings in weights_strategy()) {
        prop_assume!(macro_w.sum() > 0.0 && holdings.sum() > 0.0);
        let rebalancer = Rebalancer::new();
        let mut tree = AllocationTree::empty();
        tree.macro_allocation = rebalancer.rebalance_proportional(&macro_w);
        let first = tree.macro_allocation.keys().next().unwrap().to_string();
        tree.set_holdings(&first, rebalancer.rebalance_proportional(&holdings));

        let json = export_json(&tree).unwrap();
        let outcome = import_json(&json, &AllocationValidator::new()).unwrap();
        prop_assert_eq!(&outcome.tree, &tree);

        let snapshot = SessionSnapshot {
            tree: tree.clone(),
            total_patrimony: 100_000.0,
            saved_at: chrono::Utc::now(),
        };
        let back = SessionSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.tree, tree);
    }

    /// Export then import reproduces macro and sub exactly
    #[test]
    fn json_roundtrip(tree in tree_strategy()) {
        let json = export_json(&tree).unwrap();
        let outcome = import_json(&json, &AllocationValidator::new()).unwrap();
        prop_assert_eq!(outcome.tree, tree);
    }
}
