use allocation_core::models::allocation::AllocationTree;
use allocation_core::models::settings::Settings;
use allocation_core::models::validation::{RuleResult, ValidationReport, ValidationRule};
use allocation_core::models::weights::{NamedMap, Weights};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn weights(entries: &[(&str, f64)]) -> Weights {
    entries.iter().map(|&(k, v)| (k, v)).collect()
}

// ═══════════════════════════════════════════════════════════════════
//  NamedMap / Weights
// ═══════════════════════════════════════════════════════════════════

mod named_map {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let w = weights(&[("Zeta", 1.0), ("Alpha", 2.0), ("Mid", 3.0)]);
        let keys: Vec<&str> = w.keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn insert_existing_replaces_in_place() {
        let mut w = weights(&[("A", 1.0), ("B", 2.0)]);
        let previous = w.insert("A", 9.0);
        assert_eq!(previous, Some(1.0));
        assert_eq!(w.len(), 2);
        assert_eq!(w.keys().next(), Some("A"));
        assert_eq!(w.get("A"), Some(&9.0));
    }

    #[test]
    fn duplicates_collapse_last_write_wins() {
        let w = weights(&[("A", 1.0), ("B", 2.0), ("A", 5.0)]);
        assert_eq!(w.len(), 2);
        assert_eq!(w.get("A"), Some(&5.0));
    }

    #[test]
    fn remove_keeps_order_of_rest() {
        let mut w = weights(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);
        assert_eq!(w.remove("B"), Some(2.0));
        assert_eq!(w.remove("missing"), None);
        let keys: Vec<&str> = w.keys().collect();
        assert_eq!(keys, vec!["A", "C"]);
    }

    #[test]
    fn sum_of_empty_is_zero() {
        assert_eq!(Weights::new().sum(), 0.0);
    }

    #[test]
    fn get_or_insert_with_appends_once() {
        let mut m: NamedMap<Weights> = NamedMap::new();
        m.get_or_insert_with("A", Weights::new).insert("x", 1.0);
        m.get_or_insert_with("A", Weights::new).insert("y", 2.0);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("A").map(Weights::len), Some(2));
    }

    #[test]
    fn serializes_in_insertion_order() {
        let w = weights(&[("Zeta", 1.5), ("Alpha", 2.0)]);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"Zeta":1.5,"Alpha":2.0}"#);
    }

    #[test]
    fn deserializes_in_document_order() {
        let w: Weights = serde_json::from_str(r#"{"c": 1, "a": 2, "b": 3}"#).unwrap();
        let keys: Vec<&str> = w.keys().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn deserialize_duplicate_member_keeps_last_value() {
        let w: Weights = serde_json::from_str(r#"{"a": 1, "b": 2, "a": 7}"#).unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(w.get("a"), Some(&7.0));
    }

    #[test]
    fn deserialize_rejects_non_object() {
        assert!(serde_json::from_str::<Weights>("[1, 2]").is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  AllocationTree
// ═══════════════════════════════════════════════════════════════════

mod allocation_tree {
    use super::*;

    #[test]
    fn seeded_has_four_classes_summing_to_100() {
        let tree = AllocationTree::seeded();
        let classes: Vec<&str> = tree.macro_allocation.keys().collect();
        assert_eq!(classes, vec!["Renda Fixa", "Ações", "FIIs", "Criptomoedas"]);
        assert!(approx(tree.macro_sum(), 100.0));
        for class in classes {
            assert!(approx(tree.sub_sum(class), 100.0), "{class}");
        }
        assert_eq!(tree.holding_count(), 8);
    }

    #[test]
    fn default_is_seeded() {
        assert_eq!(AllocationTree::default(), AllocationTree::seeded());
    }

    #[test]
    fn reset_keeps_seed_classes_and_drops_holdings() {
        let mut tree = AllocationTree::empty();
        tree.set_macro("Other", 100.0);
        tree.reset();
        assert_eq!(tree.class_count(), 4);
        assert!(approx(tree.macro_sum(), 100.0));
        assert!(tree.sub.is_empty());
        assert_eq!(tree.macro_allocation.get("Ações"), Some(&30.0));
    }

    #[test]
    fn set_macro_stores_as_given_without_renormalizing() {
        let mut tree = AllocationTree::seeded();
        tree.set_macro("Ações", 150.0);
        assert_eq!(tree.macro_allocation.get("Ações"), Some(&150.0));
        assert_eq!(tree.macro_allocation.get("Renda Fixa"), Some(&40.0));
        assert!(approx(tree.macro_sum(), 220.0));
    }

    #[test]
    fn set_macro_appends_new_class() {
        let mut tree = AllocationTree::seeded();
        tree.set_macro("Internacional", 5.0);
        assert_eq!(tree.macro_allocation.keys().last(), Some("Internacional"));
    }

    #[test]
    fn set_holdings_replaces_wholesale() {
        let mut tree = AllocationTree::seeded();
        tree.set_holdings("Ações", weights(&[("WEGE3", 100.0)]));
        let holdings = tree.holdings("Ações").unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings.get("WEGE3"), Some(&100.0));
    }

    #[test]
    fn set_empty_holdings_marks_undecomposed() {
        let mut tree = AllocationTree::seeded();
        tree.set_holdings("FIIs", Weights::new());
        assert_eq!(tree.sub_sum("FIIs"), 0.0);
        assert!(tree.holdings("FIIs").unwrap().is_empty());
    }

    #[test]
    fn sub_sum_of_absent_class_is_zero() {
        let tree = AllocationTree::seeded();
        assert_eq!(tree.sub_sum("Nope"), 0.0);
    }

    #[test]
    fn macro_sum_scenario() {
        let mut tree = AllocationTree::empty();
        for (class, pct) in [("A", 40.0), ("B", 30.0), ("C", 20.0), ("D", 10.0)] {
            tree.set_macro(class, pct);
        }
        assert!(approx(tree.macro_sum(), 100.0));
    }

    #[test]
    fn first_non_finite_is_none_for_seed() {
        assert_eq!(AllocationTree::seeded().first_non_finite(), None);
    }

    #[test]
    fn first_non_finite_names_macro_entry() {
        let mut tree = AllocationTree::seeded();
        tree.set_macro("FIIs", f64::NAN);
        assert_eq!(tree.first_non_finite().as_deref(), Some("macro.FIIs"));
    }

    #[test]
    fn first_non_finite_names_holding_entry() {
        let mut tree = AllocationTree::seeded();
        tree.set_holdings("Ações", weights(&[("PETR4", f64::INFINITY)]));
        assert_eq!(tree.first_non_finite().as_deref(), Some("sub.Ações.PETR4"));
    }

    #[test]
    fn holding_count_ignores_classes_missing_from_macro() {
        let mut tree = AllocationTree::empty();
        tree.set_macro("A", 100.0);
        tree.set_holdings("A", weights(&[("x", 100.0)]));
        tree.set_holdings("Ghost", weights(&[("y", 50.0), ("z", 50.0)]));
        assert_eq!(tree.holding_count(), 1);
    }

    #[test]
    fn serializes_with_macro_and_sub_keys() {
        let mut tree = AllocationTree::empty();
        tree.set_macro("Ações", 100.0);
        tree.set_holdings("Ações", weights(&[("PETR4", 100.0)]));
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"{"macro":{"Ações":100.0},"sub":{"Ações":{"PETR4":100.0}}}"#);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  derive_values
// ═══════════════════════════════════════════════════════════════════

mod derive_values {
    use super::*;

    fn acoes_tree() -> AllocationTree {
        let mut tree = AllocationTree::empty();
        tree.set_macro("Ações", 30.0);
        tree.set_holdings("Ações", weights(&[("PETR4", 50.0), ("VALE3", 50.0)]));
        tree
    }

    #[test]
    fn scenario_class_and_holding_values() {
        let values = acoes_tree().derive_values(100_000.0);
        let class = values.class("Ações").unwrap();
        assert!(approx(class.value, 30_000.0));
        assert!(approx(values.holding_value("Ações", "PETR4").unwrap(), 15_000.0));
        assert!(approx(values.holding_value("Ações", "VALE3").unwrap(), 15_000.0));
    }

    #[test]
    fn share_of_total_is_class_times_holding() {
        let values = acoes_tree().derive_values(100_000.0);
        let petr = &values.class("Ações").unwrap().holdings[0];
        assert!(approx(petr.share_of_total_pct, 15.0));
    }

    #[test]
    fn works_when_sums_are_not_100() {
        let mut tree = acoes_tree();
        tree.set_macro("FIIs", 90.0);
        tree.set_holdings("FIIs", weights(&[("MXRF11", 30.0)]));
        let values = tree.derive_values(1_000.0);
        assert!(approx(values.allocated_value(), 1_200.0));
        assert!(approx(values.holding_value("FIIs", "MXRF11").unwrap(), 270.0));
    }

    #[test]
    fn undecomposed_class_has_no_holding_values() {
        let mut tree = AllocationTree::empty();
        tree.set_macro("Cripto", 100.0);
        let values = tree.derive_values(500.0);
        assert!(values.class("Cripto").unwrap().holdings.is_empty());
        assert!(approx(values.class("Cripto").unwrap().value, 500.0));
    }

    #[test]
    fn holdings_without_macro_class_are_skipped() {
        let mut tree = acoes_tree();
        tree.set_holdings("Ghost", weights(&[("x", 100.0)]));
        let values = tree.derive_values(100.0);
        assert_eq!(values.classes.len(), 1);
        assert!(values.class("Ghost").is_none());
    }

    #[test]
    fn classes_follow_macro_order() {
        let tree = AllocationTree::seeded();
        let names: Vec<String> = tree
            .derive_values(1.0)
            .classes
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Renda Fixa", "Ações", "FIIs", "Criptomoedas"]);
    }

    #[test]
    fn zero_patrimony_gives_zero_values() {
        let values = AllocationTree::seeded().derive_values(0.0);
        assert_eq!(values.allocated_value(), 0.0);
        assert!(values
            .classes
            .iter()
            .flat_map(|c| c.holdings.iter())
            .all(|h| h.value == 0.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Validation report types
// ═══════════════════════════════════════════════════════════════════

mod validation_report {
    use super::*;

    #[test]
    fn rule_display_names() {
        let names: Vec<String> = ValidationRule::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            names,
            vec!["Alocação Macro", "Sub-alocações", "Nomes dos Ativos", "Valores Negativos"]
        );
    }

    #[test]
    fn is_valid_requires_every_rule() {
        let report = ValidationReport {
            results: vec![
                RuleResult::pass(ValidationRule::MacroAllocation, "ok"),
                RuleResult::fail(ValidationRule::SubAllocations, "bad"),
            ],
        };
        assert!(!report.is_valid());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.get(ValidationRule::SubAllocations).map(|r| r.message.as_str()),
            Some("bad")
        );
        assert!(report.get(ValidationRule::AssetNames).is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.target, 100.0);
        assert_eq!(s.tolerance, 0.01);
        assert_eq!(s.total_patrimony, 100_000.0);
        assert_eq!(s.currency_symbol, "R$");
    }

    #[test]
    fn serde_roundtrip_json() {
        let s = Settings {
            currency_symbol: "US$".into(),
            ..Settings::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
