use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::models::allocation::AllocationTree;
use crate::models::weights::Weights;
use crate::services::rebalance_service::Rebalancer;

/// Name given to the single holding of a class opened for editing with none.
pub const PLACEHOLDER_HOLDING: &str = "Ativo 1";

/// One row of an editable holdings table, as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRow {
    /// Missing when the user left the cell blank
    pub name: Option<String>,
    pub percent: f64,
}

impl HoldingRow {
    pub fn new(name: impl Into<String>, percent: f64) -> Self {
        Self {
            name: Some(name.into()),
            percent,
        }
    }
}

/// What applying a set of edited rows did to a class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EditOutcome {
    /// Rows were stored as entered (already summing to the target).
    Stored,
    /// Rows were stored after proportional rescaling from `previous_sum`.
    Rebalanced { previous_sum: f64 },
    /// No usable rows, or rows summing to zero: the class was left alone.
    Unchanged,
}

/// The boundary where user-edited rows become model data.
///
/// Trimming and name uniqueness are enforced here and nowhere deeper.
pub struct EditorService;

impl EditorService {
    pub fn new() -> Self {
        Self
    }

    /// Convert edited rows into a holdings map.
    ///
    /// Rows with a missing or blank name are dropped, names are trimmed, and
    /// a repeated name keeps the last row's percentage.
    pub fn rows_to_weights(&self, rows: &[HoldingRow]) -> Weights {
        rows.iter()
            .filter_map(|row| {
                let name = row.name.as_deref()?.trim();
                (!name.is_empty()).then_some((name, row.percent))
            })
            .collect()
    }

    /// Clamp a slider value into [0, 100]. Non-finite input becomes 0.
    #[must_use]
    pub fn clamp_percent(&self, percent: f64) -> f64 {
        if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Store a class percentage after clamping it.
    pub fn set_macro_clamped(&self, tree: &mut AllocationTree, class_name: &str, percent: f64) {
        let clamped = self.clamp_percent(percent);
        if clamped != percent {
            debug!("{class_name}: {percent} clamped to {clamped}");
        }
        tree.set_macro(class_name, clamped);
    }

    /// Holdings a class starts with when opened for editing with none.
    #[must_use]
    pub fn placeholder_holdings(&self) -> Weights {
        std::iter::once((PLACEHOLDER_HOLDING, 100.0)).collect()
    }

    /// Holdings to show in the editor for a class: its current holdings, or
    /// the placeholder when it has none.
    #[must_use]
    pub fn holdings_for_editing(&self, tree: &AllocationTree, class_name: &str) -> Weights {
        match tree.holdings(class_name) {
            Some(holdings) if !holdings.is_empty() => holdings.clone(),
            _ => self.placeholder_holdings(),
        }
    }

    /// Append a new holding at 0% and return its name.
    ///
    /// The name is `Ativo {n+1}` for a class with `n` holdings, moving up to
    /// the next free number if that one is taken. Creates the class's `sub`
    /// entry if it had none.
    pub fn add_holding(&self, tree: &mut AllocationTree, class_name: &str) -> String {
        let holdings = tree.sub.get_or_insert_with(class_name, Weights::new);
        let name = (holdings.len() + 1..)
            .map(|n| format!("Ativo {n}"))
            .find(|name| !holdings.contains_key(name))
            .unwrap_or_default();
        holdings.insert(name.clone(), 0.0);
        debug!("{class_name}: added holding {name}");
        name
    }

    /// Replace a class's holdings with edited rows.
    ///
    /// A sum mismatch is corrected proportionally. Rows that convert to an
    /// empty map or sum to zero leave the class untouched.
    pub fn apply_holding_rows(
        &self,
        tree: &mut AllocationTree,
        class_name: &str,
        rows: &[HoldingRow],
        rebalancer: &Rebalancer,
    ) -> EditOutcome {
        let mut holdings = self.rows_to_weights(rows);
        if holdings.is_empty() {
            return EditOutcome::Unchanged;
        }

        let previous_sum = holdings.sum();
        if previous_sum <= 0.0 || previous_sum.is_nan() {
            warn!("{class_name}: edited holdings sum to {previous_sum}, keeping previous holdings");
            return EditOutcome::Unchanged;
        }

        if rebalancer.validator().is_balanced(holdings.values().copied()) {
            tree.set_holdings(class_name, holdings);
            return EditOutcome::Stored;
        }

        warn!("{class_name}: rebalancing holdings to 100% (was {previous_sum:.1}%)");
        holdings = rebalancer.rebalance_proportional(&holdings);
        tree.set_holdings(class_name, holdings);
        EditOutcome::Rebalanced { previous_sum }
    }
}

impl Default for EditorService {
    fn default() -> Self {
        Self::new()
    }
}
