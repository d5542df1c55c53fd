pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use log::{debug, info};
use models::{
    allocation::AllocationTree,
    settings::Settings,
    validation::ValidationReport,
    valuation::DerivedValues,
    weights::Weights,
};
use services::{
    editor_service::{EditOutcome, EditorService, HoldingRow},
    rebalance_service::{RebalanceOutcome, Rebalancer},
    report_service::{self, AllocationStatistics, ReportService, SummaryRow},
    validation_service::AllocationValidator,
};
use storage::{
    csv_export, format,
    session::{SessionSnapshot, SessionStore},
};

use errors::CoreError;

/// Main entry point for the allocation-core library.
///
/// Holds one allocation tree and the total patrimony it is applied to.
/// The caller owns the planner and passes it around explicitly; there is
/// no process-wide session.
#[must_use]
pub struct AllocationPlanner {
    tree: AllocationTree,
    settings: Settings,
    validator: AllocationValidator,
    rebalancer: Rebalancer,
    editor: EditorService,
    report_service: ReportService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
    last_saved: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AllocationPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationPlanner")
            .field("classes", &self.tree.class_count())
            .field("holdings", &self.tree.holding_count())
            .field("total_patrimony", &self.settings.total_patrimony)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl AllocationPlanner {
    /// A planner seeded with the default tree and default settings.
    pub fn create_new() -> Self {
        Self::build(AllocationTree::seeded(), Settings::default())
    }

    /// A seeded planner using custom settings.
    pub fn with_settings(settings: Settings) -> Result<Self, CoreError> {
        Self::from_tree(AllocationTree::seeded(), settings)
    }

    /// Wrap an existing tree. The tree is kept as-is, valid or not.
    pub fn from_tree(tree: AllocationTree, settings: Settings) -> Result<Self, CoreError> {
        check_patrimony(settings.total_patrimony)?;
        Ok(Self::build(tree, settings))
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn tree(&self) -> &AllocationTree {
        &self.tree
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn total_patrimony(&self) -> f64 {
        self.settings.total_patrimony
    }

    /// Whether there are unsaved changes since the last save/load.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Set the patrimony values are derived from. Must be finite and >= 0.
    pub fn set_total_patrimony(&mut self, total: f64) -> Result<(), CoreError> {
        check_patrimony(total)?;
        self.settings.total_patrimony = total;
        self.dirty = true;
        Ok(())
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Set a class percentage from a slider, clamped to [0, 100].
    pub fn set_macro(&mut self, class_name: &str, percent: f64) {
        self.editor
            .set_macro_clamped(&mut self.tree, class_name, percent);
        self.dirty = true;
    }

    /// Replace a class's holdings as given (no rebalancing).
    pub fn set_holdings(&mut self, class_name: &str, holdings: Weights) {
        self.tree.set_holdings(class_name, holdings);
        self.dirty = true;
    }

    /// Apply edited table rows to a class, rebalancing proportionally when
    /// they miss 100%.
    pub fn apply_holding_rows(&mut self, class_name: &str, rows: &[HoldingRow]) -> EditOutcome {
        let outcome =
            self.editor
                .apply_holding_rows(&mut self.tree, class_name, rows, &self.rebalancer);
        if outcome != EditOutcome::Unchanged {
            self.dirty = true;
        }
        outcome
    }

    /// Append an `Ativo N` holding at 0% to a class. Returns its name.
    pub fn add_holding(&mut self, class_name: &str) -> String {
        let name = self.editor.add_holding(&mut self.tree, class_name);
        self.dirty = true;
        name
    }

    /// Holdings to present in an editor for a class (placeholder if none).
    #[must_use]
    pub fn holdings_for_editing(&self, class_name: &str) -> Weights {
        self.editor.holdings_for_editing(&self.tree, class_name)
    }

    /// Replace the tree with the seed classes and no holdings.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.dirty = true;
    }

    // ── Validation & Rebalancing ────────────────────────────────────

    pub fn validate(&self) -> ValidationReport {
        self.validator.full_validation(&self.tree)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn auto_correct_macro(&mut self) -> RebalanceOutcome {
        let outcome = self.rebalancer.auto_correct_macro(&mut self.tree);
        if matches!(outcome, RebalanceOutcome::Rescaled { .. }) {
            self.dirty = true;
        }
        outcome
    }

    pub fn auto_correct_holdings(&mut self, class_name: &str) -> Result<RebalanceOutcome, CoreError> {
        let outcome = self
            .rebalancer
            .auto_correct_holdings(&mut self.tree, class_name)?;
        if matches!(outcome, RebalanceOutcome::Rescaled { .. }) {
            self.dirty = true;
        }
        Ok(outcome)
    }

    /// "Balance evenly" for one class's holdings.
    pub fn balance_evenly(&mut self, class_name: &str) -> Result<(), CoreError> {
        self.rebalancer.balance_evenly(&mut self.tree, class_name)?;
        self.dirty = true;
        Ok(())
    }

    /// "Balance evenly" for the class percentages.
    pub fn balance_macro_evenly(&mut self) -> Result<(), CoreError> {
        self.rebalancer.balance_macro_evenly(&mut self.tree)?;
        self.dirty = true;
        Ok(())
    }

    // ── Values & Reports ────────────────────────────────────────────

    pub fn derive_values(&self) -> DerivedValues {
        self.tree.derive_values(self.settings.total_patrimony)
    }

    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.report_service
            .summary_rows(&self.tree, self.settings.total_patrimony)
    }

    pub fn statistics(&self) -> AllocationStatistics {
        self.report_service.statistics(&self.tree)
    }

    /// Format an amount with the configured currency symbol.
    #[must_use]
    pub fn format_currency(&self, value: f64) -> String {
        report_service::format_currency(value, &self.settings.currency_symbol)
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// The tree in the JSON exchange format.
    pub fn export_json(&self) -> Result<String, CoreError> {
        format::export_json(&self.tree)
    }

    /// Replace the tree with an imported one.
    ///
    /// A structurally invalid payload is rejected and leaves the current
    /// tree untouched. Anything else is accepted without rebalancing; the
    /// returned report carries its validation warnings.
    pub fn import_json(&mut self, json: &str) -> Result<ValidationReport, CoreError> {
        let outcome = format::import_json(json, &self.validator)?;
        self.tree = outcome.tree;
        self.dirty = true;
        Ok(outcome.report)
    }

    pub fn export_values_csv(&self) -> Result<String, CoreError> {
        csv_export::export_values_csv(&self.tree, self.settings.total_patrimony)
    }

    pub fn export_breakdown_csv(&self) -> Result<String, CoreError> {
        csv_export::export_breakdown_csv(&self.tree)
    }

    // ── Session Store ───────────────────────────────────────────────

    /// Write tree and patrimony to a store under `key`.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_store(&mut self, store: &mut dyn SessionStore, key: &str) -> Result<(), CoreError> {
        let snapshot = SessionSnapshot {
            tree: self.tree.clone(),
            total_patrimony: self.settings.total_patrimony,
            saved_at: Utc::now(),
        };
        store.put(key, snapshot.to_json()?)?;
        self.last_saved = Some(snapshot.saved_at);
        self.dirty = false;
        debug!("session saved under {key}");
        Ok(())
    }

    /// Read a planner from a store. A missing key yields a freshly seeded
    /// planner; the stored patrimony overrides `settings.total_patrimony`.
    pub fn load_from_store(
        store: &dyn SessionStore,
        key: &str,
        settings: Settings,
    ) -> Result<Self, CoreError> {
        let Some(json) = store.get(key)? else {
            info!("no session under {key}, starting from the default allocation");
            return Self::with_settings(settings);
        };
        let snapshot = SessionSnapshot::from_json(&json)?;
        let settings = Settings {
            total_patrimony: snapshot.total_patrimony,
            ..settings
        };
        let mut planner = Self::from_tree(snapshot.tree, settings)?;
        planner.last_saved = Some(snapshot.saved_at);
        Ok(planner)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(tree: AllocationTree, settings: Settings) -> Self {
        let validator = AllocationValidator::from_settings(&settings);
        let rebalancer = Rebalancer::with_validator(validator);

        Self {
            tree,
            settings,
            validator,
            rebalancer,
            editor: EditorService::new(),
            report_service: ReportService::new(),
            dirty: false,
            last_saved: None,
        }
    }
}

impl Default for AllocationPlanner {
    fn default() -> Self {
        Self::create_new()
    }
}

fn check_patrimony(total: f64) -> Result<(), CoreError> {
    if total.is_finite() && total >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidPatrimony(total))
    }
}
