use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::allocation::AllocationTree;
use crate::models::weights::Weights;
use crate::services::validation_service::AllocationValidator;

/// What an auto-correction did to a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RebalanceOutcome {
    /// Sum was already within tolerance; nothing changed.
    AlreadyBalanced,
    /// Entries were rescaled proportionally from `previous_sum`.
    Rescaled { previous_sum: f64 },
    /// Sum was zero (or not positive); proportional rescaling is undefined,
    /// nothing changed. The caller picks a fallback such as `equal_split`.
    ZeroSum,
}

/// Repair strategies for percentage mappings.
///
/// Proportional rebalancing keeps the ratios between entries and is the
/// automatic correction for a sum mismatch. Equal split throws the existing
/// weighting away and is only for an explicit "balance evenly" request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebalancer {
    validator: AllocationValidator,
}

impl Rebalancer {
    pub fn new() -> Self {
        Self::with_validator(AllocationValidator::new())
    }

    pub fn with_validator(validator: AllocationValidator) -> Self {
        Self { validator }
    }

    #[must_use]
    pub fn validator(&self) -> &AllocationValidator {
        &self.validator
    }

    /// Rescale every entry by `target / sum` so the result sums to the target.
    ///
    /// Zero entries stay zero. When the sum is not positive the mapping is
    /// returned unchanged.
    #[must_use]
    pub fn rebalance_proportional(&self, weights: &Weights) -> Weights {
        let sum = weights.sum();
        if sum <= 0.0 || sum.is_nan() {
            debug!("proportional rebalance skipped: sum is {sum}");
            return weights.clone();
        }
        let factor = self.validator.target() / sum;
        weights.iter().map(|(name, &v)| (name, v * factor)).collect()
    }

    /// Assign `target / n` to each distinct key.
    pub fn equal_split<I, S>(&self, keys: I) -> Result<Weights, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut split: Weights = keys.into_iter().map(|k| (k, 0.0)).collect();
        if split.is_empty() {
            return Err(CoreError::EmptyAllocation(
                "equal split needs at least one key".into(),
            ));
        }
        let share = self.validator.target() / split.len() as f64;
        for (_, v) in split.iter_mut() {
            *v = share;
        }
        Ok(split)
    }

    /// Proportionally rescale the class percentages when they miss the target.
    pub fn auto_correct_macro(&self, tree: &mut AllocationTree) -> RebalanceOutcome {
        let outcome = self.correct(&mut tree.macro_allocation);
        if let RebalanceOutcome::Rescaled { previous_sum } = outcome {
            info!("macro allocation rescaled from {previous_sum:.2}% to {}%", self.validator.target());
        }
        outcome
    }

    /// Proportionally rescale one class's holdings when they miss the target.
    ///
    /// An undecomposed class (empty holdings) sums to zero and is reported
    /// as `ZeroSum`.
    pub fn auto_correct_holdings(
        &self,
        tree: &mut AllocationTree,
        class_name: &str,
    ) -> Result<RebalanceOutcome, CoreError> {
        let holdings = tree
            .sub
            .get_mut(class_name)
            .ok_or_else(|| CoreError::ClassNotFound(class_name.to_string()))?;
        let outcome = self.correct(holdings);
        if let RebalanceOutcome::Rescaled { previous_sum } = outcome {
            info!("{class_name} holdings rescaled from {previous_sum:.2}%");
        }
        Ok(outcome)
    }

    /// Split a class's existing holdings evenly.
    pub fn balance_evenly(
        &self,
        tree: &mut AllocationTree,
        class_name: &str,
    ) -> Result<(), CoreError> {
        let holdings = tree
            .holdings(class_name)
            .ok_or_else(|| CoreError::ClassNotFound(class_name.to_string()))?;
        if holdings.is_empty() {
            return Err(CoreError::EmptyAllocation(format!(
                "{class_name} has no holdings to balance"
            )));
        }
        let split = self.equal_split(holdings.keys().map(str::to_string))?;
        tree.set_holdings(class_name, split);
        Ok(())
    }

    /// Split the class percentages evenly.
    pub fn balance_macro_evenly(&self, tree: &mut AllocationTree) -> Result<(), CoreError> {
        let split = self.equal_split(tree.macro_allocation.keys().map(str::to_string))?;
        tree.macro_allocation = split;
        debug!("macro allocation split evenly over {} classes", tree.class_count());
        Ok(())
    }

    fn correct(&self, weights: &mut Weights) -> RebalanceOutcome {
        let previous_sum = weights.sum();
        if self.validator.is_balanced(weights.values().copied()) {
            return RebalanceOutcome::AlreadyBalanced;
        }
        if previous_sum <= 0.0 || previous_sum.is_nan() {
            return RebalanceOutcome::ZeroSum;
        }
        *weights = self.rebalance_proportional(weights);
        RebalanceOutcome::Rescaled { previous_sum }
    }
}

impl Default for Rebalancer {
    fn default() -> Self {
        Self::new()
    }
}
