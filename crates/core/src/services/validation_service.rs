use log::debug;

use crate::models::allocation::AllocationTree;
use crate::models::settings::{Settings, DEFAULT_TARGET, DEFAULT_TOLERANCE};
use crate::models::validation::{RuleResult, ValidationReport, ValidationRule};

/// Decides whether the sums of an allocation tree satisfy the target.
///
/// Pure business logic: never mutates the tree, never fails. Every problem
/// it finds is reported as a failed `RuleResult`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationValidator {
    target: f64,
    tolerance: f64,
}

impl AllocationValidator {
    /// Target 100, tolerance 0.01.
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_TARGET, DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_tolerance(settings.target, settings.tolerance)
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// True iff `|sum(values) - target| <= tolerance`.
    ///
    /// An empty input is never balanced. Undecomposed classes are skipped
    /// by `validate_sub` before they ever reach this check.
    pub fn is_balanced<I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        for v in values {
            count += 1;
            sum += v;
        }
        count > 0 && (sum - self.target).abs() <= self.tolerance
    }

    /// Rule 1: class percentages sum to the target.
    pub fn validate_macro(&self, tree: &AllocationTree) -> RuleResult {
        let rule = ValidationRule::MacroAllocation;
        if self.is_balanced(tree.macro_allocation.values().copied()) {
            return RuleResult::pass(rule, "Alocação macro válida");
        }
        RuleResult::fail(
            rule,
            format!(
                "Soma das alocações macro: {:.2}% (deve ser {}%)",
                tree.macro_sum(),
                self.target
            ),
        )
    }

    /// Rule 2: every class with holdings sums to the target. Classes with
    /// no holdings are undecomposed and skipped.
    pub fn validate_sub(&self, tree: &AllocationTree) -> RuleResult {
        let rule = ValidationRule::SubAllocations;
        let errors: Vec<String> = tree
            .sub
            .iter()
            .filter(|(_, holdings)| !holdings.is_empty())
            .filter(|(_, holdings)| !self.is_balanced(holdings.values().copied()))
            .map(|(class, holdings)| {
                format!("{class}: {:.2}% ≠ {}%", holdings.sum(), self.target)
            })
            .collect();

        if errors.is_empty() {
            RuleResult::pass(rule, "Todas sub-alocações válidas")
        } else {
            RuleResult::fail(rule, errors.join(" | "))
        }
    }

    /// Rule 3: no holding name is empty or whitespace-only.
    pub fn validate_names(&self, tree: &AllocationTree) -> RuleResult {
        let rule = ValidationRule::AssetNames;
        let blank: Vec<&str> = tree
            .sub
            .iter()
            .filter(|(_, holdings)| holdings.keys().any(|name| name.trim().is_empty()))
            .map(|(class, _)| class)
            .collect();

        if blank.is_empty() {
            RuleResult::pass(rule, "Todos os nomes são válidos")
        } else {
            RuleResult::fail(
                rule,
                format!("Nomes de ativos vazios encontrados em: {}", blank.join(", ")),
            )
        }
    }

    /// Rule 4: no class or holding percentage is negative.
    pub fn validate_negative(&self, tree: &AllocationTree) -> RuleResult {
        let rule = ValidationRule::NegativeValues;
        let mut negative: Vec<String> = tree
            .macro_allocation
            .iter()
            .filter(|(_, &v)| v < 0.0)
            .map(|(class, v)| format!("{class} macro: {v}"))
            .collect();

        for (class, holdings) in tree.sub.iter() {
            negative.extend(
                holdings
                    .iter()
                    .filter(|(_, &v)| v < 0.0)
                    .map(|(name, v)| format!("{class}/{name}: {v}")),
            );
        }

        if negative.is_empty() {
            RuleResult::pass(rule, "Todos os valores são positivos")
        } else {
            RuleResult::fail(rule, format!("Valores negativos: {}", negative.join(", ")))
        }
    }

    /// Run all four rules. The report always has exactly four results, in
    /// `ValidationRule::ALL` order.
    pub fn full_validation(&self, tree: &AllocationTree) -> ValidationReport {
        let results = vec![
            self.validate_macro(tree),
            self.validate_sub(tree),
            self.validate_names(tree),
            self.validate_negative(tree),
        ];
        let report = ValidationReport { results };
        debug!(
            "full validation: {} of {} rules passed",
            report.iter().filter(|r| r.passed).count(),
            report.len()
        );
        report
    }
}

impl Default for AllocationValidator {
    fn default() -> Self {
        Self::new()
    }
}
