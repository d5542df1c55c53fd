use serde::{Deserialize, Serialize};

/// The four independent checks run by a full validation, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationRule {
    /// Asset class percentages sum to the target
    MacroAllocation,
    /// Every decomposed class's holdings sum to the target
    SubAllocations,
    /// No holding name is empty or whitespace-only
    AssetNames,
    /// No class or holding percentage is negative
    NegativeValues,
}

impl ValidationRule {
    pub const ALL: [ValidationRule; 4] = [
        ValidationRule::MacroAllocation,
        ValidationRule::SubAllocations,
        ValidationRule::AssetNames,
        ValidationRule::NegativeValues,
    ];
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationRule::MacroAllocation => write!(f, "Alocação Macro"),
            ValidationRule::SubAllocations => write!(f, "Sub-alocações"),
            ValidationRule::AssetNames => write!(f, "Nomes dos Ativos"),
            ValidationRule::NegativeValues => write!(f, "Valores Negativos"),
        }
    }
}

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: ValidationRule,
    pub passed: bool,
    /// Human-readable outcome, suitable for display as-is
    pub message: String,
}

impl RuleResult {
    pub fn pass(rule: ValidationRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(rule: ValidationRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            passed: false,
            message: message.into(),
        }
    }
}

/// Ordered results of a full validation. Always holds one result per rule;
/// a failing rule never hides the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<RuleResult>,
}

impl ValidationReport {
    /// True when every rule passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    #[must_use]
    pub fn get(&self, rule: ValidationRule) -> Option<&RuleResult> {
        self.results.iter().find(|r| r.rule == rule)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleResult> {
        self.results.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a RuleResult;
    type IntoIter = std::slice::Iter<'a, RuleResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
