use serde::{Deserialize, Serialize};

/// Absolute currency amounts derived from an allocation tree and a total
/// patrimony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedValues {
    /// The patrimony the values were derived from
    pub total_patrimony: f64,

    /// One entry per asset class, in macro order
    pub classes: Vec<ClassValuation>,
}

/// Derived amounts for one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassValuation {
    pub name: String,

    /// Class percentage of the total patrimony
    pub percent: f64,

    /// total_patrimony × percent / 100
    pub value: f64,

    /// Holdings in insertion order (empty for an undecomposed class)
    pub holdings: Vec<HoldingValuation>,
}

/// Derived amounts for one holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub name: String,

    /// Holding percentage of its class
    pub percent: f64,

    /// class value × percent / 100
    pub value: f64,

    /// Percentage points of the whole patrimony (class % × holding % / 100)
    pub share_of_total_pct: f64,
}

impl DerivedValues {
    /// Sum of all class values.
    #[must_use]
    pub fn allocated_value(&self) -> f64 {
        self.classes.iter().map(|c| c.value).sum()
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassValuation> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Value of a holding inside a class, if both exist.
    #[must_use]
    pub fn holding_value(&self, class_name: &str, holding_name: &str) -> Option<f64> {
        self.class(class_name)?
            .holdings
            .iter()
            .find(|h| h.name == holding_name)
            .map(|h| h.value)
    }
}
