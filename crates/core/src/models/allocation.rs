use log::debug;
use serde::{Deserialize, Serialize};

use super::valuation::{ClassValuation, DerivedValues, HoldingValuation};
use super::weights::{NamedMap, Weights};

/// Seed used the first time a tree is created: class, class %, holdings.
const SEED: [(&str, f64, &[(&str, f64)]); 4] = [
    ("Renda Fixa", 40.0, &[("Tesouro Selic", 100.0)]),
    (
        "Ações",
        30.0,
        &[("PETR4", 50.0), ("VALE3", 30.0), ("ITUB4", 20.0)],
    ),
    ("FIIs", 20.0, &[("MXRF11", 60.0), ("HGLG11", 40.0)]),
    ("Criptomoedas", 10.0, &[("Bitcoin", 70.0), ("Ethereum", 30.0)]),
];

/// Two-level percentage hierarchy: asset class → holdings.
///
/// The target state is that `macro` sums to 100 and every non-empty holdings
/// map sums to 100, but the tree itself never enforces it: values are stored
/// exactly as given so that an editing session can pass through invalid
/// states. Use `AllocationValidator` to check and `Rebalancer` to repair.
///
/// Serialized form is the exchange contract:
/// `{"macro": {class: pct}, "sub": {class: {holding: pct}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTree {
    /// Percentage per asset class, in display order.
    #[serde(rename = "macro")]
    pub macro_allocation: Weights,

    /// Holdings per asset class. A class missing here, or mapped to an
    /// empty map, is "undecomposed".
    pub sub: NamedMap<Weights>,
}

impl AllocationTree {
    /// A tree with no classes at all.
    pub fn empty() -> Self {
        Self {
            macro_allocation: Weights::new(),
            sub: NamedMap::new(),
        }
    }

    /// The default seed: four classes with preset percentages and holdings.
    pub fn seeded() -> Self {
        let mut tree = Self::empty();
        for (class, pct, holdings) in SEED {
            tree.macro_allocation.insert(class, pct);
            tree.sub
                .insert(class, holdings.iter().map(|&(h, p)| (h, p)).collect());
        }
        tree
    }

    /// Replace the whole tree with the seed classes and no holdings.
    pub fn reset(&mut self) {
        self.macro_allocation = SEED.iter().map(|&(class, pct, _)| (class, pct)).collect();
        self.sub = NamedMap::new();
        debug!("allocation tree reset to {} seed classes", self.macro_allocation.len());
    }

    /// Store a class percentage as given. Clamping is the caller's job and
    /// siblings are not renormalized.
    pub fn set_macro(&mut self, class_name: &str, percent: f64) {
        debug!("set macro {class_name} = {percent}");
        self.macro_allocation.insert(class_name, percent);
    }

    /// Replace the holdings of a class wholesale. An empty map marks the
    /// class as undecomposed.
    pub fn set_holdings(&mut self, class_name: &str, holdings: Weights) {
        debug!("set {} holdings for {class_name}", holdings.len());
        self.sub.insert(class_name, holdings);
    }

    #[must_use]
    pub fn holdings(&self, class_name: &str) -> Option<&Weights> {
        self.sub.get(class_name)
    }

    #[must_use]
    pub fn macro_sum(&self) -> f64 {
        self.macro_allocation.sum()
    }

    /// Sum of a class's holdings; 0 when the class has none.
    #[must_use]
    pub fn sub_sum(&self, class_name: &str) -> f64 {
        self.sub.get(class_name).map_or(0.0, Weights::sum)
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.macro_allocation.len()
    }

    /// Number of holdings across the classes present in `macro`.
    #[must_use]
    pub fn holding_count(&self) -> usize {
        self.macro_allocation
            .keys()
            .map(|class| self.sub.get(class).map_or(0, Weights::len))
            .sum()
    }

    /// Path of the first NaN or infinite percentage, e.g. `macro.Ações` or
    /// `sub.FIIs.MXRF11`. JSON has no representation for these.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<String> {
        if let Some((class, _)) = self.macro_allocation.iter().find(|(_, v)| !v.is_finite()) {
            return Some(format!("macro.{class}"));
        }
        self.sub.iter().find_map(|(class, holdings)| {
            holdings
                .iter()
                .find(|(_, v)| !v.is_finite())
                .map(|(name, _)| format!("sub.{class}.{name}"))
        })
    }

    /// Absolute currency amounts for every class and holding.
    ///
    /// Pure and total: works whether or not the sums are 100. Holdings of
    /// classes that are not in `macro` have no class value and are skipped.
    #[must_use]
    pub fn derive_values(&self, total_patrimony: f64) -> DerivedValues {
        let classes = self
            .macro_allocation
            .iter()
            .map(|(class, &class_pct)| {
                let class_value = total_patrimony * class_pct / 100.0;
                let holdings = self
                    .sub
                    .get(class)
                    .map(|holdings| {
                        holdings
                            .iter()
                            .map(|(name, &pct)| HoldingValuation {
                                name: name.to_string(),
                                percent: pct,
                                value: class_value * pct / 100.0,
                                share_of_total_pct: class_pct * pct / 100.0,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ClassValuation {
                    name: class.to_string(),
                    percent: class_pct,
                    value: class_value,
                    holdings,
                }
            })
            .collect();

        DerivedValues {
            total_patrimony,
            classes,
        }
    }
}

impl Default for AllocationTree {
    fn default() -> Self {
        Self::seeded()
    }
}
