use serde::{Deserialize, Serialize};

use crate::models::allocation::AllocationTree;

/// Level of a summary table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    Class,
    Holding,
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowKind::Class => write!(f, "Classe"),
            RowKind::Holding => write!(f, "Sub-ativo"),
        }
    }
}

/// One row of the flattened summary table: a class followed by its holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub kind: RowKind,
    /// Asset class this row belongs to
    pub class_name: String,
    /// Class name for class rows, holding name for holding rows
    pub name: String,
    /// Percentage within the parent level
    pub percent: f64,
    /// Absolute currency amount
    pub value: f64,
    /// Percentage points of the whole patrimony
    pub share_of_total_pct: f64,
}

/// Headline counts shown next to the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationStatistics {
    pub class_count: usize,
    pub holding_count: usize,
    pub macro_sum: f64,
    pub undecomposed_classes: Vec<String>,
}

/// Turns a tree into display-ready rows and strings. No rendering here.
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// Flatten the tree into class rows each followed by its holding rows.
    pub fn summary_rows(&self, tree: &AllocationTree, total_patrimony: f64) -> Vec<SummaryRow> {
        let derived = tree.derive_values(total_patrimony);
        let mut rows = Vec::with_capacity(tree.class_count() + tree.holding_count());

        for class in derived.classes {
            rows.push(SummaryRow {
                kind: RowKind::Class,
                class_name: class.name.clone(),
                name: class.name.clone(),
                percent: class.percent,
                value: class.value,
                share_of_total_pct: class.percent,
            });
            for holding in class.holdings {
                rows.push(SummaryRow {
                    kind: RowKind::Holding,
                    class_name: class.name.clone(),
                    name: holding.name,
                    percent: holding.percent,
                    value: holding.value,
                    share_of_total_pct: holding.share_of_total_pct,
                });
            }
        }
        rows
    }

    pub fn statistics(&self, tree: &AllocationTree) -> AllocationStatistics {
        let undecomposed_classes = tree
            .macro_allocation
            .keys()
            .filter(|class| tree.holdings(class).map_or(true, |h| h.is_empty()))
            .map(str::to_string)
            .collect();

        AllocationStatistics {
            class_count: tree.class_count(),
            holding_count: tree.holding_count(),
            macro_sum: tree.macro_sum(),
            undecomposed_classes,
        }
    }
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact currency string: `R$ 1.50B`, `R$ 2.30M`, `R$ 45.0K`, `R$ 999.90`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    if value >= 1_000_000_000.0 {
        format!("{symbol} {:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{symbol} {:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{symbol} {:.1}K", value / 1_000.0)
    } else {
        format!("{symbol} {}", group_thousands(value))
    }
}

/// Percentage with two decimals: `38.10%`.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

/// Two decimals with `,` as the thousands separator.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_negative_thousands() {
        assert_eq!(group_thousands(-1234567.891), "-1,234,567.89");
    }

    #[test]
    fn small_values_have_no_separator() {
        assert_eq!(group_thousands(999.9), "999.90");
        assert_eq!(group_thousands(0.0), "0.00");
    }

    #[test]
    fn negative_zero_after_rounding_has_no_sign() {
        assert_eq!(group_thousands(-0.001), "0.00");
    }
}
