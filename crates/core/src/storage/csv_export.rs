use csv::Writer;

use crate::errors::CoreError;
use crate::models::allocation::AllocationTree;

/// Header of the value report.
pub const VALUE_HEADER: [&str; 4] = ["Classe", "Ativo", "Alocação (%)", "Valor (R$)"];

/// Header of the percentage breakdown report.
pub const BREAKDOWN_HEADER: [&str; 5] = [
    "Nível",
    "Categoria",
    "Ativo",
    "Alocação (%)",
    "Porcentagem do Total",
];

/// Value report: a `(class, "", class %, class value)` row per class, each
/// followed by `("", holding, holding %, holding value)` rows, in macro order.
pub fn export_values_csv(tree: &AllocationTree, total_patrimony: f64) -> Result<String, CoreError> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(VALUE_HEADER)?;

    for class in tree.derive_values(total_patrimony).classes {
        let (pct, value) = (class.percent.to_string(), class.value.to_string());
        wtr.write_record([class.name.as_str(), "", pct.as_str(), value.as_str()])?;

        for holding in &class.holdings {
            let (pct, value) = (holding.percent.to_string(), holding.value.to_string());
            wtr.write_record(["", holding.name.as_str(), pct.as_str(), value.as_str()])?;
        }
    }

    finish(wtr)
}

/// Percentage breakdown: where each class and holding sits relative to the
/// whole patrimony. Needs no patrimony figure.
pub fn export_breakdown_csv(tree: &AllocationTree) -> Result<String, CoreError> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(BREAKDOWN_HEADER)?;

    for (class, &class_pct) in tree.macro_allocation.iter() {
        let pct = class_pct.to_string();
        wtr.write_record(["Classe", class, class, pct.as_str(), pct.as_str()])?;

        if let Some(holdings) = tree.holdings(class) {
            for (name, &holding_pct) in holdings.iter() {
                let pct = holding_pct.to_string();
                let share = (holding_pct / 100.0 * class_pct).to_string();
                wtr.write_record(["Sub-ativo", class, name, pct.as_str(), share.as_str()])?;
            }
        }
    }

    finish(wtr)
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<String, CoreError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| CoreError::Csv(format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| CoreError::Serialization(format!("CSV is not valid UTF-8: {e}")))
}
