use chrono::NaiveDateTime;
use log::{info, warn};
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::allocation::AllocationTree;
use crate::models::validation::ValidationReport;
use crate::services::validation_service::AllocationValidator;

/// Top-level key holding the class percentages.
pub const MACRO_KEY: &str = "macro";

/// Top-level key holding the holdings per class.
pub const SUB_KEY: &str = "sub";

/// A structurally valid tree read from an exchange payload, together with
/// the validation warnings it carries. Imports never rebalance.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub tree: AllocationTree,
    pub report: ValidationReport,
}

/// Serialize a tree to the exchange contract (pretty JSON, UTF-8 kept as is).
///
/// NaN and infinite percentages are rejected: serde_json would write them as
/// `null`, which the importer refuses.
pub fn export_json(tree: &AllocationTree) -> Result<String, CoreError> {
    reject_non_finite(tree)?;
    serde_json::to_string_pretty(tree)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize allocation tree: {e}")))
}

/// Parse an exchange payload.
///
/// Only the structure is checked: the payload must be an object with `macro`
/// (class → number) and `sub` (class → holding → number) objects. Sums,
/// signs and names are not: an invalid tree is accepted and its problems
/// are returned in the report.
pub fn import_json(json: &str, validator: &AllocationValidator) -> Result<ImportOutcome, CoreError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidStructure(format!("payload is not valid JSON: {e}")))?;
    check_structure(&value)?;

    // Parsed again from the text: `Value` objects do not keep member order.
    let tree: AllocationTree = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidStructure(e.to_string()))?;

    let report = validator.full_validation(&tree);
    info!(
        "imported allocation tree: {} classes, {} holdings",
        tree.class_count(),
        tree.holding_count()
    );
    for failure in report.failures() {
        warn!("imported tree fails {}: {}", failure.rule, failure.message);
    }

    Ok(ImportOutcome { tree, report })
}

pub(crate) fn reject_non_finite(tree: &AllocationTree) -> Result<(), CoreError> {
    match tree.first_non_finite() {
        Some(path) => Err(CoreError::Serialization(format!(
            "'{path}' is not a finite number"
        ))),
        None => Ok(()),
    }
}

fn check_structure(value: &Value) -> Result<(), CoreError> {
    let root = value
        .as_object()
        .ok_or_else(|| CoreError::InvalidStructure("payload must be a JSON object".into()))?;

    let macro_map = root
        .get(MACRO_KEY)
        .ok_or_else(|| CoreError::InvalidStructure(format!("missing '{MACRO_KEY}' key")))?
        .as_object()
        .ok_or_else(|| CoreError::InvalidStructure(format!("'{MACRO_KEY}' must be an object")))?;

    let sub_map = root
        .get(SUB_KEY)
        .ok_or_else(|| CoreError::InvalidStructure(format!("missing '{SUB_KEY}' key")))?
        .as_object()
        .ok_or_else(|| CoreError::InvalidStructure(format!("'{SUB_KEY}' must be an object")))?;

    for (class, pct) in macro_map {
        if !pct.is_number() {
            return Err(CoreError::InvalidStructure(format!(
                "'{MACRO_KEY}.{class}' must be a number"
            )));
        }
    }

    for (class, holdings) in sub_map {
        let holdings = holdings.as_object().ok_or_else(|| {
            CoreError::InvalidStructure(format!("'{SUB_KEY}.{class}' must be an object"))
        })?;
        for (name, pct) in holdings {
            if !pct.is_number() {
                return Err(CoreError::InvalidStructure(format!(
                    "'{SUB_KEY}.{class}.{name}' must be a number"
                )));
            }
        }
    }

    Ok(())
}

/// `diagrama_cerrado_YYYYMMDD_HHMMSS.json`
#[must_use]
pub fn json_file_name(at: NaiveDateTime) -> String {
    format!("diagrama_cerrado_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// `relatorio_portfolio_YYYYMMDD.csv`, the values report.
#[must_use]
pub fn csv_file_name(at: NaiveDateTime) -> String {
    format!("relatorio_portfolio_{}.csv", at.format("%Y%m%d"))
}

/// `relatorio_alocacao_YYYYMMDD.csv`, the percentage breakdown report.
#[must_use]
pub fn breakdown_csv_file_name(at: NaiveDateTime) -> String {
    format!("relatorio_alocacao_{}.csv", at.format("%Y%m%d"))
}
