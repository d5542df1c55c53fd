//! Subcommand implementations. Each loads the planner from the session
//! store, runs one library operation, prints the outcome and saves back
//! when something changed.

use std::path::{Path, PathBuf};

use allocation_core::models::validation::{ValidationReport, ValidationRule};
use allocation_core::services::editor_service::{EditOutcome, HoldingRow};
use allocation_core::services::rebalance_service::RebalanceOutcome;
use allocation_core::services::report_service::{format_percentage, RowKind};
use allocation_core::storage::format::{breakdown_csv_file_name, csv_file_name, json_file_name};
use allocation_core::storage::session::FileStore;
use allocation_core::AllocationPlanner;
use chrono::Local;
use log::{info, warn};

use crate::config::Config;
use crate::error::{CliError, Result};

struct Session {
    store: FileStore,
    key: String,
    planner: AllocationPlanner,
}

impl Session {
    fn open(config: &Config) -> Result<Self> {
        let store = FileStore::open(config.storage_dir())?;
        let planner =
            AllocationPlanner::load_from_store(&store, &config.storage.key, config.settings())?;
        Ok(Self {
            store,
            key: config.storage.key.clone(),
            planner,
        })
    }

    fn save_if_dirty(&mut self) -> Result<()> {
        if self.planner.is_dirty() {
            self.planner.save_to_store(&mut self.store, &self.key)?;
            info!("saved session '{}' to {}", self.key, self.store.dir().display());
        }
        Ok(())
    }
}

/// Write a freshly seeded allocation, or reset the stored one to the seed
/// classes without holdings.
pub fn init(config: &Config, reset: bool) -> Result<()> {
    let mut session = Session::open(config)?;
    if reset {
        session.planner.reset();
    } else {
        session.planner = AllocationPlanner::with_settings(config.settings())?;
    }
    session.planner.save_to_store(&mut session.store, &session.key)?;
    print_tree(&session.planner);
    Ok(())
}

/// Print the four-rule report. Returns whether every rule passed.
pub fn validate(config: &Config) -> Result<bool> {
    let session = Session::open(config)?;
    let report = session.planner.validate();
    print_report(&report);
    Ok(report.is_valid())
}

/// Print the derived currency amounts.
pub fn derive(config: &Config, patrimony: Option<f64>) -> Result<()> {
    let mut session = Session::open(config)?;
    if let Some(total) = patrimony {
        session.planner.set_total_patrimony(total)?;
    }
    let planner = &session.planner;

    println!(
        "Patrimônio total: {}",
        planner.format_currency(planner.total_patrimony())
    );
    for row in planner.summary_rows() {
        match row.kind {
            RowKind::Class => println!(
                "{:<28} {:>8} {:>16}",
                row.name,
                format_percentage(row.percent),
                planner.format_currency(row.value)
            ),
            RowKind::Holding => println!(
                "  └─ {:<23} {:>8} {:>16}  ({} do total)",
                row.name,
                format_percentage(row.percent),
                planner.format_currency(row.value),
                format_percentage(row.share_of_total_pct)
            ),
        }
    }

    let stats = planner.statistics();
    println!(
        "\n{} classes, {} ativos individuais",
        stats.class_count, stats.holding_count
    );
    if !stats.undecomposed_classes.is_empty() {
        println!("Sem sub-ativos: {}", stats.undecomposed_classes.join(", "));
    }
    Ok(())
}

pub fn set_macro(config: &Config, class_name: &str, percent: f64) -> Result<()> {
    let mut session = Session::open(config)?;
    session.planner.set_macro(class_name, percent);
    print_sum_status(&session.planner);
    session.save_if_dirty()
}

/// Replace the holdings of one class from `NAME=PCT` pairs. Rows that do not
/// sum to 100% are rescaled proportionally.
pub fn set_holdings(config: &Config, class_name: &str, pairs: &[String]) -> Result<()> {
    let rows = pairs
        .iter()
        .map(|pair| parse_holding_row(pair))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::open(config)?;
    match session.planner.apply_holding_rows(class_name, &rows) {
        EditOutcome::Stored => println!("{class_name}: sub-alocação salva"),
        EditOutcome::Rebalanced { previous_sum } => println!(
            "{class_name}: soma era {}, rebalanceado automaticamente",
            format_percentage(previous_sum)
        ),
        EditOutcome::Unchanged => println!("{class_name}: nada a salvar"),
    }
    print_tree(&session.planner);
    session.save_if_dirty()
}

fn parse_holding_row(pair: &str) -> Result<HoldingRow> {
    let (name, pct) = pair
        .rsplit_once('=')
        .ok_or_else(|| CliError::Argument(format!("expected NAME=PCT, got '{pair}'")))?;
    let percent: f64 = pct
        .trim()
        .parse()
        .map_err(|_| CliError::Argument(format!("invalid percentage in '{pair}'")))?;
    let name = name.trim();
    Ok(HoldingRow {
        name: (!name.is_empty()).then(|| name.to_string()),
        percent,
    })
}

pub fn add_holding(config: &Config, class_name: &str) -> Result<()> {
    let mut session = Session::open(config)?;
    let name = session.planner.add_holding(class_name);
    println!("{class_name}: {name} adicionado com 0%");
    print_tree(&session.planner);
    session.save_if_dirty()
}

pub fn set_patrimony(config: &Config, total: f64) -> Result<()> {
    let mut session = Session::open(config)?;
    session.planner.set_total_patrimony(total)?;
    println!(
        "Patrimônio total: {}",
        session.planner.format_currency(total)
    );
    session.save_if_dirty()
}

/// Repair the macro level or one class. `even` splits equally instead of
/// rescaling proportionally.
pub fn rebalance(config: &Config, class_name: Option<&str>, even: bool) -> Result<()> {
    let mut session = Session::open(config)?;
    let planner = &mut session.planner;

    match (class_name, even) {
        (None, true) => planner.balance_macro_evenly()?,
        (Some(class), true) => planner.balance_evenly(class)?,
        (None, false) => report_outcome("macro", planner.auto_correct_macro()),
        (Some(class), false) => report_outcome(class, planner.auto_correct_holdings(class)?),
    }

    print_tree(&session.planner);
    session.save_if_dirty()
}

/// Replace the stored tree with a JSON file. Structural errors abort without
/// touching the store; validation failures are printed as warnings.
pub fn import(config: &Config, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path).map_err(|e| CliError::InputRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut session = Session::open(config)?;
    let report = session.planner.import_json(&json)?;
    if !report.is_valid() {
        warn!("imported allocation has validation warnings");
    }
    print_report(&report);
    session.save_if_dirty()
}

pub fn export(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let session = Session::open(config)?;
    let path = output.unwrap_or_else(|| PathBuf::from(json_file_name(Local::now().naive_local())));
    write_output(&path, &session.planner.export_json()?)
}

pub fn export_csv(config: &Config, breakdown: bool, output: Option<PathBuf>) -> Result<()> {
    let session = Session::open(config)?;
    let now = Local::now().naive_local();
    let (csv, default_name) = if breakdown {
        (session.planner.export_breakdown_csv()?, breakdown_csv_file_name(now))
    } else {
        (session.planner.export_values_csv()?, csv_file_name(now))
    };
    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    write_output(&path, &csv)
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| CliError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    println!("{}", path.display());
    Ok(())
}

fn report_outcome(scope: &str, outcome: RebalanceOutcome) {
    match outcome {
        RebalanceOutcome::AlreadyBalanced => println!("{scope}: já soma 100%"),
        RebalanceOutcome::Rescaled { previous_sum } => {
            println!("{scope}: rebalanceado de {}", format_percentage(previous_sum))
        }
        RebalanceOutcome::ZeroSum => {
            println!("{scope}: soma zero, nada a rebalancear (use --even)")
        }
    }
}

fn print_report(report: &ValidationReport) {
    for result in report {
        let mark = if result.passed { "ok  " } else { "FAIL" };
        println!("[{mark}] {}: {}", result.rule, result.message);
    }
}

fn print_sum_status(planner: &AllocationPlanner) {
    let sum = planner.tree().macro_sum();
    let status = if planner
        .validate()
        .get(ValidationRule::MacroAllocation)
        .is_some_and(|r| r.passed)
    {
        "Alocação válida!"
    } else {
        "Ajuste para 100%"
    };
    println!("Soma Total: {} ({status})", format_percentage(sum));
}

fn print_tree(planner: &AllocationPlanner) {
    for (class, pct) in planner.tree().macro_allocation.iter() {
        println!("{class}: {}", format_percentage(*pct));
        if let Some(holdings) = planner.tree().holdings(class) {
            for (name, h_pct) in holdings.iter() {
                println!("  └─ {name}: {}", format_percentage(*h_pct));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_row() {
        let row = parse_holding_row("PETR4=50").unwrap();
        assert_eq!(row.name.as_deref(), Some("PETR4"));
        assert_eq!(row.percent, 50.0);
    }

    #[test]
    fn parse_splits_on_last_equals() {
        let row = parse_holding_row("A=B = 12.5").unwrap();
        assert_eq!(row.name.as_deref(), Some("A=B"));
        assert_eq!(row.percent, 12.5);
    }

    #[test]
    fn blank_name_is_none() {
        let row = parse_holding_row(" =10").unwrap();
        assert!(row.name.is_none());
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            parse_holding_row("PETR4"),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn bad_percentage_is_rejected() {
        assert!(matches!(
            parse_holding_row("PETR4=abc"),
            Err(CliError::Argument(_))
        ));
    }
}
