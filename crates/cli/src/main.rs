//! CLI entry point for the allocation planner.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "allocation")]
#[command(about = "Hierarchical percentage allocation planner")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store the seed allocation in the session
    Init,

    /// Keep the seed classes and clear every holding
    Reset,

    /// Run the four validation rules (exit code 2 when any fails)
    Validate,

    /// Show currency amounts for every class and holding
    Derive {
        /// Override the total patrimony for this run
        #[arg(long)]
        patrimony: Option<f64>,
    },

    /// Set one asset class percentage (clamped to 0..=100)
    SetMacro {
        class: String,
        #[arg(allow_negative_numbers = true)]
        percent: f64,
    },

    /// Replace the holdings of a class from NAME=PCT pairs
    SetHoldings {
        class: String,
        #[arg(required = true)]
        holdings: Vec<String>,
    },

    /// Set the total patrimony
    SetPatrimony {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Append an `Ativo N` holding at 0% to a class
    AddHolding { class: String },

    /// Bring the macro level (or one class) back to 100%
    Rebalance {
        /// Rebalance the holdings of this class instead of the macro level
        #[arg(long)]
        class: Option<String>,

        /// Split equally instead of rescaling proportionally
        #[arg(long)]
        even: bool,
    },

    /// Replace the session tree with a JSON file
    Import { file: PathBuf },

    /// Write the tree as JSON
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write a CSV report
    ExportCsv {
        /// Level/category/percent breakdown instead of values
        #[arg(long)]
        breakdown: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init => commands::init(&config, false),
        Command::Reset => commands::init(&config, true),
        Command::Validate => match commands::validate(&config) {
            Ok(true) => Ok(()),
            Ok(false) => process::exit(2),
            Err(e) => Err(e),
        },
        Command::Derive { patrimony } => commands::derive(&config, patrimony),
        Command::SetMacro { class, percent } => commands::set_macro(&config, &class, percent),
        Command::SetHoldings { class, holdings } => {
            commands::set_holdings(&config, &class, &holdings)
        }
        Command::SetPatrimony { amount } => commands::set_patrimony(&config, amount),
        Command::AddHolding { class } => commands::add_holding(&config, &class),
        Command::Rebalance { class, even } => {
            commands::rebalance(&config, class.as_deref(), even)
        }
        Command::Import { file } => commands::import(&config, &file),
        Command::Export { output } => commands::export(&config, output),
        Command::ExportCsv { breakdown, output } => {
            commands::export_csv(&config, breakdown, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
