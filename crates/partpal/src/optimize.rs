use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use indicatif::ProgressBar;
use partpal_core::{Engine, ExecutionMode, PricedBom};

use crate::config::Config;

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug, Clone)]
#[command(about = "Price a BOM at the cheapest distributor for every line item")]
pub struct OptimizeArgs {
    /// BOM file to price (CSV)
    #[arg(value_name = "BOM", value_hint = clap::ValueHint::FilePath)]
    pub bom: PathBuf,

    /// Also write the priced BOM to this CSV file
    #[arg(short, long, value_name = "OUT.csv", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Query distributors one after another or all at once
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ExecutionMode>,

    /// Seconds a line item waits for its distributors, 0 waits forever
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute(args: OptimizeArgs, config: &Config) -> Result<()> {
    let items = partpal_core::read_bom(&args.bom)
        .with_context(|| format!("Failed to read BOM {}", args.bom.display()))?;

    let engine_config = config.engine_config(args.mode, args.timeout);
    let http_timeout = engine_config
        .query_timeout
        .unwrap_or(partpal_distributors::DEFAULT_TIMEOUT);
    let distributors = config.require_distributors(http_timeout)?;
    let engine = Engine::with_config(distributors, engine_config)?;

    log::info!(
        "Pricing {} line items against {} ({} mode)",
        items.len(),
        engine.distributor_names().collect::<Vec<_>>().join(", "),
        engine_config.mode
    );

    let spinner = create_spinner(&format!("Pricing {} line items", items.len()));
    let result = engine.price(&items);
    spinner.finish_and_clear();
    let mut priced = result?;

    // Concurrent results arrive in completion order
    if engine_config.mode == ExecutionMode::Concurrent {
        priced.sort_by_part_number();
    }

    let mut writer = io::stdout().lock();
    match args.format {
        OutputFormat::Json => writeln!(writer, "{}", serde_json::to_string_pretty(&priced)?)?,
        OutputFormat::Table => priced.write_table(&mut writer)?,
    }
    warn_unsourced(&priced);

    if let Some(output) = &args.output {
        partpal_core::export_priced_bom(output, &priced)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        eprintln!("{} {}", "Wrote".green(), output.display());
    }

    Ok(())
}

fn warn_unsourced(priced: &PricedBom) {
    let unsourced: Vec<&str> = priced
        .unsourced()
        .map(|offer| offer.part_number.as_str())
        .collect();
    if !unsourced.is_empty() {
        eprintln!(
            "{} no distributor could price {}",
            "Warning:".yellow(),
            unsourced.join(", ")
        );
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}
