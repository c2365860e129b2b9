use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod config;
mod optimize;
mod query;

#[derive(Parser)]
#[command(name = "partpal")]
#[command(about = "Find the cheapest distributor for every part in a BOM", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    /// Configuration file with distributor credentials
    #[arg(long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price every line item of a BOM at the cheapest distributor
    #[command(alias = "o")]
    Optimize(optimize::OptimizeArgs),

    /// Look up a single part number at every configured distributor
    #[command(alias = "q")]
    Query(query::QueryArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug, RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Optimize(args) => optimize::execute(args, &config),
        Commands::Query(args) => query::execute(args, &config),
    }
}
