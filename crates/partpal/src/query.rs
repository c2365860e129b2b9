use std::io::{self, Write};
use std::thread;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Color, Table};
use partpal_core::{LookupError, Offer};

use crate::config::Config;

#[derive(Args, Debug, Clone)]
#[command(about = "Query every configured distributor for one part number")]
pub struct QueryArgs {
    /// Distributor or manufacturer part number
    #[arg(value_name = "PART_NUMBER")]
    pub part_number: String,
}

pub fn execute(args: QueryArgs, config: &Config) -> Result<()> {
    let distributors = config.require_distributors(partpal_distributors::DEFAULT_TIMEOUT)?;

    let part_number = args.part_number.as_str();

    let results: Vec<(&str, Result<Offer, LookupError>)> = thread::scope(|s| {
        let handles: Vec<_> = distributors
            .iter()
            .map(|d| s.spawn(move || d.query_part_number(part_number)))
            .collect();
        distributors
            .iter()
            .zip(handles)
            .map(|(d, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(LookupError::Transport("worker panicked".into())));
                (d.name(), result)
            })
            .collect()
    });

    write_results(&results, io::stdout().lock())?;
    Ok(())
}

/// Index of the cheapest successful result, earliest on a tie
fn cheapest(results: &[(&str, Result<Offer, LookupError>)]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .filter_map(|(i, (_, r))| r.as_ref().ok().map(|o| (i, o.unit_price)))
        .filter(|(_, price)| price.is_finite() && *price >= 0.0)
        .fold(None, |best: Option<(usize, f64)>, (i, price)| match best {
            Some((_, best_price)) if best_price <= price => best,
            _ => Some((i, price)),
        })
        .map(|(i, _)| i)
}

fn write_results<W: Write>(
    results: &[(&str, Result<Offer, LookupError>)],
    mut writer: W,
) -> io::Result<()> {
    writeln!(writer, "{}", results_table(results))?;
    if cheapest(results).is_none() {
        writeln!(writer, "{}", "No distributor could price this part".yellow())?;
    }
    Ok(())
}

/// One row per distributor, the cheapest offer marked with `*`
fn results_table(results: &[(&str, Result<Offer, LookupError>)]) -> Table {
    let best = cheapest(results);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
    table.set_header(vec![
        "",
        "Distributor",
        "Part Number",
        "MPN",
        "Manufacturer",
        "Unit Price",
        "Stock",
        "Details",
    ]);

    for (i, (name, result)) in results.iter().enumerate() {
        let row = match result {
            Ok(offer) => {
                let color = if best == Some(i) {
                    Color::Green
                } else {
                    Color::Reset
                };
                vec![
                    Cell::new(if best == Some(i) { "*" } else { "" }).fg(color),
                    Cell::new(name).fg(color),
                    Cell::new(&offer.part_number),
                    Cell::new(&offer.manufacturer_part_number),
                    Cell::new(&offer.manufacturer),
                    Cell::new(format!("{:.4}", offer.unit_price))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(offer.availability).set_alignment(CellAlignment::Right),
                    Cell::new(&offer.product_url),
                ]
            }
            Err(e) => vec![
                Cell::new(""),
                Cell::new(name).fg(Color::Red),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
                Cell::new(e.to_string()).fg(Color::Red),
            ],
        };
        table.add_row(row);
    }
    table
}
