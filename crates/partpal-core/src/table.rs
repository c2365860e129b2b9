use std::io::{self, Write};

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Color, Table};

use crate::PricedBom;

impl PricedBom {
    /// Write the priced BOM as a formatted table followed by the total
    ///
    /// Unsourced components are shown in red so they stand out from the
    /// zero-cost rows they otherwise look like.
    pub fn write_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);

        table.set_header(vec![
            "Part Number",
            "MPN",
            "Manufacturer",
            "Description",
            "Qty",
            "Unit Price",
            "Extended",
            "Stock",
            "Distributor",
        ]);

        for offer in &self.components {
            let color = if offer.is_sourced() {
                Color::Reset
            } else {
                Color::Red
            };

            table.add_row(vec![
                Cell::new(&offer.part_number).fg(color),
                Cell::new(&offer.manufacturer_part_number),
                Cell::new(&offer.manufacturer),
                Cell::new(&offer.description),
                Cell::new(offer.quantity).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", offer.unit_price)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.2}", offer.extended_price()))
                    .set_alignment(CellAlignment::Right),
                Cell::new(offer.availability).set_alignment(CellAlignment::Right),
                Cell::new(offer.distributor.as_deref().unwrap_or("-")).fg(color),
            ]);
        }

        writeln!(writer, "{table}")?;
        writeln!(
            writer,
            "{} {:.2}",
            "Total cost:".bold(),
            self.total_cost
        )?;

        let unsourced = self.unsourced().count();
        if unsourced > 0 {
            writeln!(
                writer,
                "{}",
                format!("{unsourced} part(s) could not be sourced and are priced at 0").yellow()
            )?;
        }
        Ok(())
    }
}
