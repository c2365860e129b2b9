use std::io::Write;
use std::path::Path;

use super::BomError;
use crate::{Offer, PricedBom};

/// Column order of exported BOMs, matching [`Offer::csv_record`]
pub const CSV_HEADER: [&str; 10] = [
    "PartNumber",
    "ManufacturerPartNumber",
    "Manufacturer",
    "Description",
    "UnitPrice",
    "Availability",
    "Quantity",
    "ProductURL",
    "DataSheetURL",
    "Distributor",
];

impl Offer {
    /// One export row, in [`CSV_HEADER`] order
    pub fn csv_record(&self) -> [String; 10] {
        [
            self.part_number.clone(),
            self.manufacturer_part_number.clone(),
            self.manufacturer.clone(),
            self.description.clone(),
            format!("{:.2}", self.unit_price),
            self.availability.to_string(),
            self.quantity.to_string(),
            self.product_url.clone(),
            self.datasheet_url.clone(),
            self.distributor.clone().unwrap_or_default(),
        ]
    }
}

pub fn write_priced_bom_csv<W: Write>(writer: W, bom: &PricedBom) -> Result<(), BomError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for offer in &bom.components {
        writer.write_record(offer.csv_record())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_priced_bom(path: &Path, bom: &PricedBom) -> Result<(), BomError> {
    let file = std::fs::File::create(path)?;
    write_priced_bom_csv(file, bom)?;
    log::info!("Wrote {} components to {}", bom.len(), path.display());
    Ok(())
}
