use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::BomError;
use crate::LineItem;

/// Semantic BOM columns the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BomField {
    PartNumber,
    Description,
    Quantity,
}

/// Header spellings accepted for each field, matched case-sensitively after trimming
pub const COLUMN_SYNONYMS: &[(&str, BomField)] = &[
    ("Part Number", BomField::PartNumber),
    ("Component", BomField::PartNumber),
    ("PN", BomField::PartNumber),
    ("P/N", BomField::PartNumber),
    ("Product Number", BomField::PartNumber),
    ("Part", BomField::PartNumber),
    ("Part_No", BomField::PartNumber),
    ("PartNumber", BomField::PartNumber),
    ("Description", BomField::Description),
    ("Desc", BomField::Description),
    ("Desc.", BomField::Description),
    ("Details", BomField::Description),
    ("Qty", BomField::Quantity),
    ("Qty.", BomField::Quantity),
    ("Quantity", BomField::Quantity),
    ("QTY", BomField::Quantity),
];

impl BomField {
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        COLUMN_SYNONYMS
            .iter()
            .find(|(name, _)| *name == header)
            .map(|(_, field)| *field)
    }
}

/// Read a BOM file, picking the parser from the file extension
pub fn read_bom(path: &Path) -> Result<Vec<LineItem>, BomError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let items = read_bom_csv(File::open(path)?)?;
            log::info!("Read {} line items from {}", items.len(), path.display());
            Ok(items)
        }
        _ => Err(BomError::UnsupportedFormat(extension)),
    }
}

/// Parse a CSV BOM with a header row
///
/// Unrecognized columns are ignored. A missing, blank or zero quantity
/// becomes 1. Rows with nothing in any recognized column are skipped; a row
/// with other content but a blank part number is an error.
pub fn read_bom_csv<R: Read>(reader: R) -> Result<Vec<LineItem>, BomError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(BomError::MissingHeader);
    }

    let columns: Vec<(usize, BomField)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| BomField::from_header(h).map(|f| (i, f)))
        .collect();

    if !columns.iter().any(|(_, f)| *f == BomField::PartNumber) {
        return Err(BomError::MissingPartNumberColumn(
            headers.iter().collect::<Vec<_>>().join(", "),
        ));
    }

    // First non-blank cell wins when several columns map to the same field
    let cell = |record: &csv::StringRecord, field: BomField| -> Option<String> {
        columns
            .iter()
            .filter(|(_, f)| *f == field)
            .filter_map(|(i, _)| record.get(*i))
            .find(|v| !v.is_empty())
            .map(|v| v.to_string())
    };

    let mut items = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);

        let part_number = cell(&record, BomField::PartNumber);
        let description = cell(&record, BomField::Description);
        let quantity = cell(&record, BomField::Quantity);

        let Some(part_number) = part_number else {
            if description.is_none() && quantity.is_none() {
                continue;
            }
            return Err(BomError::MissingPartNumber { row });
        };

        let quantity = match quantity {
            None => 1,
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| BomError::InvalidQuantity { row, value })?,
        };

        items.push(LineItem::new(
            part_number,
            description,
            quantity,
        ));
    }

    Ok(items)
}
