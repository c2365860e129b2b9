mod export;
mod reader;

pub use export::{CSV_HEADER, export_priced_bom, write_priced_bom_csv};
pub use reader::{BomField, COLUMN_SYNONYMS, read_bom, read_bom_csv};

/// Errors reading or writing BOM files
#[derive(Debug, thiserror::Error)]
pub enum BomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("BOM has no header row")]
    MissingHeader,

    #[error("BOM header has no part number column (found: {0})")]
    MissingPartNumberColumn(String),

    #[error("Row {row}: missing part number")]
    MissingPartNumber { row: usize },

    #[error("Row {row}: failed to convert quantity {value:?} to an integer")]
    InvalidQuantity { row: usize, value: String },

    #[error("Unsupported BOM file type: {0}")]
    UnsupportedFormat(String),
}
