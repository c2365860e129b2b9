pub mod bom;
pub mod distributor;
pub mod engine;
pub mod offer;
#[cfg(feature = "table")]
mod table;

pub use bom::{BomError, export_priced_bom, read_bom, read_bom_csv, write_priced_bom_csv};
pub use distributor::{Distributor, InitializationError, LookupError};
pub use engine::{Engine, EngineConfig, EngineError, ExecutionMode};
pub use offer::{LineItem, Offer, PricedBom};
