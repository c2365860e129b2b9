//! Catalog clients implementing [`partpal_core::Distributor`].
//!
//! Each client takes its endpoint from its config struct, so tests and
//! sandbox accounts can point it somewhere other than production.

pub mod digikey;
mod http;
pub mod mouser;

pub use digikey::{DigiKey, DigiKeyConfig};
pub use mouser::{Mouser, MouserConfig};

/// Default per-request timeout for catalog calls
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
