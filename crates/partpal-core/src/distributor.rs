//! The capability every supplier adapter implements.
//!
//! An adapter is configured once through [`Distributor::initialize`] and is
//! then only read. The engine shares initialized adapters across worker
//! threads, hence the `Send + Sync` bound.

use crate::Offer;

/// Errors that leave an adapter unusable
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    #[error("{distributor} requires a non-empty {credential}")]
    MissingCredential {
        distributor: String,
        credential: &'static str,
    },

    #[error("{distributor} authentication failed: {reason}")]
    Authentication { distributor: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Http(String),
}

/// Errors from a single part lookup against a single distributor
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Part number cannot be empty")]
    EmptyPartNumber,

    #[error("Distributor has not been initialized")]
    NotInitialized,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No parts found for part number: {0}")]
    NotFound(String),

    #[error("Distributor reported an error: {0}")]
    Vendor(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Could not convert {field} value {value:?} to a number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("No response before the query deadline")]
    Timeout,
}

/// A parts catalog that can be queried by part number
pub trait Distributor: Send + Sync {
    /// Display name, also recorded on every offer this distributor wins
    fn name(&self) -> &str;

    /// Configure the adapter with its credentials
    ///
    /// API-key distributors expect `[api_key]`; OAuth distributors expect
    /// `[client_id, client_secret]` and perform their token handshake here.
    fn initialize(&mut self, credentials: &[&str]) -> Result<(), InitializationError>;

    fn is_initialized(&self) -> bool;

    /// Look up one part, performing exactly one request against the catalog
    ///
    /// A successful offer always carries a non-empty part number.
    fn query_part_number(&self, part_number: &str) -> Result<Offer, LookupError>;
}

/// Fetch credential `index`, rejecting missing or blank values
pub fn required_credential<'a>(
    credentials: &[&'a str],
    index: usize,
    distributor: &str,
    credential: &'static str,
) -> Result<&'a str, InitializationError> {
    credentials
        .get(index)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| InitializationError::MissingCredential {
            distributor: distributor.to_string(),
            credential,
        })
}
