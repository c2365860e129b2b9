//! Price aggregation across distributors.
//!
//! Every line item is resolved independently: each distributor is asked for
//! the part, failures are dropped, and the cheapest offer wins. A line item no
//! distributor could price is kept in the output as an unpriced component.
//!
//! Two schedules produce the same result set:
//!
//! * [`ExecutionMode::Sequential`] walks line items and distributors in order
//!   on the calling thread. Output order equals input order.
//! * [`ExecutionMode::Concurrent`] runs one scoped thread per line item, which
//!   in turn fans out one worker per distributor. Workers report into a
//!   channel owned by the line item, and each line item reports its resolved
//!   offer into a single collector on the calling thread. Output order is
//!   completion order.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{Distributor, LineItem, LookupError, Offer, PricedBom};

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that prevent the engine from pricing a BOM at all
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No distributors configured")]
    NoDistributors,

    #[error("Distributor {0} was not initialized")]
    Uninitialized(String),

    #[error("Line item {index} is malformed: {reason}")]
    MalformedLineItem { index: usize, reason: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    #[default]
    Concurrent,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "serial" => Ok(ExecutionMode::Sequential),
            "concurrent" | "parallel" => Ok(ExecutionMode::Concurrent),
            _ => Err(format!(
                "unknown execution mode '{s}', expected 'sequential' or 'concurrent'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub mode: ExecutionMode,
    /// How long a line item waits for its distributors in concurrent mode.
    /// Distributors that miss the deadline count as failed lookups.
    pub query_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
        }
    }
}

pub struct Engine {
    distributors: Vec<Arc<dyn Distributor>>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(distributors: Vec<Arc<dyn Distributor>>) -> Result<Self, EngineError> {
        Self::with_config(distributors, EngineConfig::default())
    }

    pub fn with_config(
        distributors: Vec<Arc<dyn Distributor>>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if distributors.is_empty() {
            return Err(EngineError::NoDistributors);
        }
        if let Some(d) = distributors.iter().find(|d| !d.is_initialized()) {
            return Err(EngineError::Uninitialized(d.name().to_string()));
        }

        Ok(Self {
            distributors,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn distributor_names(&self) -> impl Iterator<Item = &str> {
        self.distributors.iter().map(|d| d.name())
    }

    /// Price a BOM using the configured execution mode
    pub fn price(&self, bom: &[LineItem]) -> Result<PricedBom, EngineError> {
        match self.config.mode {
            ExecutionMode::Sequential => self.price_sequential(bom),
            ExecutionMode::Concurrent => self.price_concurrent(bom),
        }
    }

    pub fn price_sequential(&self, bom: &[LineItem]) -> Result<PricedBom, EngineError> {
        validate(bom)?;
        let start = Instant::now();

        let mut priced = PricedBom::default();
        for item in bom {
            priced.push(self.resolve_sequential(item));
        }

        log::debug!(
            "Priced {} line items sequentially in {:?}",
            bom.len(),
            start.elapsed()
        );
        Ok(priced)
    }

    /// Price every line item in parallel
    ///
    /// Thread use is unbounded: one OS thread per line item plus one detached
    /// thread per distributor for each of them. `std::thread::scope` and
    /// `thread::spawn` panic when the OS refuses a new thread, so a BOM large
    /// enough to exhaust the process thread limit should be priced with
    /// [`ExecutionMode::Sequential`].
    pub fn price_concurrent(&self, bom: &[LineItem]) -> Result<PricedBom, EngineError> {
        validate(bom)?;
        let start = Instant::now();

        let (tx, rx) = mpsc::channel::<Offer>();
        let priced = thread::scope(|s| {
            for item in bom {
                let tx = tx.clone();
                s.spawn(move || {
                    let offer = self.resolve_concurrent(item);
                    // The collector outlives every line item task
                    let _ = tx.send(offer);
                });
            }
            drop(tx);

            // Single writer for the output list and running total
            let mut priced = PricedBom::default();
            for offer in rx {
                priced.push(offer);
            }
            priced
        });

        log::debug!(
            "Priced {} line items concurrently in {:?}",
            bom.len(),
            start.elapsed()
        );
        Ok(priced)
    }

    fn resolve_sequential(&self, item: &LineItem) -> Offer {
        let mut selection = Selection::new(item);
        for (index, distributor) in self.distributors.iter().enumerate() {
            let result = distributor.query_part_number(&item.part_number);
            selection.consider(index, distributor.name(), result);
        }
        selection.resolve()
    }

    fn resolve_concurrent(&self, item: &LineItem) -> Offer {
        let (tx, rx) = mpsc::channel::<(usize, Result<Offer, LookupError>)>();
        for (index, distributor) in self.distributors.iter().enumerate() {
            let tx = tx.clone();
            let distributor = Arc::clone(distributor);
            let part_number = item.part_number.clone();
            // Detached so a hung query cannot hold the line item past its deadline
            thread::spawn(move || {
                let result = distributor.query_part_number(&part_number);
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let deadline = self.config.query_timeout.map(|t| Instant::now() + t);
        let mut answered = vec![false; self.distributors.len()];
        let mut selection = Selection::new(item);

        while answered.iter().any(|a| !a) {
            let received = match deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok((index, result)) => {
                    answered[index] = true;
                    selection.consider(index, self.distributors[index].name(), result);
                }
                Err(RecvTimeoutError::Timeout) => {
                    for (index, _) in answered.iter().enumerate().filter(|(_, a)| !**a) {
                        let name = self.distributors[index].name();
                        selection.consider(index, name, Err(LookupError::Timeout));
                    }
                    break;
                }
                // A worker died without reporting
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        selection.resolve()
    }
}

fn validate(bom: &[LineItem]) -> Result<(), EngineError> {
    for (index, item) in bom.iter().enumerate() {
        if item.part_number.trim().is_empty() {
            return Err(EngineError::MalformedLineItem {
                index,
                reason: "missing part number",
            });
        }
        if item.quantity == 0 {
            return Err(EngineError::MalformedLineItem {
                index,
                reason: "quantity must be at least 1",
            });
        }
    }
    Ok(())
}

/// Task-local reduction state for one line item
struct Selection<'a> {
    item: &'a LineItem,
    best: Option<(usize, Offer)>,
}

impl<'a> Selection<'a> {
    fn new(item: &'a LineItem) -> Self {
        Self { item, best: None }
    }

    /// Fold one distributor's answer into the running best.
    ///
    /// Lower price wins; on equal price the distributor listed first wins,
    /// whatever order the answers arrive in.
    fn consider(&mut self, index: usize, distributor: &str, result: Result<Offer, LookupError>) {
        let mut offer = match result {
            Ok(offer) => offer,
            Err(e) => {
                log::debug!("{distributor}: {}: {e}", self.item.part_number);
                return;
            }
        };

        if offer.part_number.is_empty()
            || !offer.unit_price.is_finite()
            || offer.unit_price < 0.0
        {
            log::warn!(
                "{distributor}: ignoring unusable offer for {} (part number {:?}, price {})",
                self.item.part_number,
                offer.part_number,
                offer.unit_price
            );
            return;
        }

        let beats = match &self.best {
            None => true,
            Some((best_index, best)) => {
                offer.unit_price < best.unit_price
                    || (offer.unit_price == best.unit_price && index < *best_index)
            }
        };

        if beats {
            offer.quantity = self.item.quantity;
            offer.distributor = Some(distributor.to_string());
            self.best = Some((index, offer));
        }
    }

    fn resolve(self) -> Offer {
        match self.best {
            Some((_, offer)) => offer,
            None => {
                log::warn!(
                    "No distributor could source {}, keeping it unpriced",
                    self.item.part_number
                );
                self.item.clone().into_unsourced()
            }
        }
    }
}
