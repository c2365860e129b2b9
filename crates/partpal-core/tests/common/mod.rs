#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use partpal_core::{Distributor, InitializationError, LookupError, Offer};

/// In-memory distributor with a fixed price list
pub struct StubDistributor {
    name: String,
    prices: HashMap<String, f64>,
    delay: Option<Duration>,
    initialized: bool,
    calls: AtomicUsize,
}

impl StubDistributor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prices: HashMap::new(),
            delay: None,
            initialized: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn price(mut self, part_number: &str, unit_price: f64) -> Self {
        self.prices.insert(part_number.to_string(), unit_price);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<dyn Distributor> {
        Arc::new(self)
    }
}

impl Distributor for StubDistributor {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, _credentials: &[&str]) -> Result<(), InitializationError> {
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn query_part_number(&self, part_number: &str) -> Result<Offer, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if part_number.is_empty() {
            return Err(LookupError::EmptyPartNumber);
        }

        let unit_price = *self
            .prices
            .get(part_number)
            .ok_or_else(|| LookupError::NotFound(part_number.to_string()))?;

        Ok(Offer {
            part_number: format!("{}-{}", self.name, part_number),
            manufacturer_part_number: part_number.to_string(),
            description: format!("{part_number} from {}", self.name),
            unit_price,
            availability: 1000,
            ..Offer::default()
        })
    }
}

/// Distributor whose every lookup fails
pub struct DownDistributor(pub &'static str);

impl Distributor for DownDistributor {
    fn name(&self) -> &str {
        self.0
    }

    fn initialize(&mut self, _credentials: &[&str]) -> Result<(), InitializationError> {
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn query_part_number(&self, _part_number: &str) -> Result<Offer, LookupError> {
        Err(LookupError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}
