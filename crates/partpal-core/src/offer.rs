use serde::{Deserialize, Serialize};

/// One row of the input BOM
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    /// Distributor SKU or manufacturer part number, as written by the user
    pub part_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: u32,
}

impl LineItem {
    /// Build a line item, normalizing a zero quantity to 1
    pub fn new(part_number: impl Into<String>, description: Option<String>, quantity: u32) -> Self {
        Self {
            part_number: part_number.into(),
            description: description.filter(|d| !d.is_empty()),
            quantity: quantity.max(1),
        }
    }

    /// The line item reinterpreted as an unpriced offer
    pub fn into_unsourced(self) -> Offer {
        Offer {
            part_number: self.part_number,
            description: self.description.unwrap_or_default(),
            quantity: self.quantity,
            ..Offer::default()
        }
    }
}

/// A normalized quote for a part from one distributor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Offer {
    pub part_number: String,
    pub manufacturer_part_number: String,
    pub manufacturer: String,
    pub description: String,
    /// Price per unit in the distributor's currency
    pub unit_price: f64,
    /// Units in stock
    pub availability: u64,
    pub product_url: String,
    pub datasheet_url: String,
    /// Filled in by the engine from the requesting line item
    pub quantity: u32,
    /// Which distributor produced this offer; `None` for an unsourced line item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
}

impl Offer {
    /// `unit_price * quantity`
    pub fn extended_price(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    pub fn is_sourced(&self) -> bool {
        self.distributor.is_some()
    }
}

/// The result of pricing a BOM
///
/// Component order follows the input in sequential mode only. Under concurrent
/// execution components appear in completion order, so consumers must not rely
/// on positional correspondence with the input BOM.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricedBom {
    pub components: Vec<Offer>,
    pub total_cost: f64,
}

impl PricedBom {
    /// Append a resolved component and add its extended price to the total
    pub fn push(&mut self, offer: Offer) {
        self.total_cost += offer.extended_price();
        self.components.push(offer);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components no distributor could price
    pub fn unsourced(&self) -> impl Iterator<Item = &Offer> {
        self.components.iter().filter(|o| !o.is_sourced())
    }

    /// Order components by part number (natural order), leaving the total untouched
    pub fn sort_by_part_number(&mut self) {
        self.components
            .sort_by(|a, b| natord::compare(&a.part_number, &b.part_number));
    }
}
