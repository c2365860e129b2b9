//! Mouser Search API client (API key authentication).

use std::time::Duration;

use partpal_core::distributor::required_credential;
use partpal_core::{Distributor, InitializationError, LookupError, Offer};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http;

pub const MOUSER_API_URL: &str = "https://api.mouser.com/api/v1";

#[derive(Debug, Clone)]
pub struct MouserConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for MouserConfig {
    fn default() -> Self {
        Self {
            base_url: MOUSER_API_URL.to_string(),
            timeout: crate::DEFAULT_TIMEOUT,
        }
    }
}

pub struct Mouser {
    config: MouserConfig,
    session: Option<Session>,
}

struct Session {
    client: Client,
    api_key: String,
}

impl Mouser {
    pub fn new(config: MouserConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

impl Default for Mouser {
    fn default() -> Self {
        Self::new(MouserConfig::default())
    }
}

impl Distributor for Mouser {
    fn name(&self) -> &str {
        "Mouser"
    }

    fn initialize(&mut self, credentials: &[&str]) -> Result<(), InitializationError> {
        let api_key = required_credential(credentials, 0, self.name(), "API key")?;
        let client = http::build_client(&self.config.base_url, self.config.timeout)?;

        self.session = Some(Session {
            client,
            api_key: api_key.to_string(),
        });
        log::debug!("Mouser initialized against {}", self.config.base_url);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    fn query_part_number(&self, part_number: &str) -> Result<Offer, LookupError> {
        let part_number = part_number.trim();
        if part_number.is_empty() {
            return Err(LookupError::EmptyPartNumber);
        }
        let session = self.session.as_ref().ok_or(LookupError::NotInitialized)?;

        let url = format!(
            "{}/search/partnumber",
            self.config.base_url.trim_end_matches('/')
        );
        let response = session
            .client
            .post(&url)
            .query(&[("apiKey", session.api_key.as_str())])
            .json(&SearchRequest::new(part_number))
            .send()
            .map_err(http::transport_error)?;

        let body = http::success_body(response, part_number)?;
        parse_search_response(part_number, &body)
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    #[serde(rename = "SearchByPartRequest")]
    search_by_part_request: SearchByPart<'a>,
}

#[derive(Debug, Serialize)]
struct SearchByPart<'a> {
    #[serde(rename = "mouserPartNumber")]
    mouser_part_number: &'a str,
}

impl<'a> SearchRequest<'a> {
    fn new(part_number: &'a str) -> Self {
        Self {
            search_by_part_request: SearchByPart {
                mouser_part_number: part_number,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    #[serde(default)]
    errors: Option<Vec<ApiError>>,
    #[serde(default)]
    search_results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    property_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResults {
    #[serde(default)]
    number_of_result: u64,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Part {
    mouser_part_number: Option<String>,
    manufacturer_part_number: Option<String>,
    manufacturer: Option<String>,
    description: Option<String>,
    #[serde(default)]
    price_breaks: Vec<PriceBreak>,
    availability_in_stock: Option<String>,
    product_detail_url: Option<String>,
    data_sheet_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PriceBreak {
    #[serde(default)]
    quantity: u64,
    price: String,
}

fn parse_search_response(part_number: &str, body: &str) -> Result<Offer, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Decode(e.to_string()))?;

    if let Some(error) = response.errors.as_deref().and_then(|e| e.first()) {
        let detail = error
            .message
            .as_deref()
            .or(error.code.as_deref())
            .unwrap_or("unknown error");
        return Err(LookupError::Vendor(match error.property_name.as_deref() {
            Some(property) if !property.is_empty() => format!("{detail} ({property})"),
            _ => detail.to_string(),
        }));
    }

    let results = response
        .search_results
        .ok_or_else(|| LookupError::Decode("response has no SearchResults".to_string()))?;
    if results.number_of_result == 0 || results.parts.is_empty() {
        return Err(LookupError::NotFound(part_number.to_string()));
    }
    if results.parts.len() > 1 {
        log::debug!(
            "Mouser returned {} matches for {part_number}, using the first",
            results.parts.len()
        );
    }

    let part = &results.parts[0];
    let price_break = part
        .price_breaks
        .first()
        .ok_or_else(|| LookupError::NotFound(format!("{part_number} (no pricing)")))?;
    if part.price_breaks.len() > 1 {
        log::debug!(
            "Mouser lists {} price breaks for {part_number}, using the {} piece price",
            part.price_breaks.len(),
            price_break.quantity
        );
    }
    let unit_price = http::parse_number("price", &price_break.price)?;

    let availability = match part.availability_in_stock.as_deref().map(str::trim) {
        None | Some("") => 0,
        Some(stock) => http::parse_number("availability", stock)?,
    };

    let text = |s: &Option<String>| s.clone().unwrap_or_default();
    let mpn = text(&part.manufacturer_part_number);
    let sku = Some(text(&part.mouser_part_number))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| mpn.clone());
    if sku.is_empty() {
        return Err(LookupError::Decode("part has no part number".to_string()));
    }

    Ok(Offer {
        part_number: sku,
        manufacturer_part_number: mpn,
        manufacturer: text(&part.manufacturer),
        description: text(&part.description),
        unit_price,
        availability,
        product_url: text(&part.product_detail_url),
        datasheet_url: text(&part.data_sheet_url),
        ..Offer::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUND: &str = r#"{
        "Errors": [],
        "SearchResults": {
            "NumberOfResult": 1,
            "Parts": [{
                "MouserPartNumber": "511-STM32C031G4U6",
                "ManufacturerPartNumber": "STM32C031G4U6",
                "Manufacturer": "STMicroelectronics",
                "Description": "ARM Microcontrollers - MCU Mainstream Arm Cortex-M0+ MCU",
                "PriceBreaks": [
                    {"Quantity": 1, "Price": "$1.23", "Currency": "USD"},
                    {"Quantity": 10, "Price": "$1.05", "Currency": "USD"}
                ],
                "AvailabilityInStock": "4200",
                "ProductDetailUrl": "https://www.mouser.com/ProductDetail/511-STM32C031G4U6",
                "DataSheetUrl": "https://www.mouser.com/datasheet/2/389/stm32c031c6-3003.pdf"
            }]
        }
    }"#;

    #[test]
    fn test_parse_found_part() {
        let offer = parse_search_response("511-STM32C031G4U6", FOUND).unwrap();
        assert_eq!(offer.part_number, "511-STM32C031G4U6");
        assert_eq!(offer.manufacturer_part_number, "STM32C031G4U6");
        assert_eq!(offer.manufacturer, "STMicroelectronics");
        assert_eq!(offer.unit_price, 1.23);
        assert_eq!(offer.availability, 4200);
        assert!(offer.datasheet_url.ends_with(".pdf"));
        assert_eq!(offer.quantity, 0);
        assert!(offer.distributor.is_none());
    }

    #[test]
    fn test_parse_vendor_error() {
        let body = r#"{
            "Errors": [{"Id": 0, "Code": "Invalid", "Message": "Invalid unique identifier.",
                        "PropertyName": "API Key"}],
            "SearchResults": null
        }"#;
        let err = parse_search_response("X", body).unwrap_err();
        assert!(matches!(err, LookupError::Vendor(_)));
        assert_eq!(
            err.to_string(),
            "Distributor reported an error: Invalid unique identifier. (API Key)"
        );
    }

    #[test]
    fn test_parse_no_results() {
        let body = r#"{"Errors": [], "SearchResults": {"NumberOfResult": 0, "Parts": []}}"#;
        assert!(matches!(
            parse_search_response("NOPE", body),
            Err(LookupError::NotFound(pn)) if pn == "NOPE"
        ));
    }

    #[test]
    fn test_parse_unconvertible_numbers() {
        let bad_price = FOUND.replace("$1.23", "Quote");
        assert!(matches!(
            parse_search_response("X", &bad_price),
            Err(LookupError::InvalidNumber { field: "price", .. })
        ));

        let bad_stock = FOUND.replace(r#""4200""#, r#""lots""#);
        assert!(matches!(
            parse_search_response("X", &bad_stock),
            Err(LookupError::InvalidNumber { field: "availability", .. })
        ));
    }

    #[test]
    fn test_parse_missing_stock_is_zero() {
        let body = FOUND.replace(r#""4200""#, "null");
        assert_eq!(parse_search_response("X", &body).unwrap().availability, 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_search_response("X", "<html>"),
            Err(LookupError::Decode(_))
        ));
    }

    #[test]
    fn test_request_body() {
        insta::assert_json_snapshot!(SearchRequest::new("511-STM32C031G4U6"), @r#"
        {
          "SearchByPartRequest": {
            "mouserPartNumber": "511-STM32C031G4U6"
          }
        }
        "#);
    }

    #[test]
    fn test_initialize_requires_api_key() {
        let mut mouser = Mouser::default();
        assert!(matches!(
            mouser.initialize(&[""]),
            Err(InitializationError::MissingCredential { .. })
        ));
        assert!(mouser.initialize(&[]).is_err());
        assert!(!mouser.is_initialized());

        mouser.initialize(&["key"]).unwrap();
        assert!(mouser.is_initialized());
    }

    #[test]
    fn test_query_guards() {
        let mouser = Mouser::default();
        assert!(matches!(
            mouser.query_part_number("  "),
            Err(LookupError::EmptyPartNumber)
        ));
        assert!(matches!(
            mouser.query_part_number("X"),
            Err(LookupError::NotInitialized)
        ));
    }
}
