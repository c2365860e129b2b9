//! DigiKey Product Information v4 client (OAuth2 client credentials).

use std::time::Duration;

use partpal_core::distributor::required_credential;
use partpal_core::{Distributor, InitializationError, LookupError, Offer};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::http;

pub const DIGIKEY_API_URL: &str = "https://api.digikey.com";
pub const DIGIKEY_SANDBOX_URL: &str = "https://sandbox-api.digikey.com";

#[derive(Debug, Clone)]
pub struct DigiKeyConfig {
    pub base_url: String,
    pub locale_site: String,
    pub locale_currency: String,
    pub timeout: Duration,
}

impl Default for DigiKeyConfig {
    fn default() -> Self {
        Self {
            base_url: DIGIKEY_API_URL.to_string(),
            locale_site: "US".to_string(),
            locale_currency: "USD".to_string(),
            timeout: crate::DEFAULT_TIMEOUT,
        }
    }
}

impl DigiKeyConfig {
    pub fn sandbox() -> Self {
        Self {
            base_url: DIGIKEY_SANDBOX_URL.to_string(),
            ..Self::default()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

pub struct DigiKey {
    config: DigiKeyConfig,
    session: Option<Session>,
}

struct Session {
    client: Client,
    client_id: String,
    access_token: String,
}

impl DigiKey {
    pub fn new(config: DigiKeyConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Exchange client credentials for a bearer token
    fn authenticate(
        &self,
        client: &Client,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, InitializationError> {
        let auth_error = |reason: String| InitializationError::Authentication {
            distributor: self.name().to_string(),
            reason,
        };

        let response = client
            .post(self.config.endpoint("/v1/oauth2/token"))
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .map_err(|e| auth_error(e.to_string()))?;

        let status = response.status();
        let body = response.text().map_err(|e| auth_error(e.to_string()))?;
        if !status.is_success() {
            return Err(auth_error(format!(
                "status {}: {}",
                status.as_u16(),
                http::truncate(&body)
            )));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| auth_error(e.to_string()))?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| auth_error("no access token received".to_string()))
    }
}

impl Default for DigiKey {
    fn default() -> Self {
        Self::new(DigiKeyConfig::default())
    }
}

impl Distributor for DigiKey {
    fn name(&self) -> &str {
        "DigiKey"
    }

    fn initialize(&mut self, credentials: &[&str]) -> Result<(), InitializationError> {
        let client_id = required_credential(credentials, 0, self.name(), "client ID")?;
        let client_secret = required_credential(credentials, 1, self.name(), "client secret")?;
        let client = http::build_client(&self.config.base_url, self.config.timeout)?;

        let access_token = self.authenticate(&client, client_id, client_secret)?;
        self.session = Some(Session {
            client,
            client_id: client_id.to_string(),
            access_token,
        });
        log::debug!("DigiKey authenticated against {}", self.config.base_url);
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

        let url = self.config.endpoint(&format!(
            "/products/v4/search/{}/productdetails",
            urlencoding::encode(part_number)
        ));
        let response = session
            .client
            .get(&url)
            .header("X-DIGIKEY-Locale-Site", &self.config.locale_site)
            .header("X-DIGIKEY-Locale-Currency", &self.config.locale_currency)
            .header("X-DIGIKEY-Client-Id", &session.client_id)
            .bearer_auth(&session.access_token)
            .send()
            .map_err(http::transport_error)?;

        let body = http::success_body(response, part_number)?;
        parse_product_details(part_number, &body)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductDetailsResponse {
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Product {
    #[serde(default)]
    product_variations: Vec<ProductVariation>,
    #[serde(alias = "ManufacturerPartNumber")]
    manufacturer_product_number: Option<String>,
    manufacturer: Option<Manufacturer>,
    description: Option<Description>,
    unit_price: Option<f64>,
    #[serde(alias = "QuanitityAvailable")]
    quantity_available: Option<u64>,
    #[serde(alias = "ProductDetailUrl")]
    product_url: Option<String>,
    #[serde(alias = "DataSheetUrl")]
    datasheet_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductVariation {
    digi_key_product_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Manufacturer {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Description {
    product_description: Option<String>,
}

fn parse_product_details(part_number: &str, body: &str) -> Result<Offer, LookupError> {
    let response: ProductDetailsResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    let product = response
        .product
        .ok_or_else(|| LookupError::NotFound(part_number.to_string()))?;

    if product.product_variations.len() > 1 {
        log::debug!(
            "DigiKey lists {} packaging variations for {part_number}, using the first",
            product.product_variations.len()
        );
    }

    let mpn = product.manufacturer_product_number.unwrap_or_default();
    let sku = product
        .product_variations
        .into_iter()
        .filter_map(|v| v.digi_key_product_number)
        .find(|pn| !pn.is_empty())
        .unwrap_or_else(|| mpn.clone());
    if sku.is_empty() {
        return Err(LookupError::NotFound(part_number.to_string()));
    }

    let unit_price = product
        .unit_price
        .ok_or_else(|| LookupError::Decode(format!("{sku} has no UnitPrice")))?;

    Ok(Offer {
        part_number: sku,
        manufacturer_part_number: mpn,
        manufacturer: product.manufacturer.and_then(|m| m.name).unwrap_or_default(),
        description: product
            .description
            .and_then(|d| d.product_description)
            .unwrap_or_default(),
        unit_price,
        availability: product.quantity_available.unwrap_or(0),
        product_url: product.product_url.unwrap_or_default(),
        datasheet_url: product.datasheet_url.unwrap_or_default(),
        ..Offer::default()
    })
}
