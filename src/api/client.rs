use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::analyzer::{Analyzer, AnalyzerImpl, dedup_offers};
use crate::config::WatchItem;
use crate::model::{ApiError, Offer};
use crate::normalizer::{self, COLES_FIELDS, FieldMap, WOOLWORTHS_FIELDS};
use crate::scrape::polite_pause;

pub struct StoreEndpoint {
    pub store: &'static str,
    pub host: &'static str,
    pub fields: &'static FieldMap,
}

pub static ENDPOINTS: [StoreEndpoint; 2] = [
    StoreEndpoint {
        store: "Coles",
        host: "coles-product-price-api.p.rapidapi.com",
        fields: &COLES_FIELDS,
    },
    StoreEndpoint {
        store: "Woolworths",
        host: "woolworths-products-api.p.rapidapi.com",
        fields: &WOOLWORTHS_FIELDS,
    },
];

pub fn endpoint_for(name: &str) -> Option<&'static StoreEndpoint> {
    ENDPOINTS
        .iter()
        .find(|endpoint| endpoint.store.eq_ignore_ascii_case(name))
}

pub struct StoreApi {
    client: Client,
    key: String,
    page_size: u32,
}

impl StoreApi {
    pub fn new(key: String, page_size: u32, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            key,
            page_size,
        })
    }

    /// Runs one keyword search against a store endpoint and returns the raw
    /// JSON payload.
    pub async fn search(
        &self,
        endpoint: &StoreEndpoint,
        keyword: &str,
    ) -> Result<Value, ApiError> {
        let url = format!("https://{}/products/search", endpoint.host);
        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.key)
            .header("X-RapidAPI-Host", endpoint.host)
            .query(&[
                ("query", keyword),
                ("pageSize", page_size.as_str()),
                ("pageNumber", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Searches every keyword of a watch item against every store. Failures
    /// are logged per request and never abort the item.
    pub async fn find_offers(&self, item: &WatchItem) -> Vec<Offer> {
        let mut offers = Vec::new();
        for keyword in item.keywords() {
            for endpoint in &ENDPOINTS {
                match self.search(endpoint, keyword).await {
                    Ok(data) => {
                        for raw in extract_products(&data) {
                            match normalizer::normalize_product(
                                &item.name,
                                endpoint.store,
                                endpoint.fields,
                                raw,
                            ) {
                                Ok(offer) => offers.push(offer),
                                Err(e) => {
                                    warn!("Skipping {} product for '{keyword}': {e}", endpoint.store)
                                }
                            }
                        }
                    }
                    Err(e) => warn!("{} search failed for '{keyword}': {e}", endpoint.store),
                }
                polite_pause().await;
            }
        }

        let offers = dedup_offers(offers);
        if item.only_half_price {
            AnalyzerImpl::new().half_price_only(&offers)
        } else {
            offers
        }
    }
}

/// Finds the product list in a typical API response: a known wrapper key, a
/// bare array, or a single product object.
pub fn extract_products(data: &Value) -> Vec<&Value> {
    for key in ["results", "data", "products"] {
        if let Some(Value::Array(items)) = data.get(key) {
            return items.iter().collect();
        }
    }
    match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![data],
        _ => Vec::new(),
    }
}

/// Prints top-level keys and a few product entries so the field maps can be
/// adjusted when the upstream response shape drifts.
pub fn print_sample(data: &Value, max_items: usize) {
    match data {
        Value::Object(map) => {
            println!("Top-level keys: {:?}", map.keys().collect::<Vec<_>>())
        }
        Value::Array(items) => println!("Top-level array of {} item(s)", items.len()),
        other => println!("Top-level value: {other}"),
    }

    let products = extract_products(data);
    println!("Detected {} product(s)", products.len());
    for (i, product) in products.iter().take(max_items).enumerate() {
        println!("\n--- Product #{} ---", i + 1);
        println!("{product:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn products_found_under_wrapper_keys() {
        for key in ["results", "data", "products"] {
            let data = json!({ key: [{ "name": "a" }, { "name": "b" }] });
            assert_eq!(extract_products(&data).len(), 2, "key {key}");
        }
    }

    #[test]
    fn wrapper_keys_win_over_bare_shapes() {
        let data = json!({ "results": [{ "name": "a" }], "data": [{}, {}] });
        assert_eq!(extract_products(&data).len(), 1);
    }

    #[test]
    fn bare_array_is_used_directly() {
        let data = json!([{ "name": "a" }, { "name": "b" }, { "name": "c" }]);
        assert_eq!(extract_products(&data).len(), 3);
    }

    #[test]
    fn single_object_is_wrapped() {
        let data = json!({ "name": "lonely product", "price": 1.0 });
        let products = extract_products(&data);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["name"], "lonely product");
    }

    #[test]
    fn scalars_yield_nothing() {
        assert!(extract_products(&json!("oops")).is_empty());
        assert!(extract_products(&json!(null)).is_empty());
    }

    #[test]
    fn endpoint_lookup_ignores_case() {
        assert_eq!(endpoint_for("coles").map(|e| e.store), Some("Coles"));
        assert_eq!(
            endpoint_for("WOOLWORTHS").map(|e| e.store),
            Some("Woolworths")
        );
        assert!(endpoint_for("aldi").is_none());
    }
}
