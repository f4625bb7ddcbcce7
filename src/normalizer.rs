// Field-fallback normalization of loosely-typed API products into Offers.
//
// The upstream APIs are not stable about field names; each store gets a
// priority-ordered candidate list per field. Empty strings, nulls and zero
// prices fall through to the next candidate, the way a probe of the live
// responses showed they should.
use chrono::Utc;
use serde_json::Value;

use crate::model::{ApiError, HALF_PRICE_TOLERANCE, Offer};

pub struct FieldMap {
    pub titles: &'static [&'static str],
    pub prices: &'static [&'static str],
    pub was_prices: &'static [&'static str],
    pub sizes: &'static [&'static str],
    pub urls: &'static [&'static str],
}

pub static COLES_FIELDS: FieldMap = FieldMap {
    titles: &["name", "productName", "ProductName"],
    prices: &["currentPrice", "price", "CurrentPrice"],
    was_prices: &["wasPrice", "WasPrice", "originalPrice", "PreviousPrice"],
    sizes: &["size", "Size", "packageSize", "PackageSize"],
    urls: &["url", "Url", "productUrl", "ProductUrl"],
};

pub static WOOLWORTHS_FIELDS: FieldMap = FieldMap {
    titles: &[
        "name",
        "productName",
        "ProductName",
        "description",
        "Description",
    ],
    prices: &["currentPrice", "price", "CurrentPrice", "Price"],
    was_prices: &["wasPrice", "WasPrice", "originalPrice", "PreviousPrice"],
    sizes: &["size", "Size", "packageSize", "PackageSize"],
    urls: &["url", "Url", "productUrl", "ProductUrl"],
};

/// Converts one raw product object into an `Offer`. A product with no
/// resolvable price is an error; the caller skips it.
pub fn normalize_product(
    watch_name: &str,
    store: &str,
    fields: &FieldMap,
    raw: &Value,
) -> Result<Offer, ApiError> {
    let title = first_string(raw, fields.titles)
        .unwrap_or_else(|| format!("Unknown {store} product"));
    let price = first_price(raw, fields.prices).ok_or_else(|| ApiError::MissingPrice {
        store: store.to_string(),
    })?;
    let was_price = first_price(raw, fields.was_prices);
    let size = first_string(raw, fields.sizes);
    let url = first_string(raw, fields.urls).unwrap_or_default();
    let is_half_price =
        was_price.is_some_and(|was| price <= was / 2.0 + HALF_PRICE_TOLERANCE);

    Ok(Offer {
        watch_name: watch_name.to_string(),
        store: store.to_string(),
        title,
        price,
        was_price,
        size,
        url,
        is_half_price,
        fetched_at: Utc::now(),
    })
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(value_to_string)
}

fn first_price(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(value_to_price)
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    price.filter(|price| *price > 0.0)
}
