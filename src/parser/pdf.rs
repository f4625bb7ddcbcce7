// PDF catalogue parsing: page text extraction plus product/price recognition.
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use lopdf::Document;
use regex::Regex;
use tracing::debug;

use super::page::clean_text;
use crate::config::WatchItem;
use crate::matcher;
use crate::model::{CatalogueProduct, PdfError};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d+)\.(\d{2})").expect("price pattern"));
static SAVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Ss]ave\s+\$\s*(\d+\.?\d*)").expect("save pattern"));
static PERCENT_OFF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%\s+[Oo]ff").expect("percent pattern"));

/// Extracts the text of every page. Pages that fail to decode are skipped;
/// catalogue PDFs routinely contain image-only pages.
pub fn extract_text(path: &Path) -> Result<String, PdfError> {
    let document = Document::load(path)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    debug!("{}: {} page(s)", path.display(), pages.len());

    let mut text = String::new();
    for page in pages {
        match document.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push_str("\n\n");
            }
            Err(e) => debug!("Skipping page {page}: {e}"),
        }
    }
    Ok(text)
}

/// Scans catalogue text for lines carrying a price and turns them into
/// products: the price is cut out of the line, the rest becomes the name.
pub fn parse_products(text: &str) -> Vec<CatalogueProduct> {
    let mut products = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.len() < 3 {
            continue;
        }
        let Some(caps) = PRICE_RE.captures(line) else {
            continue;
        };
        let price: f64 = format!("{}.{}", &caps[1], &caps[2]).parse().unwrap_or(0.0);

        let name = clean_text(&PRICE_RE.replace_all(line, ""));
        let name = name
            .trim_matches(|c: char| matches!(c, '•' | '-' | '*' | '→'))
            .trim()
            .to_string();
        if name.len() <= 3 {
            continue;
        }

        let save = SAVE_RE
            .captures(line)
            .and_then(|caps| caps[1].parse().ok());
        let discount_percent = PERCENT_OFF_RE
            .captures(line)
            .and_then(|caps| caps[1].parse().ok());

        products.push(CatalogueProduct {
            name,
            price,
            save,
            discount_percent,
            line: line.to_string(),
        });
    }

    dedup_products(products)
}

pub fn parse_catalogue(path: &Path) -> Result<Vec<CatalogueProduct>, PdfError> {
    let text = extract_text(path)?;
    Ok(parse_products(&text))
}

/// Watchlist matching over the product name plus its original line,
/// first-match-wins per product.
pub fn match_catalogue<'a>(
    products: &'a [CatalogueProduct],
    watchlist: &[WatchItem],
) -> Vec<&'a CatalogueProduct> {
    products
        .iter()
        .filter(|product| {
            let haystack = format!("{} {}", product.name, product.line);
            matcher::matching_item(&haystack, watchlist).is_some()
        })
        .collect()
}

fn dedup_products(products: Vec<CatalogueProduct>) -> Vec<CatalogueProduct> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|product| {
            seen.insert((
                product.name.to_lowercase(),
                (product.price * 100.0).round() as i64,
            ))
        })
        .collect()
}
