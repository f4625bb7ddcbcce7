// Product-tile extraction from store specials pages.
use scraper::{Html, Selector};

use crate::model::ParserError;

/// Returns the visible text of every element matching `product_selector`,
/// with whitespace collapsed and empties dropped.
pub fn extract_items(html: &str, product_selector: &str) -> Result<Vec<String>, ParserError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(product_selector).map_err(|e| ParserError::Selector(e.to_string()))?;

    let mut items = Vec::new();
    for element in document.select(&selector) {
        let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            items.push(text);
        }
    }
    Ok(items)
}

pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
