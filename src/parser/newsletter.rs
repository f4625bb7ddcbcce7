// Offer-line extraction from store newsletter HTML.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::page::clean_text;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d+(?:\.\d{2})?").expect("price pattern"));
static CONTAINER_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)product|item|special|offer").expect("class pattern"));

const MAX_CONTAINERS: usize = 50;
const MAX_PRODUCTS: usize = 100;
const MIN_LINE_LEN: usize = 10;

/// Pulls candidate offer lines out of a newsletter body. Looks for elements
/// with product-ish class names first; when the template uses none, falls
/// back to scanning the visible text line by line. Only lines carrying a
/// price are kept.
pub fn extract_products(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let container_selector = Selector::parse("div, td, p").expect("container selector");

    let mut products = Vec::new();
    let containers = document
        .select(&container_selector)
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| CONTAINER_CLASS_RE.is_match(class))
        })
        .take(MAX_CONTAINERS);
    for container in containers {
        let text = clean_text(&container.text().collect::<Vec<_>>().join(" "));
        if text.len() > MIN_LINE_LEN && PRICE_RE.is_match(&text) {
            products.push(text);
        }
    }

    if products.is_empty() {
        for line in visible_text(&document).lines() {
            let line = clean_text(line);
            if line.len() > MIN_LINE_LEN && PRICE_RE.is_match(&line) {
                products.push(line);
            }
        }
    }

    dedup_keep_order(products, MAX_PRODUCTS)
}

/// Document text with script and style subtrees dropped, one text node per
/// line.
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if matches!(el.value().name(), "script" | "style") {
                continue;
            }
            collect_text(el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push('\n');
            }
        }
    }
}

fn dedup_keep_order(products: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|product| seen.insert(product.clone()))
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_containers_with_prices_are_extracted() {
        let html = r#"
            <html><body>
                <div class="product-cell">Tim Tam Original 200g $2.50</div>
                <table><tr>
                    <td class="specialOffer">Nescafe Blend 43 <b>$12.00</b></td>
                </tr></table>
                <p class="item">Coca-Cola 24 pack now $15.00</p>
                <div class="product-cell">short $1</div>
                <div class="footer">Unsubscribe here</div>
            </body></html>
        "#;
        let products = extract_products(html);
        assert_eq!(
            products,
            vec![
                "Tim Tam Original 200g $2.50".to_string(),
                "Nescafe Blend 43 $12.00".to_string(),
                "Coca-Cola 24 pack now $15.00".to_string(),
            ]
        );
    }

    #[test]
    fn falls_back_to_visible_text_lines() {
        let html = r#"
            <html><head><style>.x { color: red; }</style></head><body>
                <script>var tracking = "$9.99";</script>
                <span>Weekly specials are here</span>
                <span>Cadbury Dairy Milk block $4.00</span>
            </body></html>
        "#;
        let products = extract_products(html);
        assert_eq!(products, vec!["Cadbury Dairy Milk block $4.00".to_string()]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let html = r#"
            <div class="item">Tim Tam Original $2.50</div>
            <div class="item">Tim Tam Original $2.50</div>
        "#;
        assert_eq!(extract_products(html).len(), 1);
    }

    #[test]
    fn lines_without_prices_are_ignored() {
        let html = r#"<div class="product">Look at these great products today</div>"#;
        assert!(extract_products(html).is_empty());
    }
}
