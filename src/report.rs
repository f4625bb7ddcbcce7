// Report building and the console / log-file sinks.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use tracing::warn;

use crate::analyzer::{Analyzer, AnalyzerImpl};
use crate::model::{CatalogueProduct, Offer};

/// Builds the per-watch-item offer report: one `##` section per item, offers
/// grouped by store and sorted by price, plus the cheapest-overall line when
/// more than one store produced offers.
pub fn build_offer_report(sections: &[(String, Vec<Offer>)]) -> String {
    let analyzer = AnalyzerImpl::new();
    let mut lines: Vec<String> = Vec::new();

    for (watch_name, offers) in sections {
        lines.push(format!("## {watch_name}"));
        if offers.is_empty() {
            lines.push("No matching products or specials found.".to_string());
            lines.push(String::new());
            continue;
        }

        let mut sorted = offers.clone();
        analyzer.rank(&mut sorted);
        for offer in &sorted {
            lines.push(format_offer(offer));
        }

        if analyzer.cheapest_by_store(&sorted).len() >= 2 {
            if let Some(cheapest) = analyzer.cheapest_overall(&sorted) {
                lines.push(format!(
                    "**Cheapest overall:** {} at ${:.2}",
                    cheapest.store, cheapest.price
                ));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn format_offer(offer: &Offer) -> String {
    let mut line = format!("- {}: {} – ${:.2}", offer.store, offer.title, offer.price);
    if let Some(was) = offer.was_price {
        line.push_str(&format!(" (was ${was:.2})"));
    }
    if offer.is_half_price {
        line.push_str(" [HALF PRICE]");
    }
    if let Some(size) = offer.size.as_deref() {
        if !size.is_empty() {
            line.push_str(&format!(" – {size}"));
        }
    }
    if !offer.url.is_empty() {
        line.push_str(&format!(" – {}", offer.url));
    }
    line
}

/// Plain sectioned list used by the text pipelines (scrape, mail, pdf).
/// Sections without matches are omitted.
pub fn build_match_report(sections: &[(String, Vec<String>)]) -> String {
    let mut lines = Vec::new();
    for (section, items) in sections {
        if items.is_empty() {
            continue;
        }
        lines.push(format!("{section}:"));
        for item in items {
            lines.push(format!("  - {item}"));
        }
    }
    lines.join("\n")
}

pub fn total_matches(sections: &[(String, Vec<String>)]) -> usize {
    sections.iter().map(|(_, items)| items.len()).sum()
}

pub fn format_catalogue_product(product: &CatalogueProduct) -> String {
    let mut line = format!("{} @ ${:.2}", product.name, product.price);
    if let Some(save) = product.save {
        line.push_str(&format!(" (Save ${save:.2})"));
    }
    if let Some(percent) = product.discount_percent {
        line.push_str(&format!(" ({percent}% off)"));
    }
    if product.is_half_price() {
        line.push_str(" [HALF PRICE]");
    }
    line
}

/// Appends a timestamped block to the report log. Failures are logged and
/// swallowed; a broken log file must not kill a run.
pub fn append_to_log(path: &Path, message: &str) {
    let stamped = format!(
        "\n[{}]\n{}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    );
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(stamped.as_bytes()));
    if let Err(e) = result {
        warn!("Could not write to log file {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn offer(store: &str, title: &str, price: f64) -> Offer {
        Offer {
            watch_name: "Tim Tams".to_string(),
            store: store.to_string(),
            title: title.to_string(),
            price,
            was_price: None,
            size: None,
            url: String::new(),
            is_half_price: false,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn empty_section_reports_no_matches() {
        let report = build_offer_report(&[("Tim Tams".to_string(), Vec::new())]);
        assert!(report.contains("## Tim Tams"));
        assert!(report.contains("No matching products or specials found."));
    }

    #[test]
    fn offer_lines_carry_was_price_size_and_flag() {
        let mut special = offer("Coles", "Tim Tam Original", 2.5);
        special.was_price = Some(5.0);
        special.is_half_price = true;
        special.size = Some("200g".to_string());
        special.url = "https://example.com/p/1".to_string();

        let report = build_offer_report(&[("Tim Tams".to_string(), vec![special])]);
        assert!(report.contains(
            "- Coles: Tim Tam Original – $2.50 (was $5.00) [HALF PRICE] – 200g – https://example.com/p/1"
        ));
        // a single store never produces a cheapest-overall line
        assert!(!report.contains("Cheapest overall"));
    }

    #[test]
    fn cheapest_overall_needs_two_stores() {
        let sections = vec![(
            "Tim Tams".to_string(),
            vec![
                offer("Woolworths", "w", 3.0),
                offer("Coles", "c", 2.5),
            ],
        )];
        let report = build_offer_report(&sections);
        assert!(report.contains("**Cheapest overall:** Coles at $2.50"));
    }

    #[test]
    fn match_report_skips_empty_sections() {
        let sections = vec![
            ("Coles".to_string(), vec!["Tim Tam $2.50".to_string()]),
            ("Woolworths".to_string(), Vec::new()),
        ];
        let report = build_match_report(&sections);
        assert_eq!(report, "Coles:\n  - Tim Tam $2.50");
        assert_eq!(total_matches(&sections), 1);
    }

    #[test]
    fn catalogue_product_formatting() {
        let product = CatalogueProduct {
            name: "Coca-Cola 24 pack".to_string(),
            price: 15.0,
            save: Some(15.0),
            discount_percent: Some(50),
            line: String::new(),
        };
        assert_eq!(
            format_catalogue_product(&product),
            "Coca-Cola 24 pack @ $15.00 (Save $15.00) (50% off) [HALF PRICE]"
        );
    }
}
