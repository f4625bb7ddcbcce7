use std::collections::{BTreeMap, HashSet};

use chrono::Utc;

use crate::model::{Offer, WatchStats};

/// Trait defining the interface for an offer analyzer.
pub trait Analyzer {
    fn calculate_stats(&self, offers: &[Offer]) -> Option<WatchStats>;
    fn rank(&self, offers: &mut [Offer]);
    fn half_price_only(&self, offers: &[Offer]) -> Vec<Offer>;
    fn cheapest_by_store<'a>(&self, offers: &'a [Offer]) -> BTreeMap<&'a str, &'a Offer>;
    fn cheapest_overall<'a>(&self, offers: &'a [Offer]) -> Option<&'a Offer>;
}

pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AnalyzerImpl {
    /// Average price and standard deviation across an item's offers.
    /// Zero-priced offers are excluded from the sample.
    fn calculate_stats(&self, offers: &[Offer]) -> Option<WatchStats> {
        let prices: Vec<f64> = offers
            .iter()
            .map(|o| o.price)
            .filter(|&p| p > 0.0)
            .collect();
        if prices.is_empty() {
            return None;
        }
        let count = prices.len() as f64;
        let avg = prices.iter().sum::<f64>() / count;
        let std_dev = (prices.iter().map(|p| (p - avg).powi(2)).sum::<f64>() / count).sqrt();

        Some(WatchStats {
            watch_name: offers
                .first()
                .map(|o| o.watch_name.clone())
                .unwrap_or_else(|| "unknown".into()),
            avg_price: avg,
            std_dev,
            last_updated: offers
                .iter()
                .map(|o| o.fetched_at)
                .max()
                .unwrap_or_else(Utc::now),
        })
    }

    /// Report order: grouped by store, cheapest first within each store.
    fn rank(&self, offers: &mut [Offer]) {
        offers.sort_by(|a, b| a.store.cmp(&b.store).then(a.price.total_cmp(&b.price)));
    }

    fn half_price_only(&self, offers: &[Offer]) -> Vec<Offer> {
        offers
            .iter()
            .filter(|offer| offer.is_half_price)
            .cloned()
            .collect()
    }

    fn cheapest_by_store<'a>(&self, offers: &'a [Offer]) -> BTreeMap<&'a str, &'a Offer> {
        let mut cheapest: BTreeMap<&str, &Offer> = BTreeMap::new();
        for offer in offers {
            cheapest
                .entry(offer.store.as_str())
                .and_modify(|current| {
                    if offer.price < current.price {
                        *current = offer;
                    }
                })
                .or_insert(offer);
        }
        cheapest
    }

    fn cheapest_overall<'a>(&self, offers: &'a [Offer]) -> Option<&'a Offer> {
        offers.iter().min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

/// Drops offers that repeat an already-seen (store, title, price) triple,
/// preserving order. Keyword searches overlap constantly.
pub fn dedup_offers(offers: Vec<Offer>) -> Vec<Offer> {
    let mut seen = HashSet::new();
    offers
        .into_iter()
        .filter(|offer| {
            seen.insert((
                offer.store.clone(),
                offer.title.to_lowercase(),
                (offer.price * 100.0).round() as i64,
            ))
        })
        .collect()
}
