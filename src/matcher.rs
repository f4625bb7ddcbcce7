// Watchlist matching shared by every pipeline.
use crate::config::WatchItem;

/// Returns the first watch item whose keywords appear in `text`
/// (case-insensitive substring test).
pub fn matching_item<'a>(text: &str, watchlist: &'a [WatchItem]) -> Option<&'a WatchItem> {
    let lower = text.to_lowercase();
    watchlist.iter().find(|item| {
        item.keywords()
            .iter()
            .any(|keyword| lower.contains(&keyword.to_lowercase()))
    })
}

/// Filters `items` to those matching the watchlist. Each item is added only
/// once even if it matches several watch entries.
pub fn find_matches(items: &[String], watchlist: &[WatchItem]) -> Vec<String> {
    items
        .iter()
        .filter(|item| matching_item(item.as_str(), watchlist).is_some())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch(name: &str, keywords: &[&str]) -> WatchItem {
        WatchItem {
            name: name.to_string(),
            match_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            only_half_price: false,
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let watchlist = vec![watch("Tim Tams", &["tim tam"])];
        let items = vec![
            "ARNOTT'S TIM TAM ORIGINAL 200g $2.50".to_string(),
            "Cadbury Dairy Milk $4.00".to_string(),
        ];
        let matches = find_matches(&items, &watchlist);
        assert_eq!(matches, vec![items[0].clone()]);
    }

    #[test]
    fn item_is_reported_once_despite_multiple_hits() {
        let watchlist = vec![
            watch("Coffee", &["coffee", "nescafe"]),
            watch("Nescafe", &["nescafe"]),
        ];
        let items = vec!["Nescafe Blend 43 instant coffee $12.00".to_string()];
        let matches = find_matches(&items, &watchlist);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn first_matching_item_wins() {
        let watchlist = vec![
            watch("Chocolate", &["chocolate"]),
            watch("Tim Tams", &["tim tam"]),
        ];
        let hit = matching_item("Tim Tam chocolate biscuits", &watchlist).expect("match");
        assert_eq!(hit.name, "Chocolate");
    }

    #[test]
    fn name_is_used_when_no_keywords_configured() {
        let watchlist = vec![watch("Laundry detergent", &[])];
        assert!(matching_item("OMO laundry detergent 2L $9.00", &watchlist).is_some());
        assert!(matching_item("Dishwashing tablets $8.00", &watchlist).is_none());
    }

    #[test]
    fn no_match_returns_empty() {
        let watchlist = vec![watch("Tim Tams", &["tim tam"])];
        let items = vec!["Bread $3.00".to_string()];
        assert!(find_matches(&items, &watchlist).is_empty());
    }
}
