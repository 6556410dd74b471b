//! Cross-venue merge: unite the same pair across venues into a single
//! fee-adjusted ladder.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::book::OrderBook;
use crate::combine::join::{BookMap, n_books_join, venue_pairs};
use crate::pair::Pair;

/// Merges the common pairs of `venues` into books labelled with the
/// hyphen-joined venue names, fees applied per source level. With
/// `all_combos`, one result set is emitted per subset of size >= 2;
/// otherwise only the full superset.
pub fn cross_venue_merge(
    venues: &[String],
    obs: &BookMap,
    all_combos: bool,
    agg_levels: bool,
) -> BookMap {
    let mut common: Option<HashSet<Pair>> = None;
    for venue in venues {
        let pairs: HashSet<Pair> = venue_pairs(venue, obs).into_iter().collect();
        common = Some(match common {
            Some(acc) => acc.intersection(&pairs).cloned().collect(),
            None => pairs,
        });
    }
    let common = common.unwrap_or_default();

    // books per venue, restricted to the common pairs and aligned by sorted
    // pair order
    let mut venue_books: BTreeMap<&str, Vec<OrderBook>> = BTreeMap::new();
    for venue in venues {
        let mut books: Vec<OrderBook> = obs
            .get(venue)
            .map(|all| {
                all.iter()
                    .filter(|b| common.contains(&b.pair))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        books.sort_by(|a, b| a.pair.cmp(&b.pair));
        venue_books.insert(venue.as_str(), books);
    }

    let merge_group = |selection: &[String]| -> (String, Vec<OrderBook>) {
        let label = selection
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("-");
        let lists: Vec<&Vec<OrderBook>> = selection
            .iter()
            .filter_map(|v| venue_books.get(v.as_str()))
            .collect();
        let depth = lists.iter().map(|l| l.len()).min().unwrap_or(0);
        let mut merged = Vec::new();
        for i in 0..depth {
            let group: Vec<OrderBook> = lists.iter().filter_map(|l| l.get(i)).cloned().collect();
            let Some(first) = group.first() else { continue };
            if group.iter().any(|b| b.pair != first.pair) {
                warn!(%label, index = i, "pair misaligned across venues, skipping");
                continue;
            }
            let pair = first.pair.clone();
            if let Some(mut book) = n_books_join(&group, Some(pair), Some(&label), true, false) {
                if agg_levels {
                    book.aggregate_levels(false);
                }
                merged.push(book);
            }
        }
        (label, merged)
    };

    let mut res = BookMap::new();
    if all_combos {
        for n in 2..=venues.len() {
            for selection in combinations(venues, n) {
                let (label, merged) = merge_group(&selection);
                res.insert(label, merged);
            }
        }
    } else {
        let (label, merged) = merge_group(venues);
        res.insert(label, merged);
    }
    res
}

/// All `n`-element subsets of `items`, preserving order.
fn combinations<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let Some((head, rest)) = items.split_first() else {
        return Vec::new();
    };
    let mut out: Vec<Vec<T>> = combinations(rest, n - 1)
        .into_iter()
        .map(|mut tail| {
            let mut combo = Vec::with_capacity(n);
            combo.push(head.clone());
            combo.append(&mut tail);
            combo
        })
        .collect();
    out.extend(combinations(rest, n));
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::VenueCatalog;
    use crate::entry::BookEntry;

    fn single_level_book(venue: &str, pair: Pair, bid: f64, ask: f64) -> OrderBook {
        OrderBook::new(
            venue,
            pair,
            1.0,
            vec![BookEntry::new(bid, 1.0, venue)],
            vec![BookEntry::new(ask, 1.0, venue)],
            Arc::new(VenueCatalog::with_defaults(None, None)),
        )
    }

    fn two_venue_obs() -> BookMap {
        let mut obs = BookMap::new();
        obs.insert(
            "coinbase".to_string(),
            vec![single_level_book("coinbase", Pair::new("ETH", "USDC"), 1999.0, 2000.0)],
        );
        obs.insert(
            "okx".to_string(),
            vec![single_level_book("okx", Pair::new("ETH", "USDC"), 1999.0, 2000.0)],
        );
        obs
    }

    #[test]
    fn test_merge_applies_fees_per_source_level() {
        let obs = two_venue_obs();
        let venues = ["coinbase".to_string(), "okx".to_string()];
        let res = cross_venue_merge(&venues, &obs, false, false);
        let merged = &res["coinbase-okx"];
        assert_eq!(merged.len(), 1);
        let book = &merged[0];
        assert_eq!(book.venue, "coinbase-okx");
        // coinbase 10bps -> 2002, okx 4bps -> 2000.8, sorted ascending
        assert_eq!(book.asks()[0].price, 2000.8);
        assert_eq!(book.asks()[0].venue, "okx");
        assert_eq!(book.asks()[1].price, 2002.0);
        assert_eq!(book.asks()[1].venue, "coinbase");
        // bids mirrored: coinbase 1999 * (1 - 0.001), okx 1999 * (1 - 0.0004)
        assert_eq!(book.bids()[0].price, 1998.2);
        assert_eq!(book.bids()[1].price, 1997.0);
    }

    #[test]
    fn test_merge_all_combos_subsets() {
        let mut obs = two_venue_obs();
        obs.insert(
            "binance".to_string(),
            vec![single_level_book("binance", Pair::new("ETH", "USDC"), 1999.0, 2000.0)],
        );
        let venues = [
            "binance".to_string(),
            "coinbase".to_string(),
            "okx".to_string(),
        ];
        let res = cross_venue_merge(&venues, &obs, true, false);
        let labels: Vec<&str> = res.keys().map(String::as_str).collect();
        assert_eq!(labels.len(), 4);
        assert!(res.contains_key("binance-coinbase"));
        assert!(res.contains_key("binance-okx"));
        assert!(res.contains_key("coinbase-okx"));
        assert!(res.contains_key("binance-coinbase-okx"));
        assert_eq!(res["binance-coinbase-okx"][0].asks_len(), 3);
    }

    #[test]
    fn test_merge_restricts_to_common_pairs() {
        let mut obs = two_venue_obs();
        if let Some(books) = obs.get_mut("okx") {
            books.push(single_level_book("okx", Pair::new("BTC", "USDC"), 30000.0, 30010.0));
        }
        let venues = ["coinbase".to_string(), "okx".to_string()];
        let res = cross_venue_merge(&venues, &obs, false, false);
        let merged = &res["coinbase-okx"];
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pair, Pair::new("ETH", "USDC"));
    }

    #[test]
    fn test_combinations_order() {
        let items = vec!["a", "b", "c"];
        assert_eq!(
            combinations(&items, 2),
            vec![vec!["a", "b"], vec!["a", "c"], vec!["b", "c"]]
        );
        assert_eq!(combinations(&items, 3).len(), 1);
        assert_eq!(combinations(&items, 4).len(), 0);
    }
}
