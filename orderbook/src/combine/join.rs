//! Joining compatible books: N-way concatenation and the intra-venue join
//! that unions two pairs under one label (e.g. treating DAI as 1:1 with USDC
//! merges ETH-USDC and ETH-DAI).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::book::OrderBook;
use crate::catalog::JOINED_SUFFIX;
use crate::entry::BookEntry;
use crate::pair::Pair;

/// Order books per venue id. Intra-venue joins insert `<venue>_jnd` entries;
/// cross-venue merges insert hyphenated labels.
pub type BookMap = BTreeMap<String, Vec<OrderBook>>;

/// `joined label -> (pair, pair)` to union under that label.
pub type JoinMap = BTreeMap<Pair, (Pair, Pair)>;

/// Output mode of the intra-venue join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Overwrite the first input pair with the joined book and drop the
    /// second.
    Replace,
    /// Append the joined book alongside the originals.
    KeepBoth,
}

/// A copy of the book for `pair` on `venue`. With `fallback`, a miss on a
/// joined venue retries the parent venue.
pub fn venue_book(venue: &str, pair: &Pair, obs: &BookMap, fallback: bool) -> Option<OrderBook> {
    if let Some(books) = obs.get(venue)
        && let Some(book) = books.iter().find(|b| &b.pair == pair)
    {
        return Some(book.clone());
    }
    if fallback && let Some(parent) = venue.strip_suffix(JOINED_SUFFIX) {
        debug!(venue, parent, %pair, "falling back to parent venue");
        return venue_book(parent, pair, obs, false);
    }
    warn!(venue, %pair, "book not found");
    None
}

/// Unique pairs seen on a venue, in book order.
pub fn venue_pairs(venue: &str, obs: &BookMap) -> Vec<Pair> {
    let mut seen = HashSet::new();
    obs.get(venue)
        .map(|books| {
            books
                .iter()
                .filter(|b| seen.insert(b.pair.clone()))
                .map(|b| b.pair.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Joins N compatible books into one: sides are concatenated (optionally
/// fee-adjusted first) and re-sorted; the result carries the latest input
/// timestamp. `pair` and `venue` default to the first book's.
pub fn n_books_join(
    books: &[OrderBook],
    pair: Option<Pair>,
    venue: Option<&str>,
    add_fees: bool,
    agg_levels: bool,
) -> Option<OrderBook> {
    let first = books.first()?;
    let pair = pair.unwrap_or_else(|| first.pair.clone());
    let venue = venue.map(str::to_string).unwrap_or_else(|| first.venue.clone());
    let ts = books.iter().map(|b| b.ts).fold(f64::MIN, f64::max);
    let (bids, asks): (Vec<BookEntry>, Vec<BookEntry>) = if add_fees {
        (
            books.iter().flat_map(|b| b.bids_after_fees(0.0, false)).collect(),
            books.iter().flat_map(|b| b.asks_after_fees(0.0, false)).collect(),
        )
    } else {
        (
            books.iter().flat_map(|b| b.bids().iter().cloned()).collect(),
            books.iter().flat_map(|b| b.asks().iter().cloned()).collect(),
        )
    };
    let mut book = OrderBook::new(venue, pair, ts, bids, asks, Arc::clone(first.catalog()));
    if agg_levels {
        book.aggregate_levels(false);
    }
    Some(book)
}

/// Joins two pairs of the same venue under `joined`.
pub fn join_venue_books(
    venue: &str,
    inp1: &Pair,
    inp2: &Pair,
    joined: &Pair,
    obs: &BookMap,
    add_fees: bool,
) -> Option<OrderBook> {
    let ob1 = venue_book(venue, inp1, obs, false)?;
    let ob2 = venue_book(venue, inp2, obs, false)?;
    n_books_join(&[ob1, ob2], Some(joined.clone()), Some(venue), add_fees, false)
}

/// Runs every join of `to_join` for every venue, inserting the results under
/// sibling `<venue>_jnd` entries seeded with copies of the contributing
/// books. `Replace` substitutes the joined book for the first input pair and
/// drops the second; `KeepBoth` appends it.
pub fn multi_join_venue_books(
    to_join: &JoinMap,
    obs: &mut BookMap,
    venues: &[String],
    mode: JoinMode,
    add_fees: bool,
    agg_levels: bool,
) {
    let required: HashSet<&Pair> = to_join
        .values()
        .flat_map(|(a, b)| [a, b])
        .collect();
    for venue in venues {
        let joined_venue = format!("{venue}{JOINED_SUFFIX}");
        let seed: Vec<OrderBook> = obs
            .get(venue)
            .map(|books| {
                books
                    .iter()
                    .filter(|b| required.contains(&b.pair))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if seed.is_empty() {
            warn!(%venue, "no pairs to join");
            continue;
        }
        obs.insert(joined_venue.clone(), seed);
        for (joined_pair, (inp1, inp2)) in to_join {
            let Some(mut new_book) =
                join_venue_books(&joined_venue, inp1, inp2, joined_pair, obs, add_fees)
            else {
                warn!(%venue, %inp1, %inp2, "could not join pairs");
                continue;
            };
            new_book.venue = joined_venue.clone();
            if agg_levels {
                new_book.aggregate_levels(false);
            }
            let Some(books) = obs.get_mut(&joined_venue) else {
                continue;
            };
            match mode {
                JoinMode::KeepBoth => books.push(new_book),
                JoinMode::Replace => {
                    if let Some(slot) = books.iter_mut().find(|b| &b.pair == inp1) {
                        *slot = new_book;
                    }
                    books.retain(|b| &b.pair != inp2);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogRef, VenueCatalog};

    fn catalog() -> CatalogRef {
        Arc::new(VenueCatalog::with_defaults(None, None))
    }

    fn book(venue: &str, pair: Pair, ts: f64, bid: (f64, f64), ask: (f64, f64)) -> OrderBook {
        OrderBook::new(
            venue,
            pair,
            ts,
            vec![BookEntry::new(bid.0, bid.1, venue)],
            vec![BookEntry::new(ask.0, ask.1, venue)],
            catalog(),
        )
    }

    fn obs_with_joinables() -> BookMap {
        let mut obs = BookMap::new();
        obs.insert(
            "binance".to_string(),
            vec![
                book("binance", Pair::new("ETH", "USDC"), 10.0, (1999.0, 1.0), (2000.0, 1.0)),
                book("binance", Pair::new("ETH", "DAI"), 12.0, (1998.0, 3.0), (2001.0, 2.0)),
                book("binance", Pair::new("ETH", "USDT"), 11.0, (1997.0, 1.0), (2003.0, 1.0)),
            ],
        );
        obs
    }

    #[test]
    fn test_n_books_join_concatenates_and_sorts() {
        let b1 = book("binance", Pair::new("ETH", "USDC"), 10.0, (1999.0, 1.0), (2000.0, 1.0));
        let b2 = book("binance", Pair::new("ETH", "DAI"), 12.0, (1998.0, 3.0), (2001.0, 2.0));
        let joined = n_books_join(&[b1, b2], None, None, false, false).unwrap();
        assert_eq!(joined.pair, Pair::new("ETH", "USDC"));
        assert_eq!(joined.ts, 12.0);
        assert_eq!(joined.bids_len() + joined.asks_len(), 4);
        assert_eq!(joined.asks()[0].price, 2000.0);
        assert_eq!(joined.asks()[1].price, 2001.0);
        assert_eq!(joined.bids()[0].price, 1999.0);
    }

    #[test]
    fn test_join_size_conservation() {
        let b1 = book("binance", Pair::new("ETH", "USDC"), 10.0, (1999.0, 1.0), (2000.0, 1.0));
        let b2 = book("binance", Pair::new("ETH", "DAI"), 12.0, (1999.0, 3.0), (2000.0, 2.0));
        let joined = n_books_join(&[b1.clone(), b2.clone()], None, None, false, false).unwrap();
        assert_eq!(
            joined.bids_len() + joined.asks_len(),
            b1.bids_len() + b1.asks_len() + b2.bids_len() + b2.asks_len()
        );
        // aggregation collapses the equal-price runs afterwards
        let aggregated = n_books_join(&[b1, b2], None, None, false, true).unwrap();
        assert_eq!(aggregated.bids_len(), 1);
        assert_eq!(aggregated.bids()[0].size, 4.0);
    }

    #[test]
    fn test_multi_join_replace_mode() {
        let mut obs = obs_with_joinables();
        let mut to_join = JoinMap::new();
        to_join.insert(
            Pair::new("ETH", "USDC"),
            (Pair::new("ETH", "USDC"), Pair::new("ETH", "DAI")),
        );
        multi_join_venue_books(
            &to_join,
            &mut obs,
            &["binance".to_string()],
            JoinMode::Replace,
            false,
            false,
        );
        let joined = &obs["binance_jnd"];
        assert_eq!(joined.len(), 1);
        let book = &joined[0];
        assert_eq!(book.venue, "binance_jnd");
        assert_eq!(book.pair, Pair::new("ETH", "USDC"));
        assert_eq!(book.ts, 12.0);
        assert_eq!(book.asks()[0].price, 2000.0);
        assert_eq!(book.asks()[1].price, 2001.0);
        // ETH-USDT was not part of any join tuple, so it never entered the
        // sibling venue; the original venue is untouched
        assert_eq!(obs["binance"].len(), 3);
    }

    #[test]
    fn test_multi_join_keep_both_mode() {
        let mut obs = obs_with_joinables();
        let mut to_join = JoinMap::new();
        to_join.insert(
            Pair::new("ETH", "USDC"),
            (Pair::new("ETH", "USDC"), Pair::new("ETH", "DAI")),
        );
        multi_join_venue_books(
            &to_join,
            &mut obs,
            &["binance".to_string()],
            JoinMode::KeepBoth,
            false,
            false,
        );
        let joined = &obs["binance_jnd"];
        assert_eq!(joined.len(), 3);
        assert!(joined.iter().any(|b| b.pair == Pair::new("ETH", "DAI")));
    }

    #[test]
    fn test_venue_book_fallback_to_parent() {
        let obs = obs_with_joinables();
        let pair = Pair::new("ETH", "USDT");
        assert!(venue_book("binance_jnd", &pair, &obs, false).is_none());
        let found = venue_book("binance_jnd", &pair, &obs, true).unwrap();
        assert_eq!(found.venue, "binance");
    }

    #[test]
    fn test_venue_pairs_unique() {
        let obs = obs_with_joinables();
        let pairs = venue_pairs("binance", &obs);
        assert_eq!(pairs.len(), 3);
        assert!(venue_pairs("okx", &obs).is_empty());
    }
}
