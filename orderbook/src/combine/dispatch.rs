//! High-level entry: decide whether a requested pair is directly known, a
//! known inverse, or must be synthesized, and produce the taker's view.

use tracing::{debug, warn};

use crate::book::OrderBook;
use crate::combine::join::{BookMap, JoinMap, venue_book, venue_pairs};
use crate::combine::synth::combo_by_conversion;
use crate::pair::Pair;

/// The joined label a pair was folded into, or the pair itself.
pub fn match_from_joined(pair: &Pair, joined: &JoinMap) -> Pair {
    joined
        .iter()
        .find(|(_, (a, b))| a == pair || b == pair)
        .map(|(label, _)| label.clone())
        .unwrap_or_else(|| pair.clone())
}

/// The book for `pair` on `venue` as the taker sees it: optionally inverted,
/// relabelled to `final_pair`, taker fees folded into both sides. Fees apply
/// only on real venues and their `_jnd` aliases; merged venue labels already
/// carry fees per level.
pub fn get_taker_book(
    final_pair: &Pair,
    pair: &Pair,
    venue: &str,
    obs: &BookMap,
    inverse: bool,
    with_debug: bool,
    agg_levels: bool,
) -> Option<OrderBook> {
    let mut book = venue_book(venue, pair, obs, false)?;
    if inverse {
        book = book.inverse_book(with_debug);
    } else if with_debug {
        book.add_levels_debug(pair, false);
    }
    book.pair = final_pair.clone();
    if book.catalog().is_fee_venue(venue) {
        let bids = book.bids_after_fees(0.0, inverse);
        let asks = book.asks_after_fees(0.0, inverse);
        book.set_sides(bids, asks);
    }
    if agg_levels {
        book.aggregate_levels(with_debug);
    }
    Some(book)
}

/// Combo books for `pair` on `venue`: the known pair as the taker sees it, a
/// known inverse inverted first, or synthetic books otherwise. Joined labels
/// are resolved through `joined`. An empty result means the pair is
/// unavailable on that venue; crossed results are reported, not rejected.
pub fn combo_book(
    pair: &Pair,
    venue: &str,
    obs: &BookMap,
    joined: Option<&JoinMap>,
    with_debug: bool,
    agg_levels: bool,
) -> Vec<OrderBook> {
    let mut target = pair.clone();
    let mut inv_pair = pair.inverse();
    if let Some(map) = joined {
        target = match_from_joined(&target, map);
        inv_pair = match_from_joined(&inv_pair, map);
    }
    let known = venue_pairs(venue, obs);
    let books: Vec<OrderBook> = if known.contains(&target) {
        debug!(%target, venue, "using known pair");
        get_taker_book(pair, &target, venue, obs, false, with_debug, agg_levels)
            .into_iter()
            .collect()
    } else if known.contains(&inv_pair) {
        debug!(%inv_pair, venue, "using inverse pair");
        get_taker_book(pair, &inv_pair, venue, obs, true, with_debug, agg_levels)
            .into_iter()
            .collect()
    } else {
        debug!(%pair, venue, "synthesizing pair");
        combo_by_conversion(pair, venue, obs, &known, with_debug, agg_levels)
    };
    if books.is_empty() {
        warn!(%pair, venue, "no combo book produced");
    }
    for book in &books {
        if let Some(spread) = book.spread()
            && spread <= 0.0
        {
            warn!(%pair, venue, spread, "combo book is crossed");
        }
    }
    books
}

/// Warns about pairs present on one venue but missing on another.
pub fn pairs_sanity_check(obs: &BookMap, venues: &[String]) {
    for (i, venue1) in venues.iter().enumerate() {
        for venue2 in venues.iter().skip(i + 1) {
            let pairs1: std::collections::HashSet<Pair> =
                venue_pairs(venue1, obs).into_iter().collect();
            let pairs2: std::collections::HashSet<Pair> =
                venue_pairs(venue2, obs).into_iter().collect();
            let missing2: Vec<&Pair> = pairs1.difference(&pairs2).collect();
            let missing1: Vec<&Pair> = pairs2.difference(&pairs1).collect();
            if !missing2.is_empty() || !missing1.is_empty() {
                warn!(
                    %venue1,
                    %venue2,
                    ?missing2,
                    ?missing1,
                    "pairs mismatch between venues"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{CatalogRef, VenueCatalog};
    use crate::entry::BookEntry;

    fn catalog() -> CatalogRef {
        Arc::new(VenueCatalog::with_defaults(None, None))
    }

    fn okx_eth_usdt() -> BookMap {
        let mut obs = BookMap::new();
        obs.insert(
            "okx".to_string(),
            vec![OrderBook::new(
                "okx",
                Pair::new("ETH", "USDT"),
                7.0,
                vec![BookEntry::new(2999.0, 1.0, "okx")],
                vec![BookEntry::new(3000.0, 1.0, "okx")],
                catalog(),
            )],
        );
        obs
    }

    #[test]
    fn test_known_pair_pass_through_with_fees() {
        let obs = okx_eth_usdt();
        let pair = Pair::new("ETH", "USDT");
        let books = combo_book(&pair, "okx", &obs, None, false, false);
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.pair, pair);
        // okx 4bps: ask 3000 * 1.0004, bid 2999 * 0.9996, rounded to the
        // book's price precision
        assert_eq!(book.asks()[0].price, 3001.2);
        assert_eq!(book.bids()[0].price, 2997.8);
        assert_eq!(book.asks()[0].size, 1.0);
    }

    #[test]
    fn test_inverse_pair_dispatch() {
        let obs = okx_eth_usdt();
        let want = Pair::new("USDT", "ETH");
        let books = combo_book(&want, "okx", &obs, None, false, false);
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.pair, want);
        // inverted asks come from source bids: 1/2999 then taker fees on top
        let inv_price = 1.0 / 2999.0;
        let rounded = crate::round::round_to(
            inv_price,
            crate::round::round_digits(1, 0, inv_price),
        );
        let with_fee = rounded * 1.0004;
        let expected = crate::round::round_to(
            with_fee,
            crate::round::round_digits(8, 0, with_fee),
        );
        assert_eq!(book.asks()[0].price, expected);
        assert_eq!(book.asks()[0].size, 2999.0);
    }

    #[test]
    fn test_joined_map_redirects_lookup() {
        let catalog = catalog();
        let mut obs = BookMap::new();
        obs.insert(
            "binance_jnd".to_string(),
            vec![OrderBook::new(
                "binance_jnd",
                Pair::new("ETH", "USDC"),
                7.0,
                vec![BookEntry::new(1999.0, 1.0, "binance")],
                vec![BookEntry::new(2000.0, 1.0, "binance")],
                catalog,
            )],
        );
        let mut joined = JoinMap::new();
        joined.insert(
            Pair::new("ETH", "USDC"),
            (Pair::new("ETH", "USDC"), Pair::new("ETH", "DAI")),
        );
        // ETH-DAI was folded into the ETH-USDC joined label
        let books = combo_book(&Pair::new("ETH", "DAI"), "binance_jnd", &obs, Some(&joined), false, false);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].pair, Pair::new("ETH", "DAI"));
    }

    #[test]
    fn test_merged_venue_skips_fee_folding() {
        let catalog = catalog();
        let mut obs = BookMap::new();
        obs.insert(
            "binance_jnd-okx_jnd".to_string(),
            vec![OrderBook::new(
                "binance_jnd-okx_jnd",
                Pair::new("ETH", "USDT"),
                7.0,
                vec![BookEntry::new(2999.0, 1.0, "binance")],
                vec![BookEntry::new(3000.0, 1.0, "okx")],
                catalog,
            )],
        );
        let books = combo_book(&Pair::new("ETH", "USDT"), "binance_jnd-okx_jnd", &obs, None, false, false);
        assert_eq!(books.len(), 1);
        // prices untouched: merged books already carry fees
        assert_eq!(books[0].asks()[0].price, 3000.0);
        assert_eq!(books[0].bids()[0].price, 2999.0);
    }

    #[test]
    fn test_unavailable_pair_returns_empty() {
        let obs = okx_eth_usdt();
        let books = combo_book(&Pair::new("SOL", "JPY"), "okx", &obs, None, false, false);
        assert!(books.is_empty());
    }

    #[test]
    fn test_match_from_joined_falls_through() {
        let mut joined = JoinMap::new();
        joined.insert(
            Pair::new("ETH", "USDC"),
            (Pair::new("ETH", "USDC"), Pair::new("ETH", "DAI")),
        );
        assert_eq!(
            match_from_joined(&Pair::new("ETH", "DAI"), &joined),
            Pair::new("ETH", "USDC")
        );
        assert_eq!(
            match_from_joined(&Pair::new("BTC", "USDT"), &joined),
            Pair::new("BTC", "USDT")
        );
    }
}
