//! Synthetic pair construction: find two component pairs bridged by a common
//! currency, pick the geometric case, and rebalance every level of one book
//! through the WAP traversal of the other.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::book::OrderBook;
use crate::combine::join::{BookMap, venue_book};
use crate::entry::{BookEntry, DebugEntry};
use crate::pair::Pair;
use crate::round::{round_digits, round_to};
use crate::side::Side;
use crate::wap::WapState;

/// Origin label for levels produced by synthesis.
pub const MERGED_VENUE: &str = "merged";

/// Finds component pairs to synthesize `want` from.
///
/// A pair already quoting both currencies short-circuits as a degenerate
/// pass-through. Otherwise pairs sharing the wanted base are bridged to the
/// wanted quote through a valid quote currency; when no bridge quote exists
/// the bases of those pairs are tried instead.
///
/// Example: want `KNC-ETH` with known `[ETH-USDT, USDC-USDT, KNC-USDT,
/// ETH-DAI]` returns `[(KNC-USDT, ETH-USDT)]`.
pub fn find_pairs(want: &Pair, known: &[Pair], valid_quotes: &[String]) -> Vec<(Pair, Pair)> {
    if let Some(existing) = known
        .iter()
        .find(|p| p.contains(want.base()) && p.contains(want.quote()))
    {
        return vec![(existing.clone(), existing.clone())];
    }
    // pairs sharing the wanted base currency, either side
    let mut common_base: Vec<Pair> = known
        .iter()
        .filter(|p| p.base() == want.base() || p.quote() == want.base())
        .cloned()
        .collect();
    // candidate bridge currencies: their quotes, restricted to valid quotes
    let mut bridges: Vec<&str> = Vec::new();
    for p in &common_base {
        if !bridges.contains(&p.quote()) && valid_quotes.iter().any(|q| q == p.quote()) {
            bridges.push(p.quote());
        }
    }
    let mut related: Vec<Pair> = Vec::new();
    let mut idx = 1;
    for bridge in &bridges {
        related.extend(
            known
                .iter()
                .filter(|p| p.contains(bridge) && p.contains(want.quote()))
                .cloned(),
        );
    }
    if related.is_empty() {
        // retry bridging through the bases of the base-sharing pairs
        for base_pair in &common_base {
            related.extend(
                known
                    .iter()
                    .filter(|p| p.contains(base_pair.base()) && p.contains(want.quote()))
                    .cloned(),
            );
        }
        idx = 0;
    }
    if !related.is_empty() {
        common_base.retain(|p| related.iter().any(|r| r.contains(p.token(idx))));
    }
    common_base.into_iter().zip(related).collect()
}

/// The four geometric cases for combining two component pairs, named for
/// where the bridge currency sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineCase {
    /// e.g. KNC-ETH from (KNC-USDT, ETH-USDT)
    CommonQuote,
    /// e.g. DAI-USDT from (ETH-DAI, ETH-USDT)
    CommonBase,
    /// e.g. KNC-DAI from (KNC-BTC, BTC-DAI)
    QuoteBase,
    /// e.g. DAI-KNC from (BTC-DAI, KNC-BTC)
    BaseQuote,
}

impl CombineCase {
    /// Component sides feeding the synthesized asks, `(p1 side, p2 side)`.
    pub fn ask_sides(self) -> (Side, Side) {
        match self {
            Self::CommonQuote => (Side::Ask, Side::Bid),
            Self::CommonBase => (Side::Bid, Side::Ask),
            Self::QuoteBase => (Side::Ask, Side::Ask),
            Self::BaseQuote => (Side::Bid, Side::Bid),
        }
    }

    /// Component sides feeding the synthesized bids.
    pub fn bid_sides(self) -> (Side, Side) {
        match self {
            Self::CommonQuote => (Side::Bid, Side::Ask),
            Self::CommonBase => (Side::Ask, Side::Bid),
            Self::QuoteBase => (Side::Bid, Side::Bid),
            Self::BaseQuote => (Side::Ask, Side::Ask),
        }
    }

    /// Whether the second book is traversed in quote denomination.
    pub fn quote_denominated(self) -> bool {
        matches!(self, Self::CommonQuote | Self::QuoteBase)
    }
}

/// Picks the combine case from where the bridge currency appears, or `None`
/// when the pairs share no currency.
pub fn case_select(p1: &Pair, p2: &Pair) -> Option<CombineCase> {
    if p1.quote() == p2.quote() {
        Some(CombineCase::CommonQuote)
    } else if p1.base() == p2.base() {
        Some(CombineCase::CommonBase)
    } else if p1.quote() == p2.base() {
        Some(CombineCase::QuoteBase)
    } else if p1.base() == p2.quote() {
        Some(CombineCase::BaseQuote)
    } else {
        None
    }
}

/// Converts one side of `ob1` through the quote-denominated traversal of
/// `ob2`: each level's notional is spent into `ob2`, and every consumed
/// sub-level prices a synthesized level at `L.price / wap`.
pub fn convert_side_quote(
    ob1: &OrderBook,
    ob2: &OrderBook,
    side1: Side,
    side2: Side,
    with_debug: bool,
) -> Vec<BookEntry> {
    let catalog = ob1.catalog();
    let mut state = WapState::default();
    let mut entries = Vec::new();
    for level in ob1.side(side1) {
        if level.size == 0.0 {
            continue;
        }
        for sub in ob2.wap_quote_levels(level.price * level.size, side2, &mut state, false) {
            if sub.size == 0.0 {
                continue;
            }
            let price = level.price / sub.wap;
            let size = sub.size / price;
            let size = round_to(size, round_digits(ob1.size_decimals(), ob2.size_decimals(), size));
            let fee = catalog.combo_fee(&[
                (level.venue.as_str(), &ob1.pair),
                (sub.venue.as_str(), &ob2.pair),
            ]);
            let priced = price * (1.0 + fee);
            let priced = round_to(
                priced,
                round_digits(ob1.price_decimals(), ob2.price_decimals(), priced),
            );
            let trail = if with_debug {
                vec![
                    DebugEntry {
                        price: level.price,
                        size,
                        venue: level.venue.clone(),
                        fee: catalog.fee(&level.venue, &ob1.pair, false),
                        pair: ob1.pair.label(),
                        side: side1.taker(),
                    },
                    DebugEntry {
                        price: sub.price,
                        size: sub.size,
                        venue: sub.venue.clone(),
                        fee: catalog.fee(&sub.venue, &ob2.pair, false),
                        pair: ob2.pair.label(),
                        side: side2.taker(),
                    },
                ]
            } else {
                Vec::new()
            };
            entries.push(BookEntry::with_debug(priced, size, MERGED_VENUE, trail));
        }
    }
    entries
}

/// Converts one side of `ob1` through the base-denominated traversal of
/// `ob2`: sub-level sizes are already in the target base, and prices
/// multiply, `L.price * wap`.
pub fn convert_side_base(
    ob1: &OrderBook,
    ob2: &OrderBook,
    side1: Side,
    side2: Side,
    with_debug: bool,
) -> Vec<BookEntry> {
    let catalog = ob1.catalog();
    let mut state = WapState::default();
    let mut entries = Vec::new();
    for level in ob1.side(side1) {
        if level.size == 0.0 {
            continue;
        }
        for sub in ob2.wap_base_levels(level.price * level.size, side2, &mut state, false) {
            if sub.size == 0.0 {
                continue;
            }
            let price = level.price * sub.wap;
            let size = round_to(
                sub.size,
                round_digits(ob1.size_decimals(), ob2.size_decimals(), sub.size),
            );
            let fee = catalog.combo_fee(&[
                (level.venue.as_str(), &ob1.pair),
                (sub.venue.as_str(), &ob2.pair),
            ]);
            let priced = price * (1.0 + fee);
            let priced = round_to(
                priced,
                round_digits(ob1.price_decimals(), ob2.price_decimals(), priced),
            );
            let trail = if with_debug {
                vec![
                    DebugEntry {
                        price: level.price,
                        size: level.size,
                        venue: level.venue.clone(),
                        fee: catalog.fee(&level.venue, &ob1.pair, false),
                        pair: ob1.pair.label(),
                        side: side1.taker(),
                    },
                    DebugEntry {
                        price: sub.price,
                        size: sub.size,
                        venue: sub.venue.clone(),
                        fee: catalog.fee(&sub.venue, &ob2.pair, false),
                        pair: ob2.pair.label(),
                        side: side2.taker(),
                    },
                ]
            } else {
                Vec::new()
            };
            entries.push(BookEntry::with_debug(priced, size, MERGED_VENUE, trail));
        }
    }
    entries
}

/// Synthesizes `want` on `venue` from every component tuple `find_pairs`
/// yields. Each candidate produces one book; candidates missing a component
/// book or a combine case are skipped. An empty result means the pair cannot
/// be synthesized from the venue's depth.
pub fn combo_by_conversion(
    want: &Pair,
    venue: &str,
    obs: &BookMap,
    known: &[Pair],
    with_debug: bool,
    agg_levels: bool,
) -> Vec<OrderBook> {
    let Some(any_book) = obs.values().flat_map(|books| books.iter()).next() else {
        return Vec::new();
    };
    let comp_pairs = find_pairs(want, known, any_book.catalog().valid_quotes());
    debug!(%want, ?comp_pairs, "component pairs");
    let mut books = Vec::new();
    for (p1, p2) in comp_pairs {
        let Some(ob1) = venue_book(venue, &p1, obs, true) else {
            continue;
        };
        let Some(ob2) = venue_book(venue, &p2, obs, true) else {
            continue;
        };
        let Some(case) = case_select(&p1, &p2) else {
            warn!(%p1, %p2, "no combine case for component pairs");
            continue;
        };
        debug!(?case, %p1, %p2, "combining");
        let (ask1, ask2) = case.ask_sides();
        let (bid1, bid2) = case.bid_sides();
        let (asks, bids) = if case.quote_denominated() {
            (
                convert_side_quote(&ob1, &ob2, ask1, ask2, with_debug),
                convert_side_quote(&ob1, &ob2, bid1, bid2, with_debug),
            )
        } else {
            (
                convert_side_base(&ob1, &ob2, ask1, ask2, with_debug),
                convert_side_base(&ob1, &ob2, bid1, bid2, with_debug),
            )
        };
        if asks.is_empty() || bids.is_empty() {
            continue;
        }
        let mut book = OrderBook::new(
            venue,
            want.clone(),
            ob1.ts,
            bids,
            asks,
            Arc::clone(ob1.catalog()),
        );
        if agg_levels {
            book.aggregate_levels(with_debug);
        }
        books.push(book);
    }
    books
}
