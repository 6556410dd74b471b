//! Weighted-average-price traversal with replayable depth consumption.
//!
//! The levels variants consume depth sequentially: a [`WapState`] scratchpad
//! records, per side and per denomination, which level the next call starts
//! from and how much of it is already spent. Synthesis threads one state
//! through a whole conversion pass so every source level digs further into
//! the component book.

use std::borrow::Cow;

use crate::book::OrderBook;
use crate::entry::{BookEntry, WapLevel};
use crate::side::Side;

/// Position within one side: next level index and the size already consumed
/// from it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelCursor {
    pub idx: usize,
    pub consumed: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideCursors {
    pub bids: LevelCursor,
    pub asks: LevelCursor,
}

impl SideCursors {
    fn cursor_mut(&mut self, side: Side) -> &mut LevelCursor {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

/// Scratchpad for sequential traversals against one book: four independent
/// cursors, per side and per denomination.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WapState {
    pub base: SideCursors,
    pub quote: SideCursors,
}

impl WapState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl OrderBook {
    fn traversal_levels(&self, side: Side, incl_fees: bool) -> Cow<'_, [BookEntry]> {
        if incl_fees {
            Cow::Owned(self.side_after_fees(side, 0.0, false))
        } else {
            Cow::Borrowed(self.side(side))
        }
    }

    /// Weighted average price for taking `base_qty` of base currency.
    pub fn wap_base(&self, base_qty: f64, side: Side, incl_fees: bool) -> f64 {
        if base_qty == 0.0 {
            return 0.0;
        }
        let levels = self.traversal_levels(side, incl_fees);
        let mut tot = 0.0;
        let mut qty = base_qty;
        for lvl in levels.iter() {
            if qty >= lvl.size {
                tot += lvl.price * lvl.size;
                qty -= lvl.size;
            } else {
                tot += lvl.price * qty;
                break;
            }
        }
        tot / base_qty
    }

    /// Weighted average price for spending `quote_qty` of quote currency.
    /// Zero when no depth was consumed.
    pub fn wap_quote(&self, quote_qty: f64, side: Side, incl_fees: bool) -> f64 {
        let levels = self.traversal_levels(side, incl_fees);
        let mut tot_size = 0.0;
        let mut qty = quote_qty;
        for lvl in levels.iter() {
            let amt = lvl.size * lvl.price;
            if qty >= amt {
                tot_size += lvl.size;
                qty -= amt;
            } else {
                tot_size += qty / lvl.price;
                break;
            }
        }
        if tot_size == 0.0 {
            0.0
        } else {
            quote_qty / tot_size
        }
    }

    /// Consumes `base_qty` of base currency from `side`, resuming at the
    /// state's cursor, and returns the sub-levels taken. Insufficient depth
    /// ends the traversal early with a shorter list.
    pub fn wap_base_levels(
        &self,
        base_qty: f64,
        side: Side,
        state: &mut WapState,
        incl_fees: bool,
    ) -> Vec<WapLevel> {
        let levels = self.traversal_levels(side, incl_fees);
        let cursor = state.base.cursor_mut(side);
        let mut qty = base_qty;
        let mut ignore = cursor.consumed;
        let mut res = Vec::new();
        for lvl in levels.iter().skip(cursor.idx) {
            let lvl_base = lvl.size - ignore;
            if qty >= lvl_base {
                res.push(WapLevel {
                    price: lvl.price,
                    size: lvl_base,
                    venue: lvl.venue.clone(),
                    wap: lvl.price,
                    amt: lvl_base * lvl.price,
                });
                qty -= lvl_base;
                ignore = 0.0;
                cursor.idx += 1;
                cursor.consumed = 0.0;
            } else {
                res.push(WapLevel {
                    price: lvl.price,
                    size: qty,
                    venue: lvl.venue.clone(),
                    wap: lvl.price,
                    amt: qty * lvl.price,
                });
                cursor.consumed = ignore + qty;
                break;
            }
        }
        res
    }

    /// Consumes `quote_qty` of quote currency from `side`, resuming at the
    /// state's cursor, and returns the sub-levels taken.
    pub fn wap_quote_levels(
        &self,
        quote_qty: f64,
        side: Side,
        state: &mut WapState,
        incl_fees: bool,
    ) -> Vec<WapLevel> {
        let levels = self.traversal_levels(side, incl_fees);
        let cursor = state.quote.cursor_mut(side);
        let mut qty = quote_qty;
        let mut ignore = cursor.consumed;
        let mut res = Vec::new();
        for lvl in levels.iter().skip(cursor.idx) {
            let lvl_base = lvl.size - ignore;
            let lvl_quote = lvl_base * lvl.price;
            if qty >= lvl_quote {
                res.push(WapLevel {
                    price: lvl.price,
                    size: lvl_base,
                    venue: lvl.venue.clone(),
                    wap: lvl.price,
                    amt: lvl_quote,
                });
                qty -= lvl_quote;
                ignore = 0.0;
                cursor.idx += 1;
                cursor.consumed = 0.0;
            } else {
                res.push(WapLevel {
                    price: lvl.price,
                    size: qty / lvl.price,
                    venue: lvl.venue.clone(),
                    wap: lvl.price,
                    amt: qty,
                });
                cursor.consumed = ignore + qty / lvl.price;
                break;
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::VenueCatalog;
    use crate::pair::Pair;

    fn book() -> OrderBook {
        OrderBook::new(
            "okx",
            Pair::new("ETH", "USDT"),
            1.0,
            vec![
                BookEntry::new(1999.0, 1.0, "okx"),
                BookEntry::new(1998.0, 2.0, "okx"),
                BookEntry::new(1997.0, 4.0, "okx"),
            ],
            vec![
                BookEntry::new(2000.0, 1.0, "okx"),
                BookEntry::new(2001.0, 2.0, "okx"),
                BookEntry::new(2002.0, 4.0, "okx"),
            ],
            Arc::new(VenueCatalog::with_defaults(None, None)),
        )
    }

    #[test]
    fn test_wap_base_single_level() {
        let book = book();
        assert_eq!(book.wap_base(0.5, Side::Ask, false), 2000.0);
        assert_eq!(book.wap_base(1.0, Side::Ask, false), 2000.0);
    }

    #[test]
    fn test_wap_base_spans_levels_and_bounds() {
        let book = book();
        let wap = book.wap_base(2.0, Side::Ask, false);
        assert_eq!(wap, (2000.0 + 2001.0) / 2.0);
        assert!(wap >= book.asks()[0].price);
        assert!(wap <= book.asks()[1].price);
    }

    #[test]
    fn test_wap_quote() {
        let book = book();
        // 2000 quote buys exactly the first ask level
        assert_eq!(book.wap_quote(2000.0, Side::Ask, false), 2000.0);
        // spending into the second level
        let wap = book.wap_quote(4001.0, Side::Ask, false);
        let consumed = 1.0 + 2001.0 / 2001.0;
        assert!((wap - 4001.0 / consumed).abs() < 1e-9);
        assert_eq!(book.wap_quote(0.0, Side::Ask, false), 0.0);
    }

    #[test]
    fn test_wap_base_levels_consistency() {
        let book = book();
        let mut state = WapState::default();
        let qty = 2.5;
        let levels = book.wap_base_levels(qty, Side::Ask, &mut state, false);
        let consumed: f64 = levels.iter().map(|l| l.size).sum();
        assert!((consumed - qty).abs() < 1e-12);
        let notional: f64 = levels.iter().map(|l| l.amt).sum();
        let expected: f64 = levels.iter().map(|l| l.price * l.size).sum();
        assert!((notional - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wap_base_levels_resumable() {
        let book = book();
        let mut split_state = WapState::default();
        let mut first = book.wap_base_levels(1.5, Side::Ask, &mut split_state, false);
        let second = book.wap_base_levels(1.0, Side::Ask, &mut split_state, false);
        first.extend(second);

        let mut whole_state = WapState::default();
        let whole = book.wap_base_levels(2.5, Side::Ask, &mut whole_state, false);

        // the split sequence equals the single traversal, cut at 1.5
        let split_sizes: Vec<f64> = first.iter().map(|l| l.size).collect();
        assert_eq!(split_sizes, vec![1.0, 0.5, 1.0]);
        let whole_sizes: Vec<f64> = whole.iter().map(|l| l.size).collect();
        assert_eq!(whole_sizes, vec![1.0, 1.5]);
        let split_total: f64 = split_sizes.iter().sum();
        let whole_total: f64 = whole_sizes.iter().sum();
        assert_eq!(split_total, whole_total);
        assert_eq!(first.last().map(|l| l.price), whole.last().map(|l| l.price));
    }

    #[test]
    fn test_wap_quote_levels_resumes_mid_level() {
        let book = book();
        let mut state = WapState::default();
        let first = book.wap_quote_levels(1000.0, Side::Ask, &mut state, false);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].size, 0.5);
        assert_eq!(state.quote.asks.idx, 0);
        assert_eq!(state.quote.asks.consumed, 0.5);

        let second = book.wap_quote_levels(1000.0, Side::Ask, &mut state, false);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].size, 0.5);
        assert_eq!(state.quote.asks.idx, 1);
        assert_eq!(state.quote.asks.consumed, 0.0);
    }

    #[test]
    fn test_wap_with_fees_is_worse_for_the_taker() {
        let book = book();
        let plain = book.wap_base(2.0, Side::Ask, false);
        let with_fees = book.wap_base(2.0, Side::Ask, true);
        assert!(with_fees > plain);
        let plain_bid = book.wap_base(2.0, Side::Bid, false);
        let with_fees_bid = book.wap_base(2.0, Side::Bid, true);
        assert!(with_fees_bid < plain_bid);
    }

    #[test]
    fn test_depth_exhaustion_returns_partial() {
        let book = book();
        let mut state = WapState::default();
        let levels = book.wap_base_levels(100.0, Side::Ask, &mut state, false);
        let consumed: f64 = levels.iter().map(|l| l.size).sum();
        assert_eq!(levels.len(), 3);
        assert_eq!(consumed, 7.0);
    }

    #[test]
    fn test_cursors_are_independent_per_side_and_denomination() {
        let book = book();
        let mut state = WapState::default();
        let _ = book.wap_quote_levels(1000.0, Side::Ask, &mut state, false);
        let _ = book.wap_base_levels(0.25, Side::Ask, &mut state, false);
        let _ = book.wap_quote_levels(999.5, Side::Bid, &mut state, false);
        assert_eq!(state.quote.asks.consumed, 0.5);
        assert_eq!(state.base.asks.consumed, 0.25);
        assert_eq!(state.quote.bids.consumed, 0.5);
        assert_eq!(state.base.bids, LevelCursor::default());

        let mut reset = state;
        reset.reset();
        assert_eq!(reset, WapState::default());
    }
}
