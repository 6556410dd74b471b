use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::CatalogRef;
use crate::entry::{BookEntry, DebugEntry};
use crate::pair::Pair;
use crate::round::{count_decimals, round_digits, round_to};
use crate::side::Side;

/// Current UTC timestamp as epoch seconds with millisecond resolution.
pub fn now_utc_ts() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Depth snapshot for one pair on one venue.
///
/// Bids are held sorted descending by price, asks ascending; construction
/// sorts unsorted input. Levels preserve their origin venue across joins and
/// merges. The cached decimal precisions are recomputed by every mutating
/// operation.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub venue: String,
    pub pair: Pair,
    /// UTC epoch seconds, millisecond resolution.
    pub ts: f64,
    bids: Vec<BookEntry>,
    asks: Vec<BookEntry>,
    catalog: CatalogRef,
    prc_decimals: u32,
    size_decimals: u32,
}

impl OrderBook {
    /// Creates a book, sorting both sides. A non-positive `ts` is replaced
    /// with the current time.
    pub fn new(
        venue: impl Into<String>,
        pair: Pair,
        ts: f64,
        mut bids: Vec<BookEntry>,
        mut asks: Vec<BookEntry>,
        catalog: CatalogRef,
    ) -> Self {
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        let ts = if ts > 0.0 { ts } else { now_utc_ts() };
        let (prc_decimals, size_decimals) = computed_decimals(&bids, &asks);
        Self {
            venue: venue.into(),
            pair,
            ts,
            bids,
            asks,
            catalog,
            prc_decimals,
            size_decimals,
        }
    }

    pub fn bids(&self) -> &[BookEntry] {
        &self.bids
    }

    pub fn asks(&self) -> &[BookEntry] {
        &self.asks
    }

    pub fn side(&self, side: Side) -> &[BookEntry] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub fn catalog(&self) -> &CatalogRef {
        &self.catalog
    }

    pub fn date(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis((self.ts * 1000.0).round() as i64)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn bids_len(&self) -> usize {
        self.bids.len()
    }

    pub fn asks_len(&self) -> usize {
        self.asks.len()
    }

    pub fn bids_tot_size(&self) -> f64 {
        self.bids.iter().map(|e| e.size).sum()
    }

    pub fn asks_tot_size(&self) -> f64 {
        self.asks.iter().map(|e| e.size).sum()
    }

    /// Best-ask minus best-bid. Raw venue snapshots should be positive;
    /// synthesized books may momentarily cross after fee application.
    pub fn spread(&self) -> Option<f64> {
        Some(self.asks.first()?.price - self.bids.first()?.price)
    }

    pub fn mid(&self) -> Option<f64> {
        Some((self.asks.first()?.price + self.bids.first()?.price) / 2.0)
    }

    /// Maximum observed decimal places across both sides' prices.
    pub fn price_decimals(&self) -> u32 {
        self.prc_decimals
    }

    /// Maximum observed decimal places across both sides' sizes.
    pub fn size_decimals(&self) -> u32 {
        self.size_decimals
    }

    fn refresh_decimals(&mut self) {
        let (prc, size) = computed_decimals(&self.bids, &self.asks);
        self.prc_decimals = prc;
        self.size_decimals = size;
    }

    /// Round all prices to `dec` decimal places.
    pub fn round_price_to_decimal(&mut self, dec: u32) {
        for entry in self.bids.iter_mut().chain(self.asks.iter_mut()) {
            entry.price = round_to(entry.price, dec);
        }
        self.refresh_decimals();
    }

    /// Replaces both sides, re-sorting and recomputing cached precision.
    pub fn set_sides(&mut self, mut bids: Vec<BookEntry>, mut asks: Vec<BookEntry>) {
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        self.bids = bids;
        self.asks = asks;
        self.refresh_decimals();
    }

    /// One side with taker fees folded into price: `price * (1 + sign * fee)`
    /// with sign +1 for asks, -1 for bids. Sizes are unchanged. An extra fee
    /// leaves a provenance record of the pre-fee level; otherwise the
    /// original trail is carried over.
    pub fn side_after_fees(&self, side: Side, add_fee: f64, inverse: bool) -> Vec<BookEntry> {
        let sign = side.fee_sign();
        self.side(side)
            .iter()
            .map(|entry| {
                let fee = self.catalog.fee(&entry.venue, &self.pair, inverse) + add_fee;
                let price = entry.price * (1.0 + sign * fee);
                let price = round_to(price, round_digits(self.prc_decimals, 0, price));
                let debug = if add_fee != 0.0 {
                    let mut trail = entry.debug.clone();
                    trail.push(DebugEntry {
                        price: entry.price,
                        size: entry.size,
                        venue: entry.venue.clone(),
                        fee,
                        pair: self.pair.label(),
                        side: side.taker(),
                    });
                    trail
                } else {
                    entry.debug.clone()
                };
                BookEntry::with_debug(price, entry.size, entry.venue.clone(), debug)
            })
            .collect()
    }

    pub fn bids_after_fees(&self, add_fee: f64, inverse: bool) -> Vec<BookEntry> {
        self.side_after_fees(Side::Bid, add_fee, inverse)
    }

    pub fn asks_after_fees(&self, add_fee: f64, inverse: bool) -> Vec<BookEntry> {
        self.side_after_fees(Side::Ask, add_fee, inverse)
    }

    /// Appends a provenance record to every level of `side`, or overwrites
    /// the trails when `erases` is set.
    pub fn add_side_debug(&mut self, pair: &Pair, side: Side, erases: bool) {
        let catalog = Arc::clone(&self.catalog);
        let taker = side.taker();
        let entries = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        for entry in entries.iter_mut() {
            let record = DebugEntry {
                price: entry.price,
                size: entry.size,
                venue: entry.venue.clone(),
                fee: catalog.fee(&entry.venue, pair, false),
                pair: pair.label(),
                side: taker,
            };
            if erases {
                entry.debug = vec![record];
            } else {
                entry.debug.push(record);
            }
        }
    }

    pub fn add_levels_debug(&mut self, pair: &Pair, erases: bool) {
        self.add_side_debug(pair, Side::Bid, erases);
        self.add_side_debug(pair, Side::Ask, erases);
    }

    /// Collapses runs of equal-price levels into one, summing sizes. Debug
    /// trails are merged only when `debug` is set.
    pub fn aggregate_side_levels(&self, side: Side, debug: bool) -> Vec<BookEntry> {
        let mut res: Vec<BookEntry> = Vec::new();
        for entry in self.side(side) {
            match res.last_mut() {
                Some(last) if last.price == entry.price => {
                    let summed = last.size + entry.size;
                    last.size =
                        round_to(summed, round_digits(self.size_decimals, self.size_decimals, summed));
                    if debug {
                        last.debug.extend(entry.debug.iter().cloned());
                    }
                }
                _ => res.push(entry.clone()),
            }
        }
        res
    }

    pub fn aggregate_levels(&mut self, debug: bool) {
        self.bids = self.aggregate_side_levels(Side::Bid, debug);
        self.asks = self.aggregate_side_levels(Side::Ask, debug);
        self.refresh_decimals();
    }

    /// Cumulative size of the top `level` ranks; `None` means the whole
    /// side, out-of-bounds ranks yield zero.
    pub fn side_liquidity_to_level(&self, side: Side, level: Option<usize>) -> f64 {
        let entries = self.side(side);
        match level {
            None => entries.iter().map(|e| e.size).sum(),
            Some(0) => 0.0,
            Some(n) if n > entries.len() => 0.0,
            Some(n) => entries.iter().take(n).map(|e| e.size).sum(),
        }
    }

    /// The book for the swapped pair: per level `price' = 1/price`,
    /// `size' = size * price`, re-sorted. In debug mode each level records
    /// its source with the inverse fee lookup.
    pub fn inverse_book(&self, debug: bool) -> Self {
        let invert = |entries: &[BookEntry], side: Side| -> Vec<BookEntry> {
            entries
                .iter()
                .map(|entry| {
                    let trail = debug.then(|| DebugEntry {
                        price: entry.price,
                        size: entry.size,
                        venue: entry.venue.clone(),
                        fee: self.catalog.fee(&entry.venue, &self.pair, true),
                        pair: self.pair.label(),
                        side: side.taker(),
                    });
                    entry.inverse(self.size_decimals, self.prc_decimals, trail)
                })
                .collect()
        };
        let bids = invert(&self.bids, Side::Bid);
        let asks = invert(&self.asks, Side::Ask);
        Self::new(
            self.venue.clone(),
            self.pair.inverse(),
            self.ts,
            bids,
            asks,
            Arc::clone(&self.catalog),
        )
    }

    /// Order-book imbalance of the top N levels, in [-1, 1]. Zero depth on
    /// both sides is neutral.
    pub fn imbalance(&self, top_n: usize) -> f64 {
        let top_bids: f64 = self.bids.iter().take(top_n).map(|e| e.size).sum();
        let top_asks: f64 = self.asks.iter().take(top_n).map(|e| e.size).sum();
        let den = top_bids + top_asks;
        if den == 0.0 {
            return 0.0;
        }
        (top_bids - top_asks) / den
    }

    /// Imbalance with per-rank weights; the default `exp(-k)` weighting
    /// emphasises the top of the book, which drives short-term moves.
    pub fn weighted_imbalance(&self, top_n: usize, weights: Option<&[f64]>) -> f64 {
        let default_weights: Vec<f64>;
        let weights = match weights {
            Some(w) => w,
            None => {
                default_weights = (0..top_n).map(|k| (-(k as f64)).exp()).collect();
                &default_weights
            }
        };
        let top_bids: f64 = self
            .bids
            .iter()
            .take(top_n)
            .zip(weights)
            .map(|(e, w)| e.size * w)
            .sum();
        let top_asks: f64 = self
            .asks
            .iter()
            .take(top_n)
            .zip(weights)
            .map(|(e, w)| e.size * w)
            .sum();
        let den = top_bids + top_asks;
        if den == 0.0 {
            return 0.0;
        }
        (top_bids - top_asks) / den
    }

    /// Order Flow Imbalance between this snapshot and a previous one over the
    /// top N ranks. Ref: <https://osquant.com/papers/key-insights-limit-order-book/>
    ///
    /// Per rank, bid ΔV is +curr.size on a price improvement, the size delta
    /// on an unchanged price, and -prev.size on a retreat; the ask rule is
    /// mirrored. Missing ranks count as (0, 0). Result = Σ ΔV(bid) - Σ ΔV(ask).
    pub fn order_flow_imbalance(
        &self,
        prev_bids: &[BookEntry],
        prev_asks: &[BookEntry],
        top_n: usize,
    ) -> f64 {
        fn price_size(entries: &[BookEntry], idx: usize) -> (f64, f64) {
            entries
                .get(idx)
                .map(|e| (e.price, e.size))
                .unwrap_or((0.0, 0.0))
        }

        let mut total_delta_bid = 0.0;
        let mut total_delta_ask = 0.0;
        for i in 0..top_n {
            let (prev_prc, prev_size) = price_size(prev_bids, i);
            let (curr_prc, curr_size) = price_size(&self.bids, i);
            total_delta_bid += if curr_prc > prev_prc {
                curr_size
            } else if curr_prc == prev_prc {
                curr_size - prev_size
            } else {
                -prev_size
            };
        }
        for i in 0..top_n {
            let (prev_prc, prev_size) = price_size(prev_asks, i);
            let (curr_prc, curr_size) = price_size(&self.asks, i);
            total_delta_ask += if curr_prc > prev_prc {
                -prev_size
            } else if curr_prc == prev_prc {
                curr_size - prev_size
            } else {
                curr_size
            };
        }
        total_delta_bid - total_delta_ask
    }

    /// Serializable snapshot record.
    pub fn record(&self) -> BookRecord<'_> {
        BookRecord {
            exch: &self.venue,
            pair: self.pair.label(),
            ts: self.ts,
            date: self
                .date()
                .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
                .to_string(),
            bids: &self.bids,
            asks: &self.asks,
        }
    }
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {}, levels asks: {}, bids: {}, size asks: {}, bids: {}>",
            self.venue,
            self.pair,
            self.date(),
            self.asks_len(),
            self.bids_len(),
            round_to(self.asks_tot_size(), 6),
            round_to(self.bids_tot_size(), 6),
        )
    }
}

/// JSON shape of a serialized book snapshot.
#[derive(Debug, Serialize)]
pub struct BookRecord<'a> {
    pub exch: &'a str,
    pub pair: String,
    pub ts: f64,
    pub date: String,
    pub bids: &'a [BookEntry],
    pub asks: &'a [BookEntry],
}

fn computed_decimals(bids: &[BookEntry], asks: &[BookEntry]) -> (u32, u32) {
    let mut prc = 1;
    let mut size = 1;
    for entry in bids.iter().chain(asks.iter()) {
        prc = prc.max(count_decimals(entry.price));
        size = size.max(count_decimals(entry.size));
    }
    (prc, size)
}
