//! Venue catalog: which venues are enabled, how canonical pairs map to
//! venue-native symbols, and what the taker pays where.
//!
//! The built-in rates are the venues' published base-tier taker fees
//! (<https://www.binance.com/en/fee/trading>, <https://www.okx.com/fees>,
//! <https://www.coinbase.com/advanced-fees>).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use crate::pair::Pair;

/// Label suffix for a venue's joined-book variant.
pub const JOINED_SUFFIX: &str = "_jnd";

/// Venues with built-in fee schedules and symbol mappings.
pub const AVAILABLE_VENUES: [&str; 3] = ["binance", "okx", "coinbase"];

/// Currencies allowed to bridge two component books during synthesis.
pub const VALID_QUOTES: [&str; 8] = ["DAI", "USDT", "BUSD", "USDC", "BTC", "WBTC", "WETH", "ETH"];

const DEFAULT_BASE_PAIRS: [(&str, &str); 7] = [
    ("ETH", "USDC"),
    ("USDC", "USDT"),
    ("BTC", "USDC"),
    ("ETH", "BTC"),
    ("ETH", "USDT"),
    ("ETH", "DAI"),
    ("BTC", "DAI"),
];

/// Taker fee schedule for one venue: a flat rate, or a spot rate with a
/// discounted rate for the venue's stablecoin pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeTable {
    Flat(f64),
    Split { spot: f64, stables: f64 },
}

/// Shared handle to the catalog; books keep one so fee lookups travel with
/// the data.
pub type CatalogRef = Arc<VenueCatalog>;

#[derive(Debug, Clone)]
pub struct VenueCatalog {
    venues: Vec<String>,
    fees: HashMap<String, FeeTable>,
    /// Per venue: `(native symbol, canonical pair)` in base-pair order.
    symbols: HashMap<String, Vec<(String, Pair)>>,
    /// Per venue: native symbols charged at the stables rate.
    stable_symbols: HashMap<String, HashSet<String>>,
    base_pairs: Vec<Pair>,
    valid_quotes: Vec<String>,
}

impl VenueCatalog {
    /// Catalog with the built-in venue set, fee tables and symbol mappings.
    /// `use_venues` filters the venue set; `base_pairs` overrides the default
    /// canonical pairs.
    pub fn with_defaults(use_venues: Option<&[String]>, base_pairs: Option<Vec<Pair>>) -> Self {
        let venues: Vec<String> = AVAILABLE_VENUES
            .iter()
            .copied()
            .filter(|v| match use_venues {
                Some(allowed) => allowed.iter().any(|a| a == v),
                None => true,
            })
            .map(str::to_string)
            .collect();
        let base_pairs = base_pairs.unwrap_or_else(|| {
            DEFAULT_BASE_PAIRS
                .iter()
                .map(|(b, q)| Pair::new(*b, *q))
                .collect()
        });

        let mut fees = HashMap::new();
        let mut symbols: HashMap<String, Vec<(String, Pair)>> = HashMap::new();
        let mut stable_symbols: HashMap<String, HashSet<String>> = HashMap::new();
        for venue in &venues {
            let (table, map) = match venue.as_str() {
                "binance" => {
                    let map = base_pairs
                        .iter()
                        .map(|p| (format!("{}{}", p.base(), p.quote()), p.clone()))
                        .collect();
                    stable_symbols.insert(
                        venue.clone(),
                        HashSet::from(["USDCUSDT".to_string()]),
                    );
                    (
                        FeeTable::Split {
                            spot: 0.000405,
                            stables: 0.0,
                        },
                        map,
                    )
                }
                "okx" => {
                    let map = base_pairs.iter().map(|p| (p.label(), p.clone())).collect();
                    (FeeTable::Flat(0.0004), map)
                }
                "coinbase" => {
                    // Coinbase treats USDC as USD; product discovery refines
                    // this mapping and fills the stable set at runtime.
                    let map = base_pairs
                        .iter()
                        .map(|p| (coinbase_product_id(p), p.clone()))
                        .collect();
                    stable_symbols.insert(venue.clone(), HashSet::new());
                    (
                        FeeTable::Split {
                            spot: 0.001,
                            stables: 0.00001,
                        },
                        map,
                    )
                }
                other => {
                    warn!(venue = other, "no fee table for venue, assuming zero");
                    (FeeTable::Flat(0.0), Vec::new())
                }
            };
            fees.insert(venue.clone(), table);
            symbols.insert(venue.clone(), map);
        }

        Self {
            venues,
            fees,
            symbols,
            stable_symbols,
            base_pairs,
            valid_quotes: VALID_QUOTES.iter().map(|q| (*q).to_string()).collect(),
        }
    }

    pub fn venues(&self) -> &[String] {
        &self.venues
    }

    pub fn base_pairs(&self) -> &[Pair] {
        &self.base_pairs
    }

    pub fn valid_quotes(&self) -> &[String] {
        &self.valid_quotes
    }

    /// Strips the joined-book suffix, e.g. `binance_jnd` -> `binance`.
    pub fn strip_joined(venue: &str) -> &str {
        venue.strip_suffix(JOINED_SUFFIX).unwrap_or(venue)
    }

    /// Whether taker fees should be folded into this venue's books: real
    /// venues and their joined aliases. Merged venue labels already carry
    /// fees per level.
    pub fn is_fee_venue(&self, venue: &str) -> bool {
        let stripped = Self::strip_joined(venue);
        self.venues.iter().any(|v| v == stripped)
    }

    /// Venue-native symbol for a canonical pair.
    pub fn native_symbol(&self, venue: &str, pair: &Pair) -> Option<&str> {
        self.symbols
            .get(Self::strip_joined(venue))?
            .iter()
            .find(|(_, canonical)| canonical == pair)
            .map(|(native, _)| native.as_str())
    }

    /// Canonical pair for a venue-native symbol.
    pub fn canonical_pair(&self, venue: &str, native: &str) -> Option<&Pair> {
        self.symbols
            .get(Self::strip_joined(venue))?
            .iter()
            .find(|(symbol, _)| symbol == native)
            .map(|(_, canonical)| canonical)
    }

    /// Replaces (or inserts) the native symbol for a canonical pair. The
    /// first mapping wins on conflicting natives; shadowing is reported.
    pub fn set_symbol(&mut self, venue: &str, native: impl Into<String>, canonical: Pair) {
        let native = native.into();
        let entries = self.symbols.entry(venue.to_string()).or_default();
        match entries.iter_mut().find(|(_, c)| *c == canonical) {
            Some((slot, _)) => {
                if *slot != native {
                    warn!(venue, %canonical, old = %slot, new = %native, "replacing native symbol");
                }
                *slot = native;
            }
            None => entries.push((native, canonical)),
        }
    }

    /// Replaces the venue's stable-pair set (native symbols).
    pub fn set_stable_symbols(&mut self, venue: &str, stables: HashSet<String>) {
        self.stable_symbols.insert(venue.to_string(), stables);
    }

    /// Taker fee for a pair on a venue. Joined aliases inherit the parent's
    /// schedule; `inverse` looks up the reversed pair (for books built from
    /// an inverted source). Unknown venues cost nothing but warn.
    pub fn fee(&self, venue: &str, pair: &Pair, inverse: bool) -> f64 {
        let lookup = if inverse { pair.inverse() } else { pair.clone() };
        let venue = Self::strip_joined(venue);
        match self.fees.get(venue) {
            None => {
                warn!(venue, pair = %lookup, "fee lookup for unknown venue, assuming zero");
                0.0
            }
            Some(FeeTable::Flat(rate)) => *rate,
            Some(FeeTable::Split { spot, stables }) => {
                let is_stable = self
                    .native_symbol(venue, &lookup)
                    .zip(self.stable_symbols.get(venue))
                    .is_some_and(|(native, set)| set.contains(native));
                if is_stable { *stables } else { *spot }
            }
        }
    }

    /// Combined taker fee across the legs of a synthetic trade. Fees stack
    /// linearly when taking across hops.
    pub fn combo_fee(&self, legs: &[(&str, &Pair)]) -> f64 {
        legs.iter()
            .map(|(venue, pair)| self.fee(venue, pair, false))
            .sum()
    }
}

impl Default for VenueCatalog {
    fn default() -> Self {
        Self::with_defaults(None, None)
    }
}

/// Coinbase products quote USDC markets in USD.
fn coinbase_product_id(pair: &Pair) -> String {
    let map = |code: &str| {
        if code == "USDC" {
            "USD".to_string()
        } else {
            code.to_string()
        }
    };
    format!("{}-{}", map(pair.base()), map(pair.quote()))
}
