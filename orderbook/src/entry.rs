use serde::Serialize;

use crate::round::{round_digits, round_to};
use crate::side::TakerSide;

/// Provenance record attached to a synthesized or fee-adjusted level: the
/// pre-transformation price and size, the venue and pair the liquidity came
/// from, the taker fee applied, and the direction the taker traded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub price: f64,
    pub size: f64,
    #[serde(rename = "exch")]
    pub venue: String,
    #[serde(rename = "fees")]
    pub fee: f64,
    pub pair: String,
    pub side: TakerSide,
}

/// One price level of a book side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookEntry {
    pub price: f64,
    pub size: f64,
    #[serde(rename = "exch")]
    pub venue: String,
    /// Provenance trail, populated only in debug mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub debug: Vec<DebugEntry>,
}

impl BookEntry {
    pub fn new(price: f64, size: f64, venue: impl Into<String>) -> Self {
        Self {
            price,
            size,
            venue: venue.into(),
            debug: Vec::new(),
        }
    }

    pub fn with_debug(price: f64, size: f64, venue: impl Into<String>, debug: Vec<DebugEntry>) -> Self {
        Self {
            price,
            size,
            venue: venue.into(),
            debug,
        }
    }

    /// The level for the swapped pair, e.g. USDT-ETH from ETH-USDT:
    /// `price' = 1/price`, `size' = size * price`. `debug` replaces the trail
    /// when given, otherwise the current trail is carried over.
    pub(crate) fn inverse(&self, deci_p: u32, deci_s: u32, debug: Option<DebugEntry>) -> Self {
        let price = 1.0 / self.price;
        let price = round_to(price, round_digits(deci_p, 0, price));
        let size = self.size * self.price;
        let size = round_to(size, round_digits(deci_s, 0, size));
        let debug = match debug {
            Some(entry) => vec![entry],
            None => self.debug.clone(),
        };
        Self {
            price,
            size,
            venue: self.venue.clone(),
            debug,
        }
    }
}

/// One consumed sub-level from a WAP traversal: the resting level's price and
/// the size taken from it, plus the traversal's `wap` and the quote amount
/// `amt` exchanged there.
#[derive(Debug, Clone, PartialEq)]
pub struct WapLevel {
    pub price: f64,
    pub size: f64,
    pub venue: String,
    pub wap: f64,
    pub amt: f64,
}
