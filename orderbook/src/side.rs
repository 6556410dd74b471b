use std::fmt;

use serde::Serialize;

/// Book side selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Fee sign as the taker sees it: ask prices move up, bid prices move
    /// down.
    pub fn fee_sign(self) -> f64 {
        match self {
            Self::Ask => 1.0,
            Self::Bid => -1.0,
        }
    }

    /// Direction of the order consuming this side.
    pub fn taker(self) -> TakerSide {
        match self {
            Self::Ask => TakerSide::Buy,
            Self::Bid => TakerSide::Sell,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "bids"),
            Self::Ask => write!(f, "asks"),
        }
    }
}

/// Direction of the aggressing order: a BUY consumes asks, a SELL consumes
/// bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TakerSide {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl fmt::Display for TakerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}
