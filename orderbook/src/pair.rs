use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A canonical trading pair, rendered `BASE-QUOTE`.
///
/// Currency codes are compared whole, never as substrings, so `BTC` does not
/// match inside `WBTC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    base: String,
    quote: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid pair label: {0}")]
pub struct PairParseError(pub String);

impl Pair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// The `BASE-QUOTE` label.
    pub fn label(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// The pair with base and quote swapped.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }

    /// Whether `code` is one of the pair's currencies (whole-code match).
    pub fn contains(&self, code: &str) -> bool {
        self.base == code || self.quote == code
    }

    /// Currency at position `idx`: 0 is base, anything else is quote.
    pub fn token(&self, idx: usize) -> &str {
        if idx == 0 { &self.base } else { &self.quote }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = PairParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() && !quote.contains('-') => {
                Ok(Self::new(base, quote))
            }
            _ => Err(PairParseError(s.to_string())),
        }
    }
}

impl Serialize for Pair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_label() {
        let pair: Pair = "ETH-USDT".parse().unwrap();
        assert_eq!(pair.base(), "ETH");
        assert_eq!(pair.quote(), "USDT");
        assert_eq!(pair.label(), "ETH-USDT");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("ETH".parse::<Pair>().is_err());
        assert!("-USDT".parse::<Pair>().is_err());
        assert!("ETH-".parse::<Pair>().is_err());
        assert!("ETH-USDT-BTC".parse::<Pair>().is_err());
    }

    #[test]
    fn test_inverse() {
        let pair = Pair::new("ETH", "USDT");
        assert_eq!(pair.inverse(), Pair::new("USDT", "ETH"));
        assert_eq!(pair.inverse().inverse(), pair);
    }

    #[test]
    fn test_contains_matches_whole_codes() {
        let pair = Pair::new("WBTC", "USDT");
        assert!(pair.contains("WBTC"));
        assert!(!pair.contains("BTC"));
    }

    #[test]
    fn test_serde_round_trip() {
        let pair = Pair::new("ETH", "USDC");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, "\"ETH-USDC\"");
        let back: Pair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }
}
