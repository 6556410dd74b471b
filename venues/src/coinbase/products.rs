use std::collections::HashSet;

use orderbook::Pair;
use serde::Deserialize;

use crate::coinbase::RestClient;
use crate::errors::VenueResult;

const PRODUCTS_ENDPOINT: &str = "/products";

/// One tradeable market as Coinbase lists it.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    /// Market id, "BTC-USD" style
    pub id: String,

    /// Base leg of the market
    pub base_currency: String,

    /// Quote leg of the market
    pub quote_currency: String,

    /// Human-readable market name
    #[serde(default)]
    pub display_name: String,

    /// Listing status, e.g. "online"
    #[serde(default)]
    pub status: String,

    /// True while the market is halted
    #[serde(default)]
    pub trading_disabled: bool,

    /// True for stablecoin-to-fiat markets, which price at the discounted
    /// fee tier
    #[serde(default)]
    pub fx_stablecoin: bool,

    /// True while the market runs in auction rather than continuous trading
    #[serde(default)]
    pub auction_mode: bool,
}

/// The product listing is a bare JSON array.
pub type GetProductsResponse = Vec<Product>;

impl RestClient {
    /// Lists every market the exchange knows about.
    ///
    /// [docs](https://docs.cdp.coinbase.com/exchange/reference/exchangerestapi_getproducts)
    pub async fn get_products(&self) -> VenueResult<GetProductsResponse> {
        let url = format!("{}{}", self.base_url, PRODUCTS_ENDPOINT);
        Ok(self.http.get_json(&url).await?)
    }
}

/// Native ids of tradeable stablecoin pairs.
pub fn stable_product_ids(products: &[Product]) -> HashSet<String> {
    products
        .iter()
        .filter(|p| !p.trading_disabled && p.fx_stablecoin)
        .map(|p| p.id.clone())
        .collect()
}

/// Finds the Coinbase product for a canonical pair. USDC quotes as USD on
/// Coinbase, and the inverted orientation is accepted when the direct one is
/// not listed.
pub fn resolve_product_id(products: &[Product], pair: &Pair) -> Option<String> {
    let map = |code: &str| {
        if code == "USDC" { "USD".to_string() } else { code.to_string() }
    };
    let direct = format!("{}-{}", map(pair.base()), map(pair.quote()));
    let inverted = format!("{}-{}", map(pair.quote()), map(pair.base()));
    products
        .iter()
        .find(|p| p.id == direct || p.id == inverted)
        .map(|p| p.id.clone())
}
