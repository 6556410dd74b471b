// Coinbase Exchange public market data and product discovery.

pub mod book;
pub mod products;

use std::borrow::Cow;

pub use book::GetProductBookResponse;
pub use products::{GetProductsResponse, Product};
use rest::PublicHttpClient;

pub const VENUE: &str = "coinbase";

const DEFAULT_BASE_URL: &str = "https://api.exchange.coinbase.com";

#[derive(Debug, Clone)]
pub struct RestClient {
    /// Endpoint paths are appended to this
    pub base_url: Cow<'static, str>,

    /// Shared transport with the retry policy baked in
    pub http: PublicHttpClient,
}

impl RestClient {
    /// Creates a public REST client against the production base URL.
    pub fn new(http: PublicHttpClient) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, http)
    }

    pub fn with_base_url(base_url: impl Into<Cow<'static, str>>, http: PublicHttpClient) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }
}
