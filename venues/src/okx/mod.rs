// OKX public market data.

pub mod books;

use std::borrow::Cow;

pub use books::{BookData, BooksRequest, BooksResponse};
use rest::PublicHttpClient;

pub const VENUE: &str = "okx";

const DEFAULT_BASE_URL: &str = "https://www.okx.com";

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
