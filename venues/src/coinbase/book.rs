use std::sync::Arc;

use chrono::{DateTime, Utc};
use orderbook::catalog::CatalogRef;
use orderbook::{BookEntry, OrderBook};
use serde::Deserialize;

use crate::coinbase::{RestClient, VENUE};
use crate::errors::{VenueError, VenueResult};

/// Response from the product book endpoint at level 2 (aggregated by price).
///
/// Coinbase returns the whole book; truncation to the requested depth happens
/// client-side. An error payload carries `message` instead of the book
/// fields, and books in auction mode are unusable for taking.
///
/// [docs](https://docs.cdp.coinbase.com/exchange/reference/exchangerestapi_getproductbook)
#[derive(Debug, Deserialize)]
pub struct GetProductBookResponse {
    /// Snapshot time, ISO-8601
    pub time: Option<DateTime<Utc>>,
    /// Each level is [price, size, num_orders]
    #[serde(default)]
    pub bids: Vec<(String, String, u64)>,
    #[serde(default)]
    pub asks: Vec<(String, String, u64)>,
    /// Set while the market runs in auction; such books are not takeable
    #[serde(default)]
    pub auction_mode: bool,
    /// Error message, present instead of book data
    pub message: Option<String>,
}

impl RestClient {
    /// Fetches the aggregated (level 2) book for a product.
    pub async fn get_product_book(&self, product_id: &str) -> VenueResult<GetProductBookResponse> {
        let url = format!("{}/products/{}/book?level=2", self.base_url, product_id);
        Ok(self.http.get_json(&url).await?)
    }
}

/// Normalizes a product book payload, truncating both sides to `depth`.
/// Error payloads and auction-mode books are rejected.
pub fn to_book(
    resp: &GetProductBookResponse,
    product_id: &str,
    depth: usize,
    catalog: &CatalogRef,
) -> VenueResult<OrderBook> {
    if let Some(message) = &resp.message {
        return Err(VenueError::malformed(VENUE, product_id, message.clone()));
    }
    if resp.auction_mode {
        return Err(VenueError::malformed(VENUE, product_id, "auction mode"));
    }
    let time = resp
        .time
        .ok_or_else(|| VenueError::malformed(VENUE, product_id, "missing time"))?;
    let pair = catalog
        .canonical_pair(VENUE, product_id)
        .cloned()
        .ok_or_else(|| VenueError::malformed(VENUE, product_id, "unknown product"))?;
    let ts = time.timestamp_millis() as f64 / 1000.0;
    let bids = parse_levels(&resp.bids, product_id, depth)?;
    let asks = parse_levels(&resp.asks, product_id, depth)?;
    Ok(OrderBook::new(VENUE, pair, ts, bids, asks, Arc::clone(catalog)))
}

fn parse_levels(
    levels: &[(String, String, u64)],
    product_id: &str,
    depth: usize,
) -> VenueResult<Vec<BookEntry>> {
    levels
        .iter()
        .take(depth)
        .map(|(price, size, _)| {
            let price: f64 = price.parse().map_err(|_| {
                VenueError::malformed(VENUE, product_id, format!("bad price: {price}"))
            })?;
            let size: f64 = size.parse().map_err(|_| {
                VenueError::malformed(VENUE, product_id, format!("bad size: {size}"))
            })?;
            Ok(BookEntry::new(price, size, VENUE))
        })
        .collect()
}
