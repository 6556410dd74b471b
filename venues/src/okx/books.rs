use std::sync::Arc;

use orderbook::catalog::CatalogRef;
use orderbook::{BookEntry, OrderBook};
use serde::{Deserialize, Serialize};

use crate::errors::{VenueError, VenueResult};
use crate::okx::{RestClient, VENUE};

const BOOKS_ENDPOINT: &str = "/api/v5/market/books";

/// Request for the order book endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BooksRequest {
    /// Instrument ID, e.g. "ETH-USDT"
    #[serde(rename = "instId")]
    pub inst_id: String,
    /// Order book depth per side. Maximum 400, default 1.
    pub sz: u16,
}

/// Response from the order book endpoint.
///
/// See: <https://www.okx.com/docs-v5/en/#order-book-trading-market-data-get-order-book>
#[derive(Debug, Deserialize)]
pub struct BooksResponse {
    pub code: String,
    pub msg: String,
    pub data: Vec<BookData>,
}

/// One depth snapshot. Levels are [price, size, liquidated orders, order
/// count] as strings; only the first two are meaningful here.
#[derive(Debug, Deserialize)]
pub struct BookData {
    /// Snapshot timestamp, Unix milliseconds as a string
    pub ts: String,
    pub bids: Vec<Vec<String>>,
    pub asks: Vec<Vec<String>>,
}

impl RestClient {
    /// Order book
    pub async fn books(&self, request: &BooksRequest) -> VenueResult<BooksResponse> {
        let query = serde_urlencoded::to_string(request).map_err(|e| {
            VenueError::malformed(VENUE, &request.inst_id, format!("URL encoding error: {e}"))
        })?;
        let url = format!("{}{}?{}", self.base_url, BOOKS_ENDPOINT, query);
        Ok(self.http.get_json(&url).await?)
    }
}

/// Normalizes a books payload into a book, using the payload timestamp.
pub fn to_book(resp: &BooksResponse, inst_id: &str, catalog: &CatalogRef) -> VenueResult<OrderBook> {
    let data = resp
        .data
        .first()
        .ok_or_else(|| VenueError::malformed(VENUE, inst_id, "empty data"))?;
    let pair = catalog
        .canonical_pair(VENUE, inst_id)
        .cloned()
        .ok_or_else(|| VenueError::malformed(VENUE, inst_id, "unknown instrument"))?;
    let ts_ms: i64 = data
        .ts
        .parse()
        .map_err(|_| VenueError::malformed(VENUE, inst_id, format!("bad ts: {}", data.ts)))?;
    let ts = ts_ms as f64 / 1000.0;
    let bids = parse_levels(&data.bids, inst_id)?;
    let asks = parse_levels(&data.asks, inst_id)?;
    Ok(OrderBook::new(VENUE, pair, ts, bids, asks, Arc::clone(catalog)))
}

fn parse_levels(levels: &[Vec<String>], inst_id: &str) -> VenueResult<Vec<BookEntry>> {
    levels
        .iter()
        .map(|lvl| {
            let (price, size) = lvl
                .first()
                .zip(lvl.get(1))
                .ok_or_else(|| VenueError::malformed(VENUE, inst_id, "short level"))?;
            let price: f64 = price
                .parse()
                .map_err(|_| VenueError::malformed(VENUE, inst_id, format!("bad price: {price}")))?;
            let size: f64 = size
                .parse()
                .map_err(|_| VenueError::malformed(VENUE, inst_id, format!("bad size: {size}")))?;
            Ok(BookEntry::new(price, size, VENUE))
        })
        .collect()
}
