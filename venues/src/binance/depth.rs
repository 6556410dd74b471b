use std::sync::Arc;

use orderbook::catalog::CatalogRef;
use orderbook::{BookEntry, OrderBook, now_utc_ts};
use serde::{Deserialize, Serialize};

use crate::binance::{RestClient, VENUE};
use crate::errors::{VenueError, VenueResult};

const DEPTH_ENDPOINT: &str = "/api/v3/depth";

/// Request for the order book depth endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DepthRequest {
    /// Symbol in Binance form, e.g. "ETHUSDT"
    pub symbol: String,
    /// Levels per side; the API accepts 5, 10, 20, 50, 100, 500, 1000 or 5000
    pub limit: u16,
}

/// Depth endpoint payload: both sides of the book as decimal strings.
///
/// [docs](https://developers.binance.com/docs/binance-spot-api-docs/rest-api/public-api-endpoints#order-book)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthResponse {
    /// Book version at snapshot time
    pub last_update_id: i64,
    /// Buy levels, best (highest) price first; each is a [price, quantity]
    /// string pair
    pub bids: Vec<(String, String)>,
    /// Sell levels, best (lowest) price first; same string-pair shape
    pub asks: Vec<(String, String)>,
}

impl RestClient {
    /// Fetches level-2 depth for a symbol.
    pub async fn depth(&self, request: &DepthRequest) -> VenueResult<DepthResponse> {
        let query = serde_urlencoded::to_string(request).map_err(|e| {
            VenueError::malformed(VENUE, &request.symbol, format!("URL encoding error: {e}"))
        })?;
        let url = format!("{}{}?{}", self.base_url, DEPTH_ENDPOINT, query);
        Ok(self.http.get_json(&url).await?)
    }
}

/// Normalizes a depth payload into a book. Binance sends no timestamp with
/// level-2 depth; the snapshot is assumed to be ~500ms old.
pub fn to_book(resp: &DepthResponse, symbol: &str, catalog: &CatalogRef) -> VenueResult<OrderBook> {
    let pair = catalog
        .canonical_pair(VENUE, symbol)
        .cloned()
        .ok_or_else(|| VenueError::malformed(VENUE, symbol, "unknown symbol"))?;
    let ts = now_utc_ts() - 0.5;
    let bids = parse_levels(&resp.bids, symbol)?;
    let asks = parse_levels(&resp.asks, symbol)?;
    Ok(OrderBook::new(VENUE, pair, ts, bids, asks, Arc::clone(catalog)))
}

fn parse_levels(levels: &[(String, String)], symbol: &str) -> VenueResult<Vec<BookEntry>> {
    levels
        .iter()
        .map(|(price, size)| {
            let price: f64 = price
                .parse()
                .map_err(|_| VenueError::malformed(VENUE, symbol, format!("bad price: {price}")))?;
            let size: f64 = size
                .parse()
                .map_err(|_| VenueError::malformed(VENUE, symbol, format!("bad size: {size}")))?;
            Ok(BookEntry::new(price, size, VENUE))
        })
        .collect()
}
