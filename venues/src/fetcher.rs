//! Concurrent snapshot fetcher: one GET per (venue, pair) per cycle, all
//! awaited together, producing the venue-keyed book collection the
//! combination layer consumes.

use futures::future::join_all;
use orderbook::catalog::CatalogRef;
use orderbook::{BookMap, OrderBook};
use rest::PublicHttpClient;
use tracing::{info, warn};

use crate::errors::{VenueError, VenueResult};
use crate::{binance, coinbase, okx};

pub struct BookFetcher {
    catalog: CatalogRef,
    depth: u16,
    binance: binance::RestClient,
    okx: okx::RestClient,
    coinbase: coinbase::RestClient,
}

impl BookFetcher {
    pub fn new(http: PublicHttpClient, catalog: CatalogRef, depth: u16) -> Self {
        Self {
            catalog,
            depth,
            binance: binance::RestClient::new(http.clone()),
            okx: okx::RestClient::new(http.clone()),
            coinbase: coinbase::RestClient::new(http),
        }
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Fetches every (venue, pair) of the catalog concurrently. Failed or
    /// malformed books are skipped with a warning; every enabled venue gets
    /// an entry even when all its books failed.
    pub async fn fetch_all(&self) -> BookMap {
        let mut requests = Vec::new();
        for venue in self.catalog.venues() {
            for pair in self.catalog.base_pairs() {
                match self.catalog.native_symbol(venue, pair) {
                    Some(symbol) => requests.push((venue.clone(), symbol.to_string())),
                    None => warn!(%venue, %pair, "no native symbol, skipping"),
                }
            }
        }
        let started = std::time::Instant::now();
        let results = join_all(
            requests
                .iter()
                .map(|(venue, symbol)| self.fetch_one(venue, symbol)),
        )
        .await;
        info!(
            books = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "download books finished"
        );

        let mut obs = BookMap::new();
        for venue in self.catalog.venues() {
            obs.insert(venue.clone(), Vec::new());
        }
        for ((venue, symbol), result) in requests.iter().zip(results) {
            match result {
                Ok(book) => {
                    if let Some(books) = obs.get_mut(venue) {
                        books.push(book);
                    }
                }
                Err(err) => warn!(%venue, %symbol, error = %err, "skipping book"),
            }
        }
        obs
    }

    async fn fetch_one(&self, venue: &str, symbol: &str) -> VenueResult<OrderBook> {
        match venue {
            binance::VENUE => {
                let request = binance::DepthRequest {
                    symbol: symbol.to_string(),
                    limit: self.depth,
                };
                let resp = self.binance.depth(&request).await?;
                binance::depth::to_book(&resp, symbol, &self.catalog)
            }
            okx::VENUE => {
                let request = okx::BooksRequest {
                    inst_id: symbol.to_string(),
                    sz: self.depth,
                };
                let resp = self.okx.books(&request).await?;
                okx::books::to_book(&resp, symbol, &self.catalog)
            }
            coinbase::VENUE => {
                let resp = self.coinbase.get_product_book(symbol).await?;
                coinbase::book::to_book(&resp, symbol, self.depth as usize, &self.catalog)
            }
            other => Err(VenueError::malformed(other, symbol, "no client for venue")),
        }
    }
}
