//! Catalog bootstrap: the static venue tables refined by product discovery.

use orderbook::{Pair, VenueCatalog};
use rest::PublicHttpClient;
use tracing::warn;

use crate::coinbase;

/// Builds the venue catalog. When coinbase is enabled its product list is
/// fetched to resolve canonical pairs to product ids and to fill the
/// stablecoin set; discovery failure degrades to the static mapping with a
/// warning.
pub async fn build_catalog(
    http: &PublicHttpClient,
    use_venues: Option<&[String]>,
    base_pairs: Option<Vec<Pair>>,
) -> VenueCatalog {
    let mut catalog = VenueCatalog::with_defaults(use_venues, base_pairs);
    if catalog.venues().iter().any(|v| v == coinbase::VENUE) {
        let client = coinbase::RestClient::new(http.clone());
        match client.get_products().await {
            Ok(products) => {
                for pair in catalog.base_pairs().to_vec() {
                    match coinbase::products::resolve_product_id(&products, &pair) {
                        Some(id) => catalog.set_symbol(coinbase::VENUE, id, pair),
                        None => warn!(%pair, "pair not found in coinbase products"),
                    }
                }
                catalog.set_stable_symbols(
                    coinbase::VENUE,
                    coinbase::products::stable_product_ids(&products),
                );
            }
            Err(err) => {
                warn!(error = %err, "coinbase product discovery failed, using static mapping");
            }
        }
    }
    catalog
}
