use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use orderbook::catalog::CatalogRef;
use orderbook::{
    JOINED_SUFFIX, JoinMap, JoinMode, Pair, combo_book, cross_venue_merge,
    multi_join_venue_books, pairs_sanity_check,
};
use rest::{PublicHttpClient, RetryPolicy};
use tracing::{info, warn};
use venues::{BookFetcher, build_catalog};

use crate::config::Options;
use crate::sink::ResultSink;

/// Default intra-venue joins: DAI treated as 1:1 with USDC.
fn default_join_map() -> JoinMap {
    let mut map = JoinMap::new();
    map.insert(
        Pair::new("ETH", "USDC"),
        (Pair::new("ETH", "USDC"), Pair::new("ETH", "DAI")),
    );
    map.insert(
        Pair::new("BTC", "USDC"),
        (Pair::new("BTC", "USDC"), Pair::new("BTC", "DAI")),
    );
    map
}

fn parse_pairs(labels: &[String]) -> Result<Vec<Pair>> {
    labels
        .iter()
        .map(|l| l.parse::<Pair>().with_context(|| format!("bad pair: {l}")))
        .collect()
}

/// Runs snapshot cycles until the deadline or ctrl-c. A cancel mid-fetch
/// discards that cycle; buffered results are flushed on the way out.
pub async fn run(opts: Options) -> Result<()> {
    let policy = RetryPolicy {
        retries: opts.book_retries,
        init_backoff: Duration::from_millis(opts.init_backoff),
        timeout: Duration::from_millis(opts.book_timeout),
    };
    let http = PublicHttpClient::new(policy)?;
    let use_venues = (!opts.use_venues.is_empty()).then_some(opts.use_venues.as_slice());
    let base_pairs = if opts.base_pairs.is_empty() {
        None
    } else {
        Some(parse_pairs(&opts.base_pairs)?)
    };
    let catalog: CatalogRef = Arc::new(build_catalog(&http, use_venues, base_pairs).await);
    info!(venues = ?catalog.venues(), "using venues");
    let pairs = parse_pairs(&opts.pairs)?;
    let fetcher = BookFetcher::new(http, Arc::clone(&catalog), opts.depth);

    let file_name = format!("comboResults_{}.json", Utc::now().format("%H%M%ST%d%m%y"));
    let mut sink = ResultSink::new(opts.data_dir.clone(), file_name, opts.flush_every)?;
    let join_map = default_join_map();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(opts.run_for);
    let planned_iters = opts.run_for / opts.iter_every.max(1);
    info!(
        run_for_secs = opts.run_for,
        iter_every_secs = opts.iter_every,
        planned_iters,
        "starting snapshot loop"
    );

    let cycles = async {
        let mut remaining = planned_iters;
        while tokio::time::Instant::now() < deadline {
            if let Err(err) = cycle(&fetcher, &catalog, &pairs, &join_map, &opts, &mut sink).await {
                warn!(error = %err, "cycle failed");
            }
            remaining = remaining.saturating_sub(1);
            info!(remaining, "cycle done");
            tokio::time::sleep(Duration::from_secs(opts.iter_every)).await;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("stopped by user"),
        _ = cycles => info!("deadline reached"),
    }
    sink.flush()?;
    Ok(())
}

/// One snapshot cycle: fetch, join, merge, produce combo books, sink them.
async fn cycle(
    fetcher: &BookFetcher,
    catalog: &CatalogRef,
    pairs: &[Pair],
    join_map: &JoinMap,
    opts: &Options,
    sink: &mut ResultSink,
) -> Result<()> {
    let mut obs = fetcher.fetch_all().await;
    pairs_sanity_check(&obs, catalog.venues());
    let venues = catalog.venues().to_vec();
    multi_join_venue_books(
        join_map,
        &mut obs,
        &venues,
        JoinMode::Replace,
        false,
        opts.agg_levels,
    );
    let joined_venues: Vec<String> = obs
        .keys()
        .filter(|k| k.ends_with(JOINED_SUFFIX))
        .cloned()
        .collect();
    let merged = cross_venue_merge(&joined_venues, &obs, true, opts.agg_levels);
    obs.extend(merged);

    // combo books on the joined and merged ladders; raw venues only when no
    // join produced a sibling
    let mut combo_venues: Vec<String> = obs
        .keys()
        .filter(|k| k.ends_with(JOINED_SUFFIX) || k.contains('-'))
        .cloned()
        .collect();
    if combo_venues.is_empty() {
        combo_venues = obs.keys().cloned().collect();
    }

    for pair in pairs {
        for venue in &combo_venues {
            for book in combo_book(pair, venue, &obs, Some(join_map), opts.debug, opts.agg_levels) {
                sink.push(serde_json::to_value(book.record())?)?;
            }
        }
    }
    Ok(())
}
