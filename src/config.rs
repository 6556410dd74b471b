use std::path::PathBuf;

use clap::Parser;

/// Combined order books across crypto exchanges.
#[derive(Debug, Clone, Parser)]
#[command(name = "combooks", version, about)]
pub struct Options {
    /// Depth levels requested per venue (coinbase is truncated client-side)
    #[arg(long, default_value_t = 50)]
    pub depth: u16,

    /// Venues to use; defaults to all known venues
    #[arg(long = "use-venue", value_name = "VENUE")]
    pub use_venues: Vec<String>,

    /// Canonical BASE-QUOTE pairs to fetch; defaults to the built-in set
    #[arg(long = "base-pair", value_name = "PAIR")]
    pub base_pairs: Vec<String>,

    /// Pairs to produce combo books for
    #[arg(
        long = "pair",
        value_name = "PAIR",
        default_values_t = ["ETH-USDC".to_string(), "ETH-DAI".to_string(), "ETH-USDT".to_string()]
    )]
    pub pairs: Vec<String>,

    /// Attempts per book request
    #[arg(long, default_value_t = 3)]
    pub book_retries: u32,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub book_timeout: u64,

    /// Initial retry backoff in milliseconds (doubles per attempt)
    #[arg(long, default_value_t = 250)]
    pub init_backoff: u64,

    /// Populate per-level provenance trails
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Aggregate equal-price levels after every transformation
    #[arg(long, default_value_t = false)]
    pub agg_levels: bool,

    /// Directory for result batches
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Flush the sink every N records
    #[arg(long, default_value_t = 200)]
    pub flush_every: usize,

    /// Total run time in seconds
    #[arg(long, default_value_t = 120)]
    pub run_for: u64,

    /// Seconds between snapshot cycles
    #[arg(long, default_value_t = 5)]
    pub iter_every: u64,
}
