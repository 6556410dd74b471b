//! Core model for combined ("combo") order books: depth snapshots per venue,
//! fee-adjusted taker views, weighted-average-price traversal with replayable
//! consumption state, and the combination algebra (intra-venue joins,
//! cross-venue merges, synthetic pair construction).

pub mod book;
pub mod catalog;
pub mod combine;
pub mod entry;
pub mod pair;
pub mod round;
pub mod side;
pub mod wap;

// Re-export the main types
pub use book::{BookRecord, OrderBook, now_utc_ts};
pub use catalog::{FeeTable, JOINED_SUFFIX, VenueCatalog};
pub use combine::dispatch::{combo_book, get_taker_book, match_from_joined, pairs_sanity_check};
pub use combine::join::{
    BookMap, JoinMap, JoinMode, multi_join_venue_books, n_books_join, venue_book, venue_pairs,
};
pub use combine::merge::cross_venue_merge;
pub use combine::synth::{CombineCase, MERGED_VENUE, case_select, combo_by_conversion, find_pairs};
pub use entry::{BookEntry, DebugEntry, WapLevel};
pub use pair::{Pair, PairParseError};
pub use side::{Side, TakerSide};
pub use wap::WapState;
