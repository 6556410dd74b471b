//! The book-combination algebra: intra-venue joins of equivalent pairs,
//! cross-venue merges of a common pair, synthetic pair construction, and the
//! dispatcher that picks between them.

pub mod dispatch;
pub mod join;
pub mod merge;
pub mod synth;
