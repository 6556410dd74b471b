//! Driver for combined order-book snapshots: configuration, the fetch ->
//! join -> merge -> combo cycle, and the batched result sink.

pub mod config;
pub mod runner;
pub mod sink;

pub use config::Options;
pub use runner::run;
pub use sink::ResultSink;
