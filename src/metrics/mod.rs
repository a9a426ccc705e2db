//! Operational metrics: collection and aggregation.
//!
//! - [`series`]: FIFO-capped sample sequences
//! - [`stats`]: mean / min / max / median over a sequence
//! - [`interactions`]: user-activity counters and sessions
//! - [`probe`]: client-side readings (host process or posted by a browser)
//! - [`collector`]: the owned collector and its Idle/Collecting lifecycle
//! - [`score`]: composite 0–100 client performance score
//! - [`sampler`]: timer threads that feed a shared collector

pub mod collector;
pub mod interactions;
pub mod probe;
pub mod sampler;
pub mod score;
pub mod series;
pub mod stats;

pub use collector::{CollectionState, MetricsCollector};
pub use sampler::{Sampler, SharedCollector};

/// Current time as epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
