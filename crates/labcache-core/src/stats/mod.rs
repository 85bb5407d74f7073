//! Cache effectiveness statistics
//!
//! [`Statistics`] is the persisted counter set; [`StatisticsTracker`] applies
//! classification outcomes to the copy held by the pattern store.

mod statistics;
mod tracker;

pub use statistics::Statistics;
pub use tracker::{ChunkOutcome, StatisticsTracker};
