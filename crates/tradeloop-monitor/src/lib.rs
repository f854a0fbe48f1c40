//! Logging setup and run statistics.

mod logging;
mod stats;

pub use logging::setup_logging;
pub use stats::RunStats;
