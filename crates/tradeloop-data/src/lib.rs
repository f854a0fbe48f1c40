//! Market data sources for the tick orchestrator.

mod csv_source;
mod store;

pub use csv_source::{read_bars, CsvBarSource};
pub use store::{InMemoryMarketData, DEFAULT_CAPACITY};

use std::path::Path;
use tradeloop_core::{Bar, DataError};

/// Load bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    CsvBarSource::new(path)?.load_all()
}
