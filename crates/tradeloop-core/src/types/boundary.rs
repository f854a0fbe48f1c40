//! Day and candle boundary state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Last observed day and candle for one (symbol, timeframe) pair.
///
/// `None` fields mean the pair has not been observed yet, so the first check
/// always reports a new day and a new candle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryState {
    /// Calendar date on the market clock at the last check
    pub current_local_date: Option<NaiveDate>,
    /// Open time of the newest candle at the last check
    pub current_candle_open_time: Option<DateTime<Utc>>,
    /// Bars opened strictly after local midnight, counting the newest
    pub candle_distance_to_day_start: usize,
}
