//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::Timeframe;

/// A single candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Open time, Unix milliseconds on the market's clock
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Tick volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Create a bar opening at `open_time`.
    pub fn at(open_time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self::new(open_time.timestamp_millis(), open, high, low, close, 0.0)
    }

    /// Upper edge of the candle body.
    #[inline]
    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Lower edge of the candle body.
    #[inline]
    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Get the open time as a DateTime.
    pub fn open_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Time-series container for bars of one symbol and timeframe.
///
/// Bars are stored oldest to newest. [`BarSeries::shift`] indexes from the
/// newest bar backwards, so shift 0 is the forming candle.
#[derive(Debug, Clone)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    bars: VecDeque<Bar>,
    /// Maximum capacity (0 = unlimited)
    capacity: usize,
}

impl BarSeries {
    /// Create a new empty bar series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::new(),
            capacity: 0,
        }
    }

    /// Create a bar series with a maximum capacity.
    /// When capacity is reached, oldest bars are removed.
    pub fn with_capacity(symbol: impl Into<String>, timeframe: Timeframe, capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a tick's view of the newest candle.
    ///
    /// A bar with the same open time as the newest one replaces it (the
    /// candle is still forming); a later open time starts a new candle.
    /// Bars older than the newest one are ignored.
    pub fn push(&mut self, bar: Bar) {
        match self.bars.back_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            Some(last) if last.timestamp > bar.timestamp => {}
            _ => {
                if self.capacity > 0 && self.bars.len() >= self.capacity {
                    self.bars.pop_front();
                }
                self.bars.push_back(bar);
            }
        }
    }

    /// Push multiple bars.
    pub fn extend(&mut self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            self.push(bar);
        }
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get the bar `shift` positions back from the newest (0 = newest).
    pub fn shift(&self, shift: usize) -> Option<&Bar> {
        let index = self.bars.len().checked_sub(shift + 1)?;
        self.bars.get(index)
    }

    /// Get the newest bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Close prices of the `count` bars ending at `shift`, oldest first.
    pub fn closes_until(&self, shift: usize, count: usize) -> Vec<f64> {
        let end = self.bars.len().saturating_sub(shift);
        let start = end.saturating_sub(count);
        self.bars.range(start..end).map(|b| b.close).collect()
    }

    /// Get an iterator over the bars, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}
