//! Market data provider trait definition.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::types::{Bar, Timeframe};

/// A price quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Quote time on the market's clock
    pub time: DateTime<Utc>,
}

impl Quote {
    /// Get the mid price.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Get the spread.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// Price precision of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Digits after the decimal point in quoted prices
    pub digits: u32,
    /// Minimum price increment
    pub tick_size: Decimal,
}

/// Read access to bars, quotes and the market clock.
///
/// Bars are addressed by shift: 0 is the forming candle, 1 the last closed
/// one, and so on. Any shift beyond the available history fails with
/// [`DataError::DataUnavailable`].
pub trait MarketDataProvider: Send + Sync {
    /// Get the bar at `shift` for `symbol` on `timeframe`.
    fn bar(&self, symbol: &str, timeframe: Timeframe, shift: usize) -> Result<Bar, DataError>;

    /// Current time on the symbol's market clock.
    fn market_time(&self, symbol: &str) -> Result<DateTime<Utc>, DataError>;

    /// Current bid/ask for the symbol.
    fn quote(&self, symbol: &str) -> Result<Quote, DataError>;

    /// Price precision for the symbol.
    fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, DataError>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Calendar date on the symbol's market clock.
    fn local_date(&self, symbol: &str) -> Result<NaiveDate, DataError> {
        Ok(self.market_time(symbol)?.date_naive())
    }

    fn bar_open_time(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        shift: usize,
    ) -> Result<DateTime<Utc>, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.open_time())
    }

    fn open(&self, symbol: &str, timeframe: Timeframe, shift: usize) -> Result<f64, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.open)
    }

    fn high(&self, symbol: &str, timeframe: Timeframe, shift: usize) -> Result<f64, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.high)
    }

    fn low(&self, symbol: &str, timeframe: Timeframe, shift: usize) -> Result<f64, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.low)
    }

    fn close(&self, symbol: &str, timeframe: Timeframe, shift: usize) -> Result<f64, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.close)
    }

    /// Higher of open and close for the bar at `shift`.
    fn candle_body_high(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        shift: usize,
    ) -> Result<f64, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.body_high())
    }

    /// Lower of open and close for the bar at `shift`.
    fn candle_body_low(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        shift: usize,
    ) -> Result<f64, DataError> {
        Ok(self.bar(symbol, timeframe, shift)?.body_low())
    }

    /// Highest high and lowest low of bars opening within `[from, to]`.
    ///
    /// Scans backward from the newest bar and stops at the first bar opening
    /// before `from`, when history runs out, or after `max_bars` bars.
    /// Returns `None` when no bar falls inside the range.
    fn high_low_in_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max_bars: usize,
    ) -> Result<Option<(f64, f64)>, DataError> {
        let mut range: Option<(f64, f64)> = None;

        for shift in 0..max_bars {
            let bar = match self.bar(symbol, timeframe, shift) {
                Ok(bar) => bar,
                Err(DataError::DataUnavailable { .. }) => break,
                Err(e) => return Err(e),
            };
            let open_time = bar.open_time();
            if open_time < from {
                break;
            }
            if open_time <= to {
                range = Some(match range {
                    Some((high, low)) => (high.max(bar.high), low.min(bar.low)),
                    None => (bar.high, bar.low),
                });
            }
        }

        Ok(range)
    }

    /// Size of one pip in price units.
    ///
    /// Fractional-pip symbols (3 or 5 digits) quote ten ticks per pip.
    fn pip_size(&self, symbol: &str) -> Result<Decimal, DataError> {
        let info = self.symbol_info(symbol)?;
        let pip = if info.digits == 3 || info.digits == 5 {
            info.tick_size * Decimal::TEN
        } else {
            info.tick_size
        };
        Ok(pip.round_dp(info.digits))
    }
}
