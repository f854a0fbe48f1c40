//! In-memory market data store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;
use tradeloop_core::{Bar, BarSeries, DataError, MarketDataProvider, Quote, SymbolInfo, Timeframe};

/// Default number of bars kept per (symbol, timeframe).
pub const DEFAULT_CAPACITY: usize = 50_000;

#[derive(Debug, Default)]
struct Inner {
    series: HashMap<(String, Timeframe), BarSeries>,
    clocks: HashMap<String, DateTime<Utc>>,
    quotes: HashMap<String, Quote>,
    symbols: HashMap<String, SymbolInfo>,
}

impl Inner {
    fn advance_clock(&mut self, symbol: &str, time: DateTime<Utc>) {
        let clock = self.clocks.entry(symbol.to_string()).or_insert(time);
        if time > *clock {
            *clock = time;
        }
    }

    /// Newest bar of the symbol across all of its timeframes.
    fn newest_bar(&self, symbol: &str) -> Option<Bar> {
        self.series
            .iter()
            .filter(|((s, _), _)| s == symbol)
            .filter_map(|(_, series)| series.last().copied())
            .max_by_key(|bar| bar.timestamp)
    }
}

/// Market data held in memory and fed by the caller.
///
/// Pushing a bar advances the symbol's market clock to the bar's open time.
/// Without an explicit quote, the symbol is quoted at the newest close with
/// the configured spread.
#[derive(Debug)]
pub struct InMemoryMarketData {
    inner: RwLock<Inner>,
    capacity: usize,
    spread: Decimal,
    default_info: SymbolInfo,
}

impl Default for InMemoryMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: DEFAULT_CAPACITY,
            spread: Decimal::ZERO,
            default_info: SymbolInfo {
                digits: 5,
                tick_size: Decimal::new(1, 5),
            },
        }
    }

    /// Set the number of bars kept per series.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the spread used for quotes derived from bars.
    pub fn with_spread(mut self, spread: Decimal) -> Self {
        self.spread = spread;
        self
    }

    /// Set the precision used for symbols without their own info.
    pub fn with_default_symbol_info(mut self, info: SymbolInfo) -> Self {
        self.default_info = info;
        self
    }

    /// Add a bar, replacing the newest one if it has the same open time.
    pub fn push_bar(&self, symbol: &str, timeframe: Timeframe, bar: Bar) {
        let mut inner = self.inner.write().unwrap();
        let capacity = self.capacity;
        inner
            .series
            .entry((symbol.to_string(), timeframe))
            .or_insert_with(|| BarSeries::with_capacity(symbol, timeframe, capacity))
            .push(bar);
        inner.advance_clock(symbol, bar.open_time());
    }

    /// Replace the whole series for (symbol, timeframe).
    pub fn set_bars(&self, symbol: &str, timeframe: Timeframe, mut bars: Vec<Bar>) {
        bars.sort_by_key(|b| b.timestamp);
        let newest = bars.last().map(Bar::open_time);

        let mut series = BarSeries::with_capacity(symbol, timeframe, self.capacity);
        series.extend(bars);

        let mut inner = self.inner.write().unwrap();
        inner.series.insert((symbol.to_string(), timeframe), series);
        if let Some(time) = newest {
            inner.advance_clock(symbol, time);
        }
    }

    /// Set the symbol's market clock, forwards or backwards.
    pub fn set_time(&self, symbol: &str, time: DateTime<Utc>) {
        self.inner
            .write()
            .unwrap()
            .clocks
            .insert(symbol.to_string(), time);
    }

    /// Set an explicit quote; the market clock advances to its time.
    pub fn set_quote(&self, symbol: &str, quote: Quote) {
        let mut inner = self.inner.write().unwrap();
        inner.quotes.insert(symbol.to_string(), quote);
        inner.advance_clock(symbol, quote.time);
    }

    /// Drop the explicit quote so quotes are derived from bars again.
    pub fn clear_quote(&self, symbol: &str) {
        self.inner.write().unwrap().quotes.remove(symbol);
    }

    pub fn set_symbol_info(&self, symbol: &str, info: SymbolInfo) {
        self.inner
            .write()
            .unwrap()
            .symbols
            .insert(symbol.to_string(), info);
    }

    /// Number of bars held for (symbol, timeframe).
    pub fn bar_count(&self, symbol: &str, timeframe: Timeframe) -> usize {
        self.inner
            .read()
            .unwrap()
            .series
            .get(&(symbol.to_string(), timeframe))
            .map_or(0, BarSeries::len)
    }

    /// Closes oldest-first, ending at `shift`, at most `count` of them.
    pub fn closes(&self, symbol: &str, timeframe: Timeframe, shift: usize, count: usize) -> Vec<f64> {
        self.inner
            .read()
            .unwrap()
            .series
            .get(&(symbol.to_string(), timeframe))
            .map(|s| s.closes_until(shift, count))
            .unwrap_or_default()
    }
}

impl MarketDataProvider for InMemoryMarketData {
    fn bar(&self, symbol: &str, timeframe: Timeframe, shift: usize) -> Result<Bar, DataError> {
        self.inner
            .read()
            .unwrap()
            .series
            .get(&(symbol.to_string(), timeframe))
            .and_then(|series| series.shift(shift).copied())
            .ok_or_else(|| DataError::DataUnavailable {
                symbol: symbol.to_string(),
                timeframe,
                shift,
            })
    }

    fn market_time(&self, symbol: &str) -> Result<DateTime<Utc>, DataError> {
        self.inner
            .read()
            .unwrap()
            .clocks
            .get(symbol)
            .copied()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }

    fn quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let inner = self.inner.read().unwrap();
        if let Some(quote) = inner.quotes.get(symbol) {
            return Ok(*quote);
        }

        let bar = inner
            .newest_bar(symbol)
            .ok_or_else(|| DataError::NoQuote(symbol.to_string()))?;
        let digits = inner
            .symbols
            .get(symbol)
            .map_or(self.default_info.digits, |info| info.digits);
        let bid = Decimal::try_from(bar.close)
            .map_err(|e| DataError::ParseError(format!("close {}: {}", bar.close, e)))?
            .round_dp(digits);

        Ok(Quote {
            bid,
            ask: bid + self.spread,
            time: inner.clocks.get(symbol).copied().unwrap_or(bar.open_time()),
        })
    }

    fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo, DataError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .symbols
            .get(symbol)
            .copied()
            .unwrap_or(self.default_info))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, h, 0, 0).unwrap()
    }

    #[test]
    fn test_shift_addressing() {
        let market = InMemoryMarketData::new();
        for h in 0..3 {
            market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(h), 1.0, 1.0, 1.0, h as f64));
        }

        assert_eq!(market.close("EURUSD", Timeframe::H1, 0).unwrap(), 2.0);
        assert_eq!(market.close("EURUSD", Timeframe::H1, 2).unwrap(), 0.0);
        assert!(matches!(
            market.bar("EURUSD", Timeframe::H1, 3),
            Err(DataError::DataUnavailable { shift: 3, .. })
        ));
        assert!(market.bar("EURUSD", Timeframe::M5, 0).is_err());
        assert_eq!(market.closes("EURUSD", Timeframe::H1, 1, 5), vec![0.0, 1.0]);
    }

    #[test]
    fn test_intra_bar_update_replaces_newest() {
        let market = InMemoryMarketData::new();
        market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(1), 1.0, 1.1, 0.9, 1.05));
        market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(1), 1.0, 1.2, 0.9, 1.15));

        assert_eq!(market.bar_count("EURUSD", Timeframe::H1), 1);
        assert_eq!(market.high("EURUSD", Timeframe::H1, 0).unwrap(), 1.2);
    }

    #[test]
    fn test_clock_follows_bars() {
        let market = InMemoryMarketData::new();
        assert!(matches!(
            market.market_time("EURUSD"),
            Err(DataError::SymbolNotFound(_))
        ));

        market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(3), 1.0, 1.0, 1.0, 1.0));
        assert_eq!(market.market_time("EURUSD").unwrap(), hour(3));

        market.set_time("EURUSD", hour(3) + chrono::Duration::minutes(20));
        market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(3), 1.0, 1.0, 1.0, 1.0));
        assert_eq!(
            market.market_time("EURUSD").unwrap(),
            hour(3) + chrono::Duration::minutes(20)
        );
        assert_eq!(market.local_date("EURUSD").unwrap(), hour(0).date_naive());
    }

    #[test]
    fn test_derived_and_explicit_quotes() {
        let market = InMemoryMarketData::new().with_spread(dec!(0.0002));
        assert!(matches!(market.quote("EURUSD"), Err(DataError::NoQuote(_))));

        market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(1), 1.1, 1.2, 1.0, 1.10005));
        let quote = market.quote("EURUSD").unwrap();
        assert_eq!(quote.bid, dec!(1.10005));
        assert_eq!(quote.ask, dec!(1.10025));

        let explicit = Quote {
            bid: dec!(1.2),
            ask: dec!(1.3),
            time: hour(2),
        };
        market.set_quote("EURUSD", explicit);
        assert_eq!(market.quote("EURUSD").unwrap(), explicit);
        assert_eq!(market.market_time("EURUSD").unwrap(), hour(2));

        market.clear_quote("EURUSD");
        assert_eq!(market.quote("EURUSD").unwrap().bid, dec!(1.10005));
    }

    #[test]
    fn test_set_bars_sorts_and_replaces() {
        let market = InMemoryMarketData::new();
        market.push_bar("EURUSD", Timeframe::H1, Bar::at(hour(9), 1.0, 1.0, 1.0, 1.0));
        market.set_bars(
            "EURUSD",
            Timeframe::H1,
            vec![
                Bar::at(hour(2), 1.0, 1.0, 1.0, 2.0),
                Bar::at(hour(1), 1.0, 1.0, 1.0, 1.0),
            ],
        );

        assert_eq!(market.bar_count("EURUSD", Timeframe::H1), 2);
        assert_eq!(market.bar_open_time("EURUSD", Timeframe::H1, 0).unwrap(), hour(2));
    }

    #[test]
    fn test_symbol_info_defaults() {
        let market = InMemoryMarketData::new();
        assert_eq!(market.pip_size("EURUSD").unwrap(), dec!(0.0001));

        market.set_symbol_info(
            "USDJPY",
            SymbolInfo {
                digits: 3,
                tick_size: dec!(0.001),
            },
        );
        assert_eq!(market.pip_size("USDJPY").unwrap(), dec!(0.01));
    }
}
