//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tradeloop_core::{EngineError, EngineResult, Timeframe};

/// Construction-time settings for one strategy instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeframe whose candles gate evaluation
    pub timeframe: Timeframe,
    /// Symbols processed on every tick, in order
    pub symbols: Vec<String>,
    /// Evaluate signals only on the first tick of each candle
    pub eval_once_per_candle: bool,
    /// Close open market orders opposite to a new signal
    pub close_on_opposing_signal: bool,
    /// Slippage budget for new orders, in points
    pub entry_slippage: u32,
    /// Slippage budget for closes, in points
    pub close_slippage: u32,
    /// Upper bound on the backward scan for the day's first candle
    pub max_day_scan_bars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::H1,
            symbols: Vec::new(),
            eval_once_per_candle: true,
            close_on_opposing_signal: true,
            entry_slippage: 5000,
            close_slippage: 5,
            max_day_scan_bars: 10_000,
        }
    }
}

impl EngineConfig {
    /// Create a config for `symbols` on `timeframe` with default policies.
    pub fn new(timeframe: Timeframe, symbols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            timeframe,
            symbols: symbols.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_eval_once_per_candle(mut self, enabled: bool) -> Self {
        self.eval_once_per_candle = enabled;
        self
    }

    pub fn with_close_on_opposing_signal(mut self, enabled: bool) -> Self {
        self.close_on_opposing_signal = enabled;
        self
    }

    pub fn with_max_day_scan_bars(mut self, bars: usize) -> Self {
        self.max_day_scan_bars = bars;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.symbols.is_empty() {
            return Err(EngineError::Config(
                "Symbol list should not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(EngineError::Config("Symbol names must not be blank".into()));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(EngineError::Config(format!("Duplicate symbol: {}", symbol)));
            }
        }
        if self.max_day_scan_bars == 0 {
            return Err(EngineError::Config(
                "max_day_scan_bars must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new(Timeframe::H1, ["EURUSD"]);
        assert!(config.eval_once_per_candle);
        assert!(config.close_on_opposing_signal);
        assert_eq!(config.entry_slippage, 5000);
        assert_eq!(config.close_slippage, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let empty = EngineConfig::new(Timeframe::H1, Vec::<String>::new());
        assert!(matches!(empty.validate(), Err(EngineError::Config(_))));

        let dup = EngineConfig::new(Timeframe::H1, ["EURUSD", "EURUSD"]);
        assert!(dup.validate().is_err());

        let blank = EngineConfig::new(Timeframe::H1, [" "]);
        assert!(blank.validate().is_err());

        let unbounded = EngineConfig::new(Timeframe::H1, ["EURUSD"]).with_max_day_scan_bars(0);
        assert!(unbounded.validate().is_err());
    }
}
