//! Moving Average Crossover signal.
//!
//! Compares a fast and a slow moving average on the last two closed bars:
//! a fast MA moving from above to below the slow MA is a sell, the reverse a
//! buy.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tradeloop_core::{
    DataError, EngineResult, HookContext, MarketDataProvider, SignalInfo, SignalResult,
    StrategyError, Timeframe,
};

use crate::indicators::{Indicator, MaMethod};
use crate::signal::SignalSource;

/// Configuration for the MA Cross signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossConfig {
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
    pub fast_method: MaMethod,
    pub slow_method: MaMethod,
    /// Bars by which both averages are shifted back
    pub ma_shift: usize,
    /// Closed bars fed to the averages
    pub lookback: usize,
}

impl Default for MaCrossConfig {
    fn default() -> Self {
        Self {
            fast_period: 13,
            slow_period: 48,
            fast_method: MaMethod::Ema,
            slow_method: MaMethod::Ema,
            ma_shift: 0,
            lookback: 250,
        }
    }
}

impl MaCrossConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.fast_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        if self.lookback <= self.slow_period {
            return Err(StrategyError::InvalidConfig(format!(
                "Lookback ({}) must exceed the slow period ({})",
                self.lookback, self.slow_period
            )));
        }
        Ok(())
    }
}

/// Moving Average Crossover signal source.
pub struct MaCross {
    config: MaCrossConfig,
    fast: Box<dyn Indicator>,
    slow: Box<dyn Indicator>,
}

impl MaCross {
    pub fn new(config: MaCrossConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            fast: config.fast_method.indicator(config.fast_period),
            slow: config.slow_method.indicator(config.slow_period),
            config,
        })
    }

    pub fn config(&self) -> &MaCrossConfig {
        &self.config
    }
}

/// Closes oldest-first, from `start + count - 1` down to `start`, cut short
/// where history ends.
fn collect_closes(
    market: &dyn MarketDataProvider,
    symbol: &str,
    timeframe: Timeframe,
    start: usize,
    count: usize,
) -> Result<Vec<f64>, DataError> {
    let mut closes = Vec::with_capacity(count);
    for shift in start..start + count {
        match market.close(symbol, timeframe, shift) {
            Ok(close) => closes.push(close),
            Err(DataError::DataUnavailable { .. }) => break,
            Err(e) => return Err(e),
        }
    }
    closes.reverse();
    Ok(closes)
}

/// The newest two values as (newest, previous).
fn last_two(values: &[f64]) -> Option<(f64, f64)> {
    match values {
        [.., previous, newest] => Some((*newest, *previous)),
        _ => None,
    }
}

impl SignalSource for MaCross {
    fn name(&self) -> &str {
        "MA Cross"
    }

    fn evaluate(&self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<SignalResult> {
        let closes = collect_closes(
            ctx.market,
            symbol,
            ctx.timeframe,
            1 + self.config.ma_shift,
            self.config.lookback,
        )?;

        let (Some((fast1, fast2)), Some((slow1, slow2))) = (
            last_two(&self.fast.calculate(&closes)),
            last_two(&self.slow.calculate(&closes)),
        ) else {
            debug!(symbol, bars = closes.len(), "Not enough history for MA cross");
            return Ok(SignalResult::neutral());
        };

        let signal = if fast1 < slow1 && fast2 > slow2 {
            SignalResult::sell_market()
        } else if fast1 > slow1 && fast2 < slow2 {
            SignalResult::buy_market()
        } else {
            return Ok(SignalResult::neutral());
        };

        let direction = if signal.code() > 0 { "above" } else { "below" };
        let info = SignalInfo {
            strategy_name: self.name().to_string(),
            indicators: [
                ("fast_ma_1".to_string(), fast1),
                ("fast_ma_2".to_string(), fast2),
                ("slow_ma_1".to_string(), slow1),
                ("slow_ma_2".to_string(), slow2),
            ]
            .into_iter()
            .collect(),
            reason: format!(
                "fast MA ({:.5}) crossed {} slow MA ({:.5})",
                fast1, direction, slow1
            ),
        };
        Ok(signal.with_info(info))
    }
}
