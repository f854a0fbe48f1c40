//! Trading-window filter.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tradeloop_core::{EngineResult, HookContext, StrategyError};

use crate::signal::SignalFilter;

/// Passes while the market clock's time of day is within `[start, stop]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDayFilter {
    pub start: NaiveTime,
    pub stop: NaiveTime,
}

impl TimeOfDayFilter {
    pub fn new(start: NaiveTime, stop: NaiveTime) -> Result<Self, StrategyError> {
        if start > stop {
            return Err(StrategyError::InvalidConfig(format!(
                "Trading window start {} is after stop {}",
                start, stop
            )));
        }
        Ok(Self { start, stop })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.stop
    }
}

impl SignalFilter for TimeOfDayFilter {
    fn name(&self) -> &str {
        "Time of Day"
    }

    fn filter(&self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<bool> {
        let now = ctx.market.market_time(symbol)?;
        Ok(self.contains(now.time()))
    }
}
