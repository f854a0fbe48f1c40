//! Day and candle boundary detection.

use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use tracing::{debug, info};
use tradeloop_core::{
    BoundaryState, DataError, EngineResult, HookContext, MarketDataProvider, StrategyHooks,
    Timeframe,
};

/// Tracks the current day and candle per (symbol, timeframe).
#[derive(Debug)]
pub struct BoundaryClock {
    states: HashMap<(String, Timeframe), BoundaryState>,
    eval_once_per_candle: bool,
    max_day_scan_bars: usize,
}

impl BoundaryClock {
    pub fn new(eval_once_per_candle: bool, max_day_scan_bars: usize) -> Self {
        Self {
            states: HashMap::new(),
            eval_once_per_candle,
            max_day_scan_bars,
        }
    }

    /// State for a pair, `None` until its first check.
    pub fn state(&self, symbol: &str, timeframe: Timeframe) -> Option<&BoundaryState> {
        self.states.get(&(symbol.to_string(), timeframe))
    }

    /// Detect day and candle transitions for `symbol` on `ctx.timeframe`.
    ///
    /// Fires `on_new_date` before any candle check, then `on_new_candle` if the
    /// newest bar's open time changed. Returns whether signals may be evaluated
    /// on this tick.
    pub fn check(
        &mut self,
        symbol: &str,
        ctx: &mut HookContext<'_>,
        hooks: &mut dyn StrategyHooks,
    ) -> EngineResult<bool> {
        let timeframe = ctx.timeframe;
        let state = self
            .states
            .entry((symbol.to_string(), timeframe))
            .or_default();

        let local_date = ctx.market.local_date(symbol)?;
        if state.current_local_date != Some(local_date) {
            state.current_local_date = Some(local_date);
            info!(symbol, %timeframe, date = %local_date, "New day detected");
            hooks.on_new_date(ctx, symbol)?;
        }

        let open_time = ctx.market.bar_open_time(symbol, timeframe, 0)?;
        let new_candle = state.current_candle_open_time != Some(open_time);
        if new_candle {
            // Committed only once the scan succeeds, so a failed scan is
            // retried on the next tick.
            let distance = distance_to_day_start(
                ctx.market,
                symbol,
                timeframe,
                local_date,
                self.max_day_scan_bars,
            )?;
            state.current_candle_open_time = Some(open_time);
            state.candle_distance_to_day_start = distance;

            debug!(
                symbol,
                %timeframe,
                open_time = %open_time,
                distance,
                "New candle detected"
            );
            hooks.on_new_candle(ctx, symbol, state)?;
        }

        Ok(new_candle || !self.eval_once_per_candle)
    }
}

/// Count bars, newest first, whose open time is strictly after midnight of
/// `date`.
///
/// Fails with [`DataError::HistoryExhausted`] when history ends, or
/// `max_bars` bars are scanned, before reaching midnight.
pub fn distance_to_day_start(
    market: &dyn MarketDataProvider,
    symbol: &str,
    timeframe: Timeframe,
    date: NaiveDate,
    max_bars: usize,
) -> Result<usize, DataError> {
    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    let exhausted = |scanned| DataError::HistoryExhausted {
        symbol: symbol.to_string(),
        timeframe,
        scanned,
    };

    for shift in 0..max_bars {
        match market.bar_open_time(symbol, timeframe, shift) {
            Ok(open_time) if open_time <= midnight => return Ok(shift),
            Ok(_) => {}
            Err(DataError::DataUnavailable { .. }) => return Err(exhausted(shift)),
            Err(e) => return Err(e),
        }
    }

    Err(exhausted(max_bars))
}
