//! Shared fixtures for the engine's unit tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tradeloop_core::{
    BoundaryState, EngineError, EngineResult, HookContext, OpenOrder, SignalResult,
    StrategyError,
};

/// `hour:00` UTC on 2024-03-`day`.
pub fn hour_of(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

/// Hooks that record every call and answer from their fields.
#[derive(Debug)]
pub struct RecordingHooks {
    pub events: Vec<String>,
    pub signal: SignalResult,
    pub asleep: bool,
    pub pass_filter: bool,
    pub magic: i64,
    pub entry: Decimal,
    pub stop_distance: Decimal,
    pub take_profit: Option<Decimal>,
    pub lots: Decimal,
    pub failing_symbol: Option<String>,
}

impl Default for RecordingHooks {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            signal: SignalResult::neutral(),
            asleep: false,
            pass_filter: true,
            magic: 100,
            entry: dec!(1.1000),
            stop_distance: dec!(0.0050),
            take_profit: None,
            lots: dec!(0.10),
            failing_symbol: None,
        }
    }
}

impl RecordingHooks {
    pub fn with_signal(signal: SignalResult) -> Self {
        Self {
            signal,
            ..Default::default()
        }
    }

    /// Number of recorded events whose first word is `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.split_whitespace().next() == Some(kind))
            .count()
    }
}

impl tradeloop_core::StrategyHooks for RecordingHooks {
    fn name(&self) -> &str {
        "recording"
    }

    fn init(&mut self, _ctx: &mut HookContext<'_>) -> EngineResult<()> {
        self.events.push("init".to_string());
        Ok(())
    }

    fn destroy(&mut self, _ctx: &mut HookContext<'_>) -> EngineResult<()> {
        self.events.push("destroy".to_string());
        Ok(())
    }

    fn evaluate(&mut self, _ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<SignalResult> {
        self.events.push(format!("evaluate {}", symbol));
        if self.failing_symbol.as_deref() == Some(symbol) {
            return Err(StrategyError::Internal(format!("no signal for {}", symbol)).into());
        }
        Ok(self.signal.clone())
    }

    fn is_asleep(&mut self, _ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<bool> {
        self.events.push(format!("asleep {}", symbol));
        Ok(self.asleep)
    }

    fn filter(&mut self, _ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<bool> {
        self.events.push(format!("filter {}", symbol));
        Ok(self.pass_filter)
    }

    fn entry_price(
        &self,
        _ctx: &HookContext<'_>,
        _symbol: &str,
        _signal: &SignalResult,
    ) -> EngineResult<Decimal> {
        Ok(self.entry)
    }

    fn stop_loss(
        &self,
        _ctx: &HookContext<'_>,
        _symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Decimal> {
        let side = signal
            .side()
            .ok_or(EngineError::InvalidSignal { code: signal.code() })?;
        Ok(self.entry - self.stop_distance * Decimal::from(side.sign()))
    }

    fn take_profit(
        &self,
        _ctx: &HookContext<'_>,
        _symbol: &str,
        _signal: &SignalResult,
    ) -> EngineResult<Option<Decimal>> {
        Ok(self.take_profit)
    }

    fn lot_size(
        &self,
        _ctx: &HookContext<'_>,
        _symbol: &str,
        _stop_distance: Decimal,
    ) -> EngineResult<Decimal> {
        Ok(self.lots)
    }

    fn magic_number(&self, _symbol: &str) -> i64 {
        self.magic
    }

    fn on_new_date(&mut self, _ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<()> {
        self.events.push(format!("date {}", symbol));
        Ok(())
    }

    fn on_new_candle(
        &mut self,
        _ctx: &mut HookContext<'_>,
        symbol: &str,
        state: &BoundaryState,
    ) -> EngineResult<()> {
        self.events
            .push(format!("candle {} {}", symbol, state.candle_distance_to_day_start));
        Ok(())
    }

    fn manage_open_trade(
        &mut self,
        _ctx: &mut HookContext<'_>,
        symbol: &str,
        order: &OpenOrder,
    ) -> EngineResult<()> {
        self.events.push(format!("manage {} {}", symbol, order.ticket));
        Ok(())
    }
}
