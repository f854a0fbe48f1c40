//! Strategy hook trait definitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::dedup_log::DedupLog;
use crate::error::EngineResult;
use crate::traits::MarketDataProvider;
use crate::types::{BoundaryState, OpenOrder, SignalResult, Timeframe};

/// What a hook may see while it runs.
pub struct HookContext<'a> {
    /// Market data for the running strategy
    pub market: &'a dyn MarketDataProvider,
    /// Timeframe the strategy trades on
    pub timeframe: Timeframe,
    /// The strategy instance's log-once cache
    pub log: &'a mut DedupLog,
}

/// Strategy-specific behaviour injected into the orchestrator.
///
/// The orchestrator owns the sequencing (boundary detection, reconciliation,
/// deduplication); implementations only answer questions about a symbol.
/// Any error returned here ends that symbol's processing for the tick.
pub trait StrategyHooks: Send {
    /// Get the strategy name.
    fn name(&self) -> &str;

    /// Called once before the first tick.
    fn init(&mut self, _ctx: &mut HookContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Called once after the last tick.
    fn destroy(&mut self, _ctx: &mut HookContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Produce a signal for `symbol`, or [`SignalResult::neutral`].
    fn evaluate(&mut self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<SignalResult>;

    /// Whether the strategy is sleeping on `symbol`; a sleeping symbol is
    /// never evaluated.
    fn is_asleep(&mut self, _ctx: &mut HookContext<'_>, _symbol: &str) -> EngineResult<bool> {
        Ok(false)
    }

    /// Whether `symbol` may be evaluated now.
    fn filter(&mut self, _ctx: &mut HookContext<'_>, _symbol: &str) -> EngineResult<bool> {
        Ok(true)
    }

    /// Entry price for the order `signal` asks for.
    fn entry_price(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Decimal>;

    /// Stop-loss price for the order `signal` asks for.
    fn stop_loss(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Decimal>;

    /// Take-profit price, `None` for no target.
    fn take_profit(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Option<Decimal>>;

    /// Expiry for pending orders, `None` for good-till-cancelled.
    fn expiry(
        &self,
        _ctx: &HookContext<'_>,
        _symbol: &str,
        _signal: &SignalResult,
    ) -> EngineResult<Option<DateTime<Utc>>> {
        Ok(None)
    }

    /// Volume in lots given the distance between entry and stop-loss.
    fn lot_size(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        stop_distance: Decimal,
    ) -> EngineResult<Decimal>;

    /// Strategy identity tagged on every order for `symbol`.
    fn magic_number(&self, symbol: &str) -> i64;

    /// Comment attached to orders for `symbol`.
    fn comment(&self, _symbol: &str) -> String {
        self.name().to_string()
    }

    /// Called when the market date changes, before any candle check.
    fn on_new_date(&mut self, _ctx: &mut HookContext<'_>, _symbol: &str) -> EngineResult<()> {
        Ok(())
    }

    /// Called when a new candle opens.
    fn on_new_candle(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _symbol: &str,
        _state: &BoundaryState,
    ) -> EngineResult<()> {
        Ok(())
    }

    /// Called on every tick for each of this strategy's open orders.
    fn manage_open_trade(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _symbol: &str,
        _order: &OpenOrder,
    ) -> EngineResult<()> {
        Ok(())
    }
}
