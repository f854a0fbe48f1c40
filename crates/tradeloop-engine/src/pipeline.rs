//! Sleep check, filter and evaluation.

use tracing::debug;
use tradeloop_core::{EngineResult, HookContext, SignalResult, StrategyHooks};

/// Short-circuiting chain producing a signal for one symbol.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalPipeline;

impl SignalPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Run `is_asleep`, then `filter`, then `evaluate`.
    ///
    /// A sleeping or filtered-out symbol yields [`SignalResult::neutral`]
    /// without reaching the later stages.
    pub fn run(
        &self,
        hooks: &mut dyn StrategyHooks,
        ctx: &mut HookContext<'_>,
        symbol: &str,
    ) -> EngineResult<SignalResult> {
        if hooks.is_asleep(ctx, symbol)? {
            debug!(symbol, "Strategy asleep");
            return Ok(SignalResult::neutral());
        }

        if !hooks.filter(ctx, symbol)? {
            debug!(symbol, "Filtered out");
            return Ok(SignalResult::neutral());
        }

        let signal = hooks.evaluate(ctx, symbol)?;
        debug!(symbol, %signal, "Evaluated");
        Ok(signal)
    }
}
