//! Building blocks composed into strategy hooks.

use tradeloop_core::{EngineResult, HookContext, SignalResult};

/// Produces a directional signal for a symbol.
pub trait SignalSource: Send {
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<SignalResult>;
}

/// Decides whether a symbol may be evaluated now.
pub trait SignalFilter: Send {
    fn name(&self) -> &str;

    fn filter(&self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<bool>;
}
