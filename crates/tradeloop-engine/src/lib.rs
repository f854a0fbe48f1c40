//! Per-tick orchestration core.
//!
//! On every tick, for each configured symbol:
//! 1. [`OrderReconciler`] hands the strategy's open orders to its hooks
//! 2. [`BoundaryClock`] detects new days and candles
//! 3. [`SignalPipeline`] runs sleep check, filter and evaluation
//! 4. [`TradeExecutor`] closes opposing positions and submits deduplicated orders
//!
//! [`TickOrchestrator`] ties these together and isolates failures per symbol.

pub mod boundary;
pub mod config;
pub mod executor;
pub mod orchestrator;
pub mod pipeline;
pub mod reconciler;

#[cfg(test)]
mod testing;

pub use boundary::{distance_to_day_start, BoundaryClock};
pub use config::EngineConfig;
pub use executor::{ExecutionAction, ExecutionOutcome, ExposureSnapshot, TradeExecutor};
pub use orchestrator::{Stage, SymbolOutcome, TickOrchestrator, TickReport};
pub use pipeline::SignalPipeline;
pub use reconciler::OrderReconciler;
pub use tradeloop_core::DedupLog;
