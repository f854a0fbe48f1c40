//! Core data types for the tick orchestrator.

mod boundary;
mod ohlcv;
mod order;
mod signal;
mod timeframe;

pub use boundary::BoundaryState;
pub use ohlcv::{Bar, BarSeries};
pub use order::{OpenOrder, OrderKind, OrderRequest, Side, Ticket};
pub use signal::{SignalInfo, SignalResult};
pub use timeframe::Timeframe;
