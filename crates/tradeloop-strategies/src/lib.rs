//! Strategy hooks built from reusable parts.
//!
//! This crate provides:
//! - Moving average indicators
//! - The MA Cross signal source
//! - The time-of-day filter
//! - [`CompositeStrategy`], which turns a signal source, filters and
//!   trade settings into [`tradeloop_core::StrategyHooks`]
//! - A registry for building strategies by key from configuration

mod composite;
mod indicators;
mod ma_cross;
mod registry;
mod signal;
mod time_of_day;

pub use composite::{CompositeStrategy, LotSizing, TradeSettings};
pub use indicators::{Ema, Indicator, MaMethod, Sma};
pub use ma_cross::{MaCross, MaCrossConfig};
pub use registry::{StrategyInfo, StrategyRegistry};
pub use signal::{SignalFilter, SignalSource};
pub use time_of_day::TimeOfDayFilter;
