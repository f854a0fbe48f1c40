//! Core types and traits for the tick orchestrator.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - Signal, order and boundary-state types
//! - The error taxonomy shared by every crate
//! - Collaborator traits for market data, brokers and strategy hooks

pub mod dedup_log;
pub mod error;
pub mod traits;
pub mod types;

pub use dedup_log::DedupLog;
pub use error::{BrokerError, DataError, EngineError, EngineResult, StrategyError};
pub use traits::*;
pub use types::*;
