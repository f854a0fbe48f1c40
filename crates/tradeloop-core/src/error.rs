//! Error types for the tick orchestrator.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Ticket, Timeframe};

/// Top-level error raised inside a symbol's processing chain.
///
/// Every variant is recoverable at the per-symbol boundary of the
/// orchestrator: it is logged there and the next symbol proceeds.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Invalid signal code: {code}")]
    InvalidSignal { code: i32 },

    #[error(
        "Invalid risk parameters for {symbol}: stop distance {stop_distance} \
         (entry {entry_price}, stop loss {stop_loss})"
    )]
    InvalidRiskParameters {
        symbol: String,
        entry_price: Decimal,
        stop_loss: Decimal,
        stop_distance: Decimal,
    },
}

/// Market data errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No {timeframe} bar for {symbol} at shift {shift}")]
    DataUnavailable {
        symbol: String,
        timeframe: Timeframe,
        shift: usize,
    },

    #[error("History exhausted for {symbol} {timeframe} after scanning {scanned} bars")]
    HistoryExhausted {
        symbol: String,
        timeframe: Timeframe,
        scanned: usize,
    },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No quote available for {0}")]
    NoQuote(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Broker errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Close of ticket {ticket} rejected: {reason}")]
    CloseRejected { ticket: Ticket, reason: String },
}

/// Errors raised by strategy hooks and their configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),

    #[error("Strategy error: {0}")]
    Internal(String),
}

/// Result type alias for orchestrator operations.
pub type EngineResult<T> = Result<T, EngineError>;
