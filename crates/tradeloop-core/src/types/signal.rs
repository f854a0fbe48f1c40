//! Trading signal types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{OrderKind, Side};
use crate::error::EngineError;

/// Metadata attached to a signal. Never part of signal equality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Name of the strategy that produced the signal
    pub strategy_name: String,
    /// Indicator values at signal time
    pub indicators: BTreeMap<String, f64>,
    /// Human-readable reason
    pub reason: String,
}

/// A directional trade intent.
///
/// The code's sign is the direction (negative sells, positive buys) and its
/// magnitude the order kind (1 market, 2 stop, 3 limit); zero is neutral.
/// Results compare by code only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalResult {
    code: i32,
    info: SignalInfo,
}

impl SignalResult {
    pub const SELL_LIMIT: i32 = -3;
    pub const SELL_STOP: i32 = -2;
    pub const SELL_MARKET: i32 = -1;
    pub const NEUTRAL: i32 = 0;
    pub const BUY_MARKET: i32 = 1;
    pub const BUY_STOP: i32 = 2;
    pub const BUY_LIMIT: i32 = 3;

    /// Create a signal from a raw code and metadata.
    ///
    /// Codes outside `-3..=3` are accepted here and rejected when the signal
    /// is turned into an order (see [`SignalResult::intent`]).
    pub fn new(code: i32, info: SignalInfo) -> Self {
        Self { code, info }
    }

    /// Create a signal from a raw code with empty metadata.
    pub fn from_code(code: i32) -> Self {
        Self::new(code, SignalInfo::default())
    }

    /// Create a signal for `kind` in direction `side`.
    pub fn for_order(kind: OrderKind, side: Side) -> Self {
        Self::from_code(side.sign() * kind.magnitude())
    }

    pub fn neutral() -> Self {
        Self::from_code(Self::NEUTRAL)
    }

    pub fn buy_market() -> Self {
        Self::from_code(Self::BUY_MARKET)
    }

    pub fn buy_stop() -> Self {
        Self::from_code(Self::BUY_STOP)
    }

    pub fn buy_limit() -> Self {
        Self::from_code(Self::BUY_LIMIT)
    }

    pub fn sell_market() -> Self {
        Self::from_code(Self::SELL_MARKET)
    }

    pub fn sell_stop() -> Self {
        Self::from_code(Self::SELL_STOP)
    }

    pub fn sell_limit() -> Self {
        Self::from_code(Self::SELL_LIMIT)
    }

    /// Replace the metadata.
    pub fn with_info(mut self, info: SignalInfo) -> Self {
        self.info = info;
        self
    }

    /// Raw signal code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Attached metadata.
    pub fn info(&self) -> &SignalInfo {
        &self.info
    }

    pub fn is_neutral(&self) -> bool {
        self.code == Self::NEUTRAL
    }

    /// Direction implied by the code's sign, `None` when neutral.
    pub fn side(&self) -> Option<Side> {
        match self.code.signum() {
            1 => Some(Side::Buy),
            -1 => Some(Side::Sell),
            _ => None,
        }
    }

    /// Map the code to the order it asks for.
    ///
    /// Fails with [`EngineError::InvalidSignal`] for neutral and for any code
    /// outside the defined set.
    pub fn intent(&self) -> Result<(OrderKind, Side), EngineError> {
        let kind = match self.code.unsigned_abs() {
            1 => OrderKind::Market,
            2 => OrderKind::Stop,
            3 => OrderKind::Limit,
            _ => return Err(EngineError::InvalidSignal { code: self.code }),
        };
        let side = self
            .side()
            .ok_or(EngineError::InvalidSignal { code: self.code })?;
        Ok((kind, side))
    }
}

impl PartialEq for SignalResult {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for SignalResult {}

impl fmt::Display for SignalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.code {
            Self::SELL_LIMIT => "SELLLIMIT",
            Self::SELL_STOP => "SELLSTOP",
            Self::SELL_MARKET => "SELLMARKET",
            Self::NEUTRAL => "NEUTRAL",
            Self::BUY_MARKET => "BUYMARKET",
            Self::BUY_STOP => "BUYSTOP",
            Self::BUY_LIMIT => "BUYLIMIT",
            _ => return write!(f, "INVALID({})", self.code),
        };
        if self.info.reason.is_empty() {
            write!(f, "{}", name)
        } else {
            write!(f, "{} ({})", name, self.info.reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_table() {
        let table = [
            (SignalResult::sell_limit(), OrderKind::Limit, Side::Sell),
            (SignalResult::sell_stop(), OrderKind::Stop, Side::Sell),
            (SignalResult::sell_market(), OrderKind::Market, Side::Sell),
            (SignalResult::buy_market(), OrderKind::Market, Side::Buy),
            (SignalResult::buy_stop(), OrderKind::Stop, Side::Buy),
            (SignalResult::buy_limit(), OrderKind::Limit, Side::Buy),
        ];
        for (signal, kind, side) in table {
            assert_eq!(signal.intent().unwrap(), (kind, side), "{}", signal);
            assert_eq!(SignalResult::for_order(kind, side), signal);
        }
    }

    #[test]
    fn test_invalid_codes_are_rejected() {
        for code in [0, 4, -4, 99, i32::MIN, i32::MAX] {
            let err = SignalResult::from_code(code).intent().unwrap_err();
            assert!(matches!(err, EngineError::InvalidSignal { code: c } if c == code));
        }
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let info = SignalInfo {
            strategy_name: "MA Cross".to_string(),
            reason: "fast crossed above slow".to_string(),
            ..Default::default()
        };
        let tagged = SignalResult::buy_market().with_info(info);

        assert_eq!(tagged, SignalResult::buy_market());
        assert_ne!(tagged, SignalResult::buy_stop());
        assert_eq!(tagged.to_string(), "BUYMARKET (fast crossed above slow)");
    }

    #[test]
    fn test_default_is_neutral() {
        let signal = SignalResult::default();
        assert!(signal.is_neutral());
        assert_eq!(signal.side(), None);
    }
}
