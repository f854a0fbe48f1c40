//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Broker-assigned order identifier.
pub type Ticket = u64;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Get the sign used by signal codes (+1 for buy, -1 for sell).
    pub fn sign(&self) -> i32 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Executes immediately; an open market order is a live position
    Market,
    /// Pending order that triggers when price moves through the entry
    Stop,
    /// Pending order that triggers when price pulls back to the entry
    Limit,
}

impl OrderKind {
    /// Magnitude of the signal code for this kind.
    pub fn magnitude(&self) -> i32 {
        match self {
            OrderKind::Market => 1,
            OrderKind::Stop => 2,
            OrderKind::Limit => 3,
        }
    }

    /// Check if this is a pending (not yet filled) kind.
    pub fn is_pending(&self) -> bool {
        !matches!(self, OrderKind::Market)
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MARKET"),
            OrderKind::Stop => write!(f, "STOP"),
            OrderKind::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Order request for submitting new orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol to trade
    pub symbol: String,
    /// Type of order
    pub kind: OrderKind,
    /// Buy or sell
    pub side: Side,
    /// Volume in lots
    pub lots: Decimal,
    /// Entry price
    pub price: Decimal,
    /// Maximum tolerated deviation from `price`, in points
    pub slippage: u32,
    /// Stop-loss price
    pub stop_loss: Decimal,
    /// Take-profit price
    pub take_profit: Option<Decimal>,
    /// Free-form order comment
    pub comment: String,
    /// Strategy identity (magic number)
    pub magic: i64,
    /// Expiry for pending orders
    pub expiry: Option<DateTime<Utc>>,
}

impl OrderRequest {
    /// Create an order request with no take-profit, comment or expiry.
    pub fn new(
        symbol: impl Into<String>,
        kind: OrderKind,
        side: Side,
        lots: Decimal,
        price: Decimal,
        stop_loss: Decimal,
        magic: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            side,
            lots,
            price,
            slippage: 0,
            stop_loss,
            take_profit: None,
            comment: String::new(),
            magic,
            expiry: None,
        }
    }

    /// Set the slippage budget.
    pub fn with_slippage(mut self, slippage: u32) -> Self {
        self.slippage = slippage;
        self
    }

    /// Set the take-profit price.
    pub fn with_take_profit(mut self, take_profit: Option<Decimal>) -> Self {
        self.take_profit = take_profit;
        self
    }

    /// Set the order comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the expiry.
    pub fn with_expiry(mut self, expiry: Option<DateTime<Utc>>) -> Self {
        self.expiry = expiry;
        self
    }
}

/// An order currently open at the broker: a live market position or a
/// resting pending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub ticket: Ticket,
    pub kind: OrderKind,
    pub side: Side,
    pub symbol: String,
    /// Strategy identity (magic number)
    pub magic: i64,
    pub open_time: DateTime<Utc>,
    pub lots: Decimal,
    pub open_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Option<Decimal>,
    pub expiry: Option<DateTime<Utc>>,
    pub comment: String,
}

impl OpenOrder {
    /// Open an order from a request.
    pub fn from_request(ticket: Ticket, request: &OrderRequest, open_time: DateTime<Utc>) -> Self {
        Self {
            ticket,
            kind: request.kind,
            side: request.side,
            symbol: request.symbol.clone(),
            magic: request.magic,
            open_time,
            lots: request.lots,
            open_price: request.price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            expiry: request.expiry,
            comment: request.comment.clone(),
        }
    }

    /// Check if this order belongs to `magic` on `symbol`.
    pub fn belongs_to(&self, symbol: &str, magic: i64) -> bool {
        self.magic == magic && self.symbol == symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_builder() {
        let request = OrderRequest::new(
            "EURUSD",
            OrderKind::Stop,
            Side::Sell,
            dec!(0.10),
            dec!(1.0850),
            dec!(1.0900),
            100,
        )
        .with_slippage(5)
        .with_take_profit(Some(dec!(1.0750)))
        .with_comment("ma_cross");

        assert_eq!(request.kind, OrderKind::Stop);
        assert_eq!(request.slippage, 5);
        assert_eq!(request.take_profit, Some(dec!(1.0750)));
        assert_eq!(request.comment, "ma_cross");
        assert!(request.expiry.is_none());
    }

    #[test]
    fn test_open_order_identity() {
        let request = OrderRequest::new(
            "EURUSD",
            OrderKind::Market,
            Side::Buy,
            dec!(1),
            dec!(1.1),
            dec!(1.0),
            100,
        );
        let order = OpenOrder::from_request(7, &request, DateTime::UNIX_EPOCH);

        assert!(order.belongs_to("EURUSD", 100));
        assert!(!order.belongs_to("EURUSD", 101));
        assert!(!order.belongs_to("GBPUSD", 100));
    }

    #[test]
    fn test_side_opposite_and_sign() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
        assert_eq!(Side::Buy.sign() * OrderKind::Limit.magnitude(), 3);
        assert_eq!(Side::Sell.sign() * OrderKind::Market.magnitude(), -1);
    }
}
