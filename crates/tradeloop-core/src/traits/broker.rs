//! Broker trait definition.

use rust_decimal::Decimal;

use crate::error::BrokerError;
use crate::types::{OpenOrder, OrderRequest, Ticket};

/// Trait for broker integrations.
///
/// The broker's open-order list is the authoritative view of exposure: the
/// orchestrator keeps no copy of it between ticks.
pub trait BrokerClient: Send + Sync {
    /// Get every order currently open in the account, from any strategy.
    fn list_open_orders(&self) -> Result<Vec<OpenOrder>, BrokerError>;

    /// Submit a new order.
    ///
    /// # Returns
    /// The ticket assigned by the broker
    fn submit(&self, request: &OrderRequest) -> Result<Ticket, BrokerError>;

    /// Close `lots` of an open order at `price`, tolerating `slippage` points.
    ///
    /// # Returns
    /// Whether the broker accepted the close
    fn close(
        &self,
        ticket: Ticket,
        lots: Decimal,
        price: Decimal,
        slippage: u32,
    ) -> Result<bool, BrokerError>;

    /// Get the broker name.
    fn name(&self) -> &str;

    /// Open orders tagged with `magic` on `symbol`.
    fn orders_for(&self, symbol: &str, magic: i64) -> Result<Vec<OpenOrder>, BrokerError> {
        Ok(self
            .list_open_orders()?
            .into_iter()
            .filter(|o| o.belongs_to(symbol, magic))
            .collect())
    }
}
