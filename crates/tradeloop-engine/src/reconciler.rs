//! Open-order reconciliation.

use tracing::debug;
use tradeloop_core::{BrokerClient, EngineResult, HookContext, StrategyHooks};

/// Dispatches `manage_open_trade` for every open order owned by the strategy.
///
/// Stateless: the broker's order list is re-read on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderReconciler;

impl OrderReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Scan the broker's open orders for `symbol` and hand each one matching
    /// the strategy's magic number to the hooks.
    ///
    /// Returns the number of orders dispatched.
    pub fn reconcile(
        &self,
        broker: &dyn BrokerClient,
        hooks: &mut dyn StrategyHooks,
        ctx: &mut HookContext<'_>,
        symbol: &str,
    ) -> EngineResult<usize> {
        let magic = hooks.magic_number(symbol);
        let orders = broker.orders_for(symbol, magic)?;

        for order in &orders {
            hooks.manage_open_trade(ctx, symbol, order)?;
        }

        if !orders.is_empty() {
            debug!(symbol, magic, count = orders.len(), "Reconciled open orders");
        }
        Ok(orders.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hour_of, RecordingHooks};
    use rust_decimal_macros::dec;
    use tradeloop_broker::PaperBroker;
    use tradeloop_core::{DedupLog, OrderKind, OrderRequest, Side, Timeframe};
    use tradeloop_data::InMemoryMarketData;

    fn request(symbol: &str, magic: i64) -> OrderRequest {
        OrderRequest::new(
            symbol,
            OrderKind::Market,
            Side::Buy,
            dec!(0.1),
            dec!(1.1),
            dec!(1.0),
            magic,
        )
    }

    #[test]
    fn test_dispatches_only_owned_orders() {
        let market = InMemoryMarketData::new();
        let broker = PaperBroker::new();
        broker.set_time(hour_of(5, 1));
        let mine = broker.submit(&request("EURUSD", 100)).unwrap();
        broker.submit(&request("EURUSD", 200)).unwrap();
        broker.submit(&request("GBPUSD", 100)).unwrap();
        let mine_too = broker.submit(&request("EURUSD", 100)).unwrap();

        let mut hooks = RecordingHooks::default();
        let mut log = DedupLog::new();
        let mut ctx = HookContext {
            market: &market,
            timeframe: Timeframe::H1,
            log: &mut log,
        };

        let count = OrderReconciler::new()
            .reconcile(&broker, &mut hooks, &mut ctx, "EURUSD")
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            hooks.events,
            vec![
                format!("manage EURUSD {}", mine),
                format!("manage EURUSD {}", mine_too)
            ]
        );
    }

    #[test]
    fn test_no_orders_dispatches_nothing() {
        let market = InMemoryMarketData::new();
        let broker = PaperBroker::new();
        let mut hooks = RecordingHooks::default();
        let mut log = DedupLog::new();
        let mut ctx = HookContext {
            market: &market,
            timeframe: Timeframe::H1,
            log: &mut log,
        };

        let count = OrderReconciler::new()
            .reconcile(&broker, &mut hooks, &mut ctx, "EURUSD")
            .unwrap();
        assert_eq!(count, 0);
        assert!(hooks.events.is_empty());
    }
}
