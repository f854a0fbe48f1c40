//! Trade execution with exposure deduplication.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use tradeloop_core::{
    BrokerClient, BrokerError, EngineError, EngineResult, HookContext, OpenOrder, OrderKind,
    OrderRequest, Side, SignalResult, StrategyHooks, Ticket,
};

/// Which (kind, side) combinations are open for one (magic, symbol).
///
/// Rebuilt from the broker on every execution attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExposureSnapshot {
    pub buy_market: bool,
    pub buy_stop: bool,
    pub buy_limit: bool,
    pub sell_market: bool,
    pub sell_stop: bool,
    pub sell_limit: bool,
}

impl ExposureSnapshot {
    /// Build a snapshot from a list of orders already filtered to one
    /// (magic, symbol).
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a OpenOrder>) -> Self {
        let mut snapshot = Self::default();
        for order in orders {
            snapshot.mark(order.kind, order.side);
        }
        snapshot
    }

    fn slot(&mut self, kind: OrderKind, side: Side) -> &mut bool {
        match (kind, side) {
            (OrderKind::Market, Side::Buy) => &mut self.buy_market,
            (OrderKind::Stop, Side::Buy) => &mut self.buy_stop,
            (OrderKind::Limit, Side::Buy) => &mut self.buy_limit,
            (OrderKind::Market, Side::Sell) => &mut self.sell_market,
            (OrderKind::Stop, Side::Sell) => &mut self.sell_stop,
            (OrderKind::Limit, Side::Sell) => &mut self.sell_limit,
        }
    }

    pub fn mark(&mut self, kind: OrderKind, side: Side) {
        *self.slot(kind, side) = true;
    }

    pub fn has(&self, kind: OrderKind, side: Side) -> bool {
        match (kind, side) {
            (OrderKind::Market, Side::Buy) => self.buy_market,
            (OrderKind::Stop, Side::Buy) => self.buy_stop,
            (OrderKind::Limit, Side::Buy) => self.buy_limit,
            (OrderKind::Market, Side::Sell) => self.sell_market,
            (OrderKind::Stop, Side::Sell) => self.sell_stop,
            (OrderKind::Limit, Side::Sell) => self.sell_limit,
        }
    }

    /// A new order is blocked by an open order of the same kind and side, or
    /// by an open market position on the same side.
    pub fn blocks(&self, kind: OrderKind, side: Side) -> bool {
        self.has(kind, side) || self.has(OrderKind::Market, side)
    }
}

/// What the executor did with a signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExecutionAction {
    /// A new order was accepted by the broker
    Submitted { ticket: Ticket, request: OrderRequest },
    /// Existing exposure blocked the order
    Skipped { kind: OrderKind, side: Side },
}

/// Result of [`TradeExecutor::execute`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub action: ExecutionAction,
    /// Opposing market orders closed before the decision
    pub closed: Vec<Ticket>,
    /// Exposure seen when the broker was scanned
    pub exposure: ExposureSnapshot,
}

impl ExecutionOutcome {
    /// Ticket of the submitted order, if any.
    pub fn submitted(&self) -> Option<Ticket> {
        match self.action {
            ExecutionAction::Submitted { ticket, .. } => Some(ticket),
            ExecutionAction::Skipped { .. } => None,
        }
    }
}

/// Turns non-neutral signals into broker orders.
#[derive(Debug, Clone)]
pub struct TradeExecutor {
    close_on_opposing_signal: bool,
    entry_slippage: u32,
    close_slippage: u32,
}

impl TradeExecutor {
    pub fn new(close_on_opposing_signal: bool, entry_slippage: u32, close_slippage: u32) -> Self {
        Self {
            close_on_opposing_signal,
            entry_slippage,
            close_slippage,
        }
    }

    /// Execute `signal` for `symbol`.
    ///
    /// Closes opposing market orders first (when enabled), then submits the
    /// requested order unless the current exposure already covers it.
    pub fn execute(
        &self,
        broker: &dyn BrokerClient,
        hooks: &dyn StrategyHooks,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<ExecutionOutcome> {
        let (kind, side) = signal.intent()?;
        let magic = hooks.magic_number(symbol);

        let orders = broker.orders_for(symbol, magic)?;
        let exposure = ExposureSnapshot::from_orders(&orders);

        let mut closed = Vec::new();
        if self.close_on_opposing_signal {
            for order in orders
                .iter()
                .filter(|o| o.kind == OrderKind::Market && o.side == side.opposite())
            {
                self.close_order(broker, ctx, order)?;
                closed.push(order.ticket);
            }
        }

        let entry_price = hooks.entry_price(ctx, symbol, signal)?;
        let stop_loss = hooks.stop_loss(ctx, symbol, signal)?;
        let take_profit = hooks.take_profit(ctx, symbol, signal)?;
        let expiry = hooks.expiry(ctx, symbol, signal)?;

        let stop_distance = match side {
            Side::Buy => entry_price - stop_loss,
            Side::Sell => stop_loss - entry_price,
        };
        if stop_distance < Decimal::ZERO {
            return Err(EngineError::InvalidRiskParameters {
                symbol: symbol.to_string(),
                entry_price,
                stop_loss,
                stop_distance,
            });
        }
        let lots = hooks.lot_size(ctx, symbol, stop_distance)?;

        if exposure.blocks(kind, side) {
            info!(symbol, magic, %kind, %side, "Existing exposure, order skipped");
            return Ok(ExecutionOutcome {
                action: ExecutionAction::Skipped { kind, side },
                closed,
                exposure,
            });
        }

        let request = OrderRequest::new(symbol, kind, side, lots, entry_price, stop_loss, magic)
            .with_slippage(self.entry_slippage)
            .with_take_profit(take_profit)
            .with_comment(hooks.comment(symbol))
            .with_expiry(expiry);

        info!(
            symbol,
            %kind,
            %side,
            %lots,
            price = %entry_price,
            stop_loss = %stop_loss,
            take_profit = ?take_profit,
            magic,
            expiry = ?expiry,
            slippage = self.entry_slippage,
            "Executing trade"
        );

        let ticket = broker.submit(&request).map_err(|e| {
            warn!(symbol, %kind, %side, error = %e, "Order submission failed");
            e
        })?;

        info!(symbol, ticket, "Order accepted");
        Ok(ExecutionOutcome {
            action: ExecutionAction::Submitted { ticket, request },
            closed,
            exposure,
        })
    }

    /// Close the whole of `order` at the price on the other side of the book.
    fn close_order(
        &self,
        broker: &dyn BrokerClient,
        ctx: &HookContext<'_>,
        order: &OpenOrder,
    ) -> EngineResult<()> {
        let quote = ctx.market.quote(&order.symbol)?;
        let price = match order.side {
            Side::Buy => quote.bid,
            Side::Sell => quote.ask,
        };

        info!(
            symbol = %order.symbol,
            ticket = order.ticket,
            side = %order.side,
            lots = %order.lots,
            %price,
            "Closing opposing order"
        );

        let accepted = broker
            .close(order.ticket, order.lots, price, self.close_slippage)
            .map_err(|e| {
                warn!(ticket = order.ticket, error = %e, "Close failed");
                e
            })?;
        if !accepted {
            warn!(ticket = order.ticket, "Broker declined close");
            return Err(BrokerError::CloseRejected {
                ticket: order.ticket,
                reason: "broker declined close".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
