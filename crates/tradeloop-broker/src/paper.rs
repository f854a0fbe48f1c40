//! Paper broker for simulation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};
use tradeloop_core::{BrokerClient, BrokerError, OpenOrder, OrderKind, OrderRequest, Quote, Side, Ticket};

/// Why an order left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseReason {
    /// Closed by a `close` call
    Closed,
    /// Pending order passed its expiry
    Expired,
}

/// A (possibly partial) close recorded in the broker's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedOrder {
    pub ticket: Ticket,
    pub symbol: String,
    pub kind: OrderKind,
    pub side: Side,
    pub magic: i64,
    pub lots: Decimal,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub close_time: DateTime<Utc>,
    pub reason: CloseReason,
}

impl ClosedOrder {
    fn from_open(order: &OpenOrder, lots: Decimal, price: Decimal, time: DateTime<Utc>, reason: CloseReason) -> Self {
        Self {
            ticket: order.ticket,
            symbol: order.symbol.clone(),
            kind: order.kind,
            side: order.side,
            magic: order.magic,
            lots,
            open_price: order.open_price,
            close_price: price,
            close_time: time,
            reason,
        }
    }
}

#[derive(Debug)]
struct Book {
    next_ticket: Ticket,
    open: BTreeMap<Ticket, OpenOrder>,
    history: Vec<ClosedOrder>,
    time: DateTime<Utc>,
}

/// In-memory order book.
///
/// Market orders fill immediately at the requested price. Pending orders
/// rest until [`PaperBroker::trigger_pending`] sees the market cross their
/// price or [`PaperBroker::expire_pending`] passes their expiry.
#[derive(Debug)]
pub struct PaperBroker {
    book: Mutex<Book>,
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperBroker {
    pub fn new() -> Self {
        Self {
            book: Mutex::new(Book {
                next_ticket: 1,
                open: BTreeMap::new(),
                history: Vec::new(),
                time: DateTime::UNIX_EPOCH,
            }),
        }
    }

    /// Set the broker clock used to stamp new orders and closes.
    pub fn set_time(&self, time: DateTime<Utc>) {
        self.book.lock().unwrap().time = time;
    }

    /// Fill pending orders on `symbol` whose price the quote has reached.
    ///
    /// Buy stops fill when the ask rises to their price, buy limits when it
    /// falls to it; sell orders mirror this on the bid.
    pub fn trigger_pending(&self, symbol: &str, quote: &Quote) -> Vec<Ticket> {
        let mut book = self.book.lock().unwrap();
        let mut filled = Vec::new();

        for order in book.open.values_mut() {
            if order.symbol != symbol || !order.kind.is_pending() {
                continue;
            }
            let reached = match (order.kind, order.side) {
                (OrderKind::Stop, Side::Buy) => quote.ask >= order.open_price,
                (OrderKind::Limit, Side::Buy) => quote.ask <= order.open_price,
                (OrderKind::Stop, Side::Sell) => quote.bid <= order.open_price,
                (OrderKind::Limit, Side::Sell) => quote.bid >= order.open_price,
                (OrderKind::Market, _) => false,
            };
            if reached {
                info!(
                    ticket = order.ticket,
                    symbol,
                    kind = %order.kind,
                    side = %order.side,
                    price = %order.open_price,
                    "Pending order filled"
                );
                order.kind = OrderKind::Market;
                order.open_time = quote.time;
                order.expiry = None;
                filled.push(order.ticket);
            }
        }

        filled
    }

    /// Remove pending orders whose expiry is at or before `now`.
    pub fn expire_pending(&self, now: DateTime<Utc>) -> Vec<Ticket> {
        let mut book = self.book.lock().unwrap();
        let expired: Vec<Ticket> = book
            .open
            .values()
            .filter(|o| o.kind.is_pending() && o.expiry.is_some_and(|e| e <= now))
            .map(|o| o.ticket)
            .collect();

        for ticket in &expired {
            if let Some(order) = book.open.remove(ticket) {
                debug!(ticket, symbol = %order.symbol, "Pending order expired");
                let record =
                    ClosedOrder::from_open(&order, order.lots, order.open_price, now, CloseReason::Expired);
                book.history.push(record);
            }
        }

        expired
    }

    /// Every close recorded so far, oldest first.
    pub fn closed_orders(&self) -> Vec<ClosedOrder> {
        self.book.lock().unwrap().history.clone()
    }

    pub fn open_count(&self) -> usize {
        self.book.lock().unwrap().open.len()
    }
}

impl BrokerClient for PaperBroker {
    fn list_open_orders(&self) -> Result<Vec<OpenOrder>, BrokerError> {
        Ok(self.book.lock().unwrap().open.values().cloned().collect())
    }

    fn submit(&self, request: &OrderRequest) -> Result<Ticket, BrokerError> {
        if request.symbol.is_empty() {
            return Err(BrokerError::OrderRejected("Symbol is required".to_string()));
        }
        if request.lots <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "Lots must be positive, got {}",
                request.lots
            )));
        }

        let mut book = self.book.lock().unwrap();
        if let Some(expiry) = request.expiry {
            if request.kind.is_pending() && expiry <= book.time {
                return Err(BrokerError::OrderRejected(format!(
                    "Expiry {} is not after {}",
                    expiry, book.time
                )));
            }
        }

        let ticket = book.next_ticket;
        book.next_ticket += 1;
        let order = OpenOrder::from_request(ticket, request, book.time);
        debug!(
            ticket,
            symbol = %order.symbol,
            kind = %order.kind,
            side = %order.side,
            lots = %order.lots,
            "Paper order opened"
        );
        book.open.insert(ticket, order);

        Ok(ticket)
    }

    fn close(
        &self,
        ticket: Ticket,
        lots: Decimal,
        price: Decimal,
        slippage: u32,
    ) -> Result<bool, BrokerError> {
        let rejected = |reason: &str| BrokerError::CloseRejected {
            ticket,
            reason: reason.to_string(),
        };

        let mut book = self.book.lock().unwrap();
        let time = book.time;
        let order = book
            .open
            .get_mut(&ticket)
            .ok_or_else(|| rejected("unknown ticket"))?;

        if order.kind.is_pending() {
            return Err(rejected("pending orders cannot be closed"));
        }
        if lots <= Decimal::ZERO || lots > order.lots {
            return Err(rejected("invalid lots"));
        }

        let record = ClosedOrder::from_open(order, lots, price, time, CloseReason::Closed);
        order.lots -= lots;
        let fully_closed = order.lots.is_zero();
        debug!(ticket, %lots, %price, slippage, fully_closed, "Paper order closed");

        if fully_closed {
            book.open.remove(&ticket);
        }
        book.history.push(record);

        Ok(true)
    }

    fn name(&self) -> &str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap()
    }

    fn request(kind: OrderKind, side: Side, price: Decimal) -> OrderRequest {
        OrderRequest::new("EURUSD", kind, side, dec!(1.0), price, dec!(1.0), 100)
    }

    fn quote(bid: Decimal, ask: Decimal) -> Quote {
        Quote { bid, ask, time: at(2) }
    }

    #[test]
    fn test_market_order_opens_immediately() {
        let broker = PaperBroker::new();
        broker.set_time(at(1));

        let ticket = broker
            .submit(&request(OrderKind::Market, Side::Buy, dec!(1.1)))
            .unwrap();
        let orders = broker.list_open_orders().unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].ticket, ticket);
        assert_eq!(orders[0].open_time, at(1));
        assert_eq!(broker.orders_for("EURUSD", 100).unwrap().len(), 1);
        assert!(broker.orders_for("EURUSD", 101).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_positive_lots() {
        let broker = PaperBroker::new();
        let mut req = request(OrderKind::Market, Side::Buy, dec!(1.1));
        req.lots = Decimal::ZERO;

        assert!(matches!(
            broker.submit(&req),
            Err(BrokerError::OrderRejected(_))
        ));
        assert_eq!(broker.open_count(), 0);
    }

    #[test]
    fn test_partial_and_full_close() {
        let broker = PaperBroker::new();
        let ticket = broker
            .submit(&request(OrderKind::Market, Side::Sell, dec!(1.1)))
            .unwrap();

        assert!(broker.close(ticket, dec!(0.4), dec!(1.09), 5).unwrap());
        assert_eq!(broker.list_open_orders().unwrap()[0].lots, dec!(0.6));

        assert!(broker.close(ticket, dec!(0.6), dec!(1.08), 5).unwrap());
        assert_eq!(broker.open_count(), 0);

        let history = broker.closed_orders();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].close_price, dec!(1.08));
        assert_eq!(history[1].reason, CloseReason::Closed);
    }

    #[test]
    fn test_close_rejections() {
        let broker = PaperBroker::new();
        assert!(matches!(
            broker.close(42, dec!(1), dec!(1.1), 5),
            Err(BrokerError::CloseRejected { ticket: 42, .. })
        ));

        let pending = broker
            .submit(&request(OrderKind::Limit, Side::Buy, dec!(1.05)))
            .unwrap();
        assert!(broker.close(pending, dec!(1), dec!(1.1), 5).is_err());

        let market = broker
            .submit(&request(OrderKind::Market, Side::Buy, dec!(1.1)))
            .unwrap();
        assert!(broker.close(market, dec!(2), dec!(1.1), 5).is_err());
    }

    #[test]
    fn test_trigger_pending() {
        let broker = PaperBroker::new();
        let buy_stop = broker
            .submit(&request(OrderKind::Stop, Side::Buy, dec!(1.1010)))
            .unwrap();
        let buy_limit = broker
            .submit(&request(OrderKind::Limit, Side::Buy, dec!(1.0990)))
            .unwrap();
        let sell_stop = broker
            .submit(&request(OrderKind::Stop, Side::Sell, dec!(1.0980)))
            .unwrap();

        assert!(broker
            .trigger_pending("EURUSD", &quote(dec!(1.1000), dec!(1.1002)))
            .is_empty());

        let filled = broker.trigger_pending("EURUSD", &quote(dec!(1.1010), dec!(1.1012)));
        assert_eq!(filled, vec![buy_stop]);

        let filled = broker.trigger_pending("EURUSD", &quote(dec!(1.0970), dec!(1.0972)));
        assert_eq!(filled, vec![buy_limit, sell_stop]);

        let orders = broker.list_open_orders().unwrap();
        assert!(orders.iter().all(|o| o.kind == OrderKind::Market));
        assert!(orders.iter().all(|o| o.open_time == at(2)));
    }

    #[test]
    fn test_expire_pending() {
        let broker = PaperBroker::new();
        broker.set_time(at(1));
        let pending = broker
            .submit(&request(OrderKind::Stop, Side::Buy, dec!(1.2)).with_expiry(Some(at(3))))
            .unwrap();
        broker
            .submit(&request(OrderKind::Market, Side::Buy, dec!(1.1)).with_expiry(Some(at(3))))
            .unwrap();

        assert!(broker.expire_pending(at(2)).is_empty());
        assert_eq!(broker.expire_pending(at(3)), vec![pending]);
        assert_eq!(broker.open_count(), 1);
        assert_eq!(broker.closed_orders()[0].reason, CloseReason::Expired);

        let stale = request(OrderKind::Limit, Side::Buy, dec!(1.0)).with_expiry(Some(at(0)));
        assert!(broker.submit(&stale).is_err());
    }
}
