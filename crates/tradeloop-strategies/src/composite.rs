//! Strategy hooks assembled from a signal source, filters and trade settings.

use chrono::{Datelike, Duration, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use tradeloop_core::{
    BoundaryState, EngineResult, HookContext, OpenOrder, OrderKind, Side, SignalResult,
    StrategyError, StrategyHooks,
};

use crate::signal::{SignalFilter, SignalSource};

/// How order volume is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LotSizing {
    /// Same volume for every order
    Fixed { lots: Decimal },
    /// Volume that loses `risk_amount` if the stop is hit
    RiskBased {
        risk_amount: Decimal,
        /// Account value of a one-point move per lot
        value_per_point: Decimal,
    },
}

/// Pricing, sizing and identity of the orders a strategy sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeSettings {
    /// Magic number shared by all symbols
    pub magic_base: i64,
    /// Per-symbol additions to `magic_base`, keyed case-insensitively
    pub magic_offsets: BTreeMap<String, i64>,
    /// Order comment; the strategy name when empty
    pub comment: String,
    /// Stop-loss distance from entry, in pips
    pub stop_pips: Decimal,
    /// Take-profit distance as a multiple of the stop distance; zero for none
    pub reward_ratio: Decimal,
    /// Distance of pending entries from the market, in pips
    pub pending_offset_pips: Decimal,
    /// Lifetime of pending orders in bars; zero for good-till-cancelled
    pub expiry_bars: u32,
    pub lot_sizing: LotSizing,
    pub min_lots: Decimal,
    pub max_lots: Decimal,
    pub lot_step: Decimal,
    /// Sleep on Saturday and Sunday market dates
    pub sleep_on_weekends: bool,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            magic_base: 100,
            magic_offsets: BTreeMap::new(),
            comment: String::new(),
            stop_pips: Decimal::from(20),
            reward_ratio: Decimal::TWO,
            pending_offset_pips: Decimal::from(5),
            expiry_bars: 0,
            lot_sizing: LotSizing::Fixed {
                lots: Decimal::new(10, 2),
            },
            min_lots: Decimal::new(1, 2),
            max_lots: Decimal::from(10),
            lot_step: Decimal::new(1, 2),
            sleep_on_weekends: true,
        }
    }
}

impl TradeSettings {
    pub fn validate(&self) -> Result<(), StrategyError> {
        let invalid = |msg: &str| Err(StrategyError::InvalidConfig(msg.to_string()));

        if self.stop_pips <= Decimal::ZERO {
            return invalid("stop_pips must be positive");
        }
        if self.reward_ratio < Decimal::ZERO {
            return invalid("reward_ratio must not be negative");
        }
        if self.pending_offset_pips < Decimal::ZERO {
            return invalid("pending_offset_pips must not be negative");
        }
        if self.min_lots <= Decimal::ZERO || self.max_lots < self.min_lots {
            return invalid("lot bounds must satisfy 0 < min_lots <= max_lots");
        }
        if self.lot_step <= Decimal::ZERO {
            return invalid("lot_step must be positive");
        }
        match &self.lot_sizing {
            LotSizing::Fixed { lots } if *lots <= Decimal::ZERO => invalid("fixed lots must be positive"),
            LotSizing::RiskBased {
                risk_amount,
                value_per_point,
            } if *risk_amount <= Decimal::ZERO || *value_per_point <= Decimal::ZERO => {
                invalid("risk_amount and value_per_point must be positive")
            }
            _ => Ok(()),
        }
    }

    /// Round `lots` down to the lot step and clamp to the lot bounds.
    pub fn normalize_lots(&self, lots: Decimal) -> Decimal {
        let stepped = (lots / self.lot_step).floor() * self.lot_step;
        stepped.max(self.min_lots).min(self.max_lots)
    }
}

/// [`StrategyHooks`] built from one signal source and a filter chain.
pub struct CompositeStrategy {
    name: String,
    signal: Box<dyn SignalSource>,
    filters: Vec<Box<dyn SignalFilter>>,
    settings: TradeSettings,
}

impl CompositeStrategy {
    pub fn new(
        name: impl Into<String>,
        signal: Box<dyn SignalSource>,
        settings: TradeSettings,
    ) -> Result<Self, StrategyError> {
        settings.validate()?;
        Ok(Self {
            name: name.into(),
            signal,
            filters: Vec::new(),
            settings,
        })
    }

    /// Append a filter; filters run in insertion order.
    pub fn with_filter(mut self, filter: Box<dyn SignalFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn settings(&self) -> &TradeSettings {
        &self.settings
    }

    fn pip_distance(&self, ctx: &HookContext<'_>, symbol: &str, pips: Decimal) -> EngineResult<Decimal> {
        Ok(pips * ctx.market.pip_size(symbol)?)
    }

    fn stop_distance(&self, ctx: &HookContext<'_>, symbol: &str) -> EngineResult<Decimal> {
        self.pip_distance(ctx, symbol, self.settings.stop_pips)
    }
}

impl StrategyHooks for CompositeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _ctx: &mut HookContext<'_>) -> EngineResult<()> {
        debug!(
            strategy = %self.name,
            signal = self.signal.name(),
            filters = self.filters.len(),
            "Strategy initialised"
        );
        Ok(())
    }

    fn evaluate(&mut self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<SignalResult> {
        self.signal.evaluate(ctx, symbol)
    }

    fn is_asleep(&mut self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<bool> {
        if !self.settings.sleep_on_weekends {
            return Ok(false);
        }
        let weekday = ctx.market.local_date(symbol)?.weekday();
        Ok(matches!(weekday, Weekday::Sat | Weekday::Sun))
    }

    fn filter(&mut self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<bool> {
        for filter in &self.filters {
            if !filter.filter(ctx, symbol)? {
                debug!(symbol, filter = filter.name(), "Filter rejected symbol");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn entry_price(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Decimal> {
        let (kind, side) = signal.intent()?;
        let quote = ctx.market.quote(symbol)?;
        let offset = self.pip_distance(ctx, symbol, self.settings.pending_offset_pips)?;

        Ok(match (kind, side) {
            (OrderKind::Market, Side::Buy) => quote.ask,
            (OrderKind::Market, Side::Sell) => quote.bid,
            (OrderKind::Stop, Side::Buy) => quote.ask + offset,
            (OrderKind::Stop, Side::Sell) => quote.bid - offset,
            (OrderKind::Limit, Side::Buy) => quote.ask - offset,
            (OrderKind::Limit, Side::Sell) => quote.bid + offset,
        })
    }

    fn stop_loss(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Decimal> {
        let (_, side) = signal.intent()?;
        let entry = self.entry_price(ctx, symbol, signal)?;
        let distance = self.stop_distance(ctx, symbol)?;
        Ok(entry - distance * Decimal::from(side.sign()))
    }

    fn take_profit(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Option<Decimal>> {
        if self.settings.reward_ratio.is_zero() {
            return Ok(None);
        }
        let (_, side) = signal.intent()?;
        let entry = self.entry_price(ctx, symbol, signal)?;
        let distance = self.stop_distance(ctx, symbol)? * self.settings.reward_ratio;
        Ok(Some(entry + distance * Decimal::from(side.sign())))
    }

    fn expiry(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        signal: &SignalResult,
    ) -> EngineResult<Option<chrono::DateTime<chrono::Utc>>> {
        let (kind, _) = signal.intent()?;
        if !kind.is_pending() || self.settings.expiry_bars == 0 {
            return Ok(None);
        }
        let lifetime = i64::from(ctx.timeframe.minutes()) * i64::from(self.settings.expiry_bars);
        Ok(Some(ctx.market.market_time(symbol)? + Duration::minutes(lifetime)))
    }

    fn lot_size(
        &self,
        ctx: &HookContext<'_>,
        symbol: &str,
        stop_distance: Decimal,
    ) -> EngineResult<Decimal> {
        let lots = match &self.settings.lot_sizing {
            LotSizing::Fixed { lots } => *lots,
            LotSizing::RiskBased {
                risk_amount,
                value_per_point,
            } => {
                let tick = ctx.market.symbol_info(symbol)?.tick_size;
                let points = stop_distance / tick;
                if points <= Decimal::ZERO {
                    return Err(StrategyError::Internal(format!(
                        "Cannot size {} by risk with a zero stop distance",
                        symbol
                    ))
                    .into());
                }
                *risk_amount / (points * *value_per_point)
            }
        };
        Ok(self.settings.normalize_lots(lots))
    }

    fn magic_number(&self, symbol: &str) -> i64 {
        let offset = self
            .settings
            .magic_offsets
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
            .map_or(0, |(_, offset)| *offset);
        self.settings.magic_base + offset
    }

    fn comment(&self, _symbol: &str) -> String {
        if self.settings.comment.is_empty() {
            self.name.clone()
        } else {
            self.settings.comment.clone()
        }
    }

    fn on_new_date(&mut self, ctx: &mut HookContext<'_>, symbol: &str) -> EngineResult<()> {
        debug!(strategy = %self.name, symbol, date = %ctx.market.local_date(symbol)?, "New date");
        Ok(())
    }

    fn on_new_candle(
        &mut self,
        _ctx: &mut HookContext<'_>,
        symbol: &str,
        state: &BoundaryState,
    ) -> EngineResult<()> {
        debug!(
            strategy = %self.name,
            symbol,
            distance_to_day_start = state.candle_distance_to_day_start,
            "New candle"
        );
        Ok(())
    }

    fn manage_open_trade(
        &mut self,
        ctx: &mut HookContext<'_>,
        symbol: &str,
        order: &OpenOrder,
    ) -> EngineResult<()> {
        let day = ctx
            .market
            .local_date(symbol)?
            .and_time(NaiveTime::MIN)
            .and_utc();
        ctx.log.log_once(
            &self.name,
            symbol,
            day,
            order.side,
            &format!("open_trade_{}", order.ticket),
            format_args!(
                "ticket {} {} {} lots open at {}",
                order.ticket, order.kind, order.lots, order.open_price
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tradeloop_core::{DedupLog, OrderRequest, Quote, Timeframe};
    use tradeloop_data::InMemoryMarketData;

    use crate::time_of_day::TimeOfDayFilter;

    struct Fixed(SignalResult);

    impl SignalSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn evaluate(&self, _ctx: &mut HookContext<'_>, _symbol: &str) -> EngineResult<SignalResult> {
            Ok(self.0.clone())
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn market(time: DateTime<Utc>) -> InMemoryMarketData {
        let market = InMemoryMarketData::new();
        market.set_quote(
            "EURUSD",
            Quote {
                bid: dec!(1.1000),
                ask: dec!(1.1002),
                time,
            },
        );
        market
    }

    fn strategy(settings: TradeSettings) -> CompositeStrategy {
        CompositeStrategy::new("test", Box::new(Fixed(SignalResult::buy_market())), settings).unwrap()
    }

    fn with_ctx<T>(market: &InMemoryMarketData, f: impl FnOnce(&mut HookContext<'_>) -> T) -> T {
        let mut log = DedupLog::new();
        let mut ctx = HookContext {
            market,
            timeframe: Timeframe::H1,
            log: &mut log,
        };
        f(&mut ctx)
    }

    #[test]
    fn test_settings_validation() {
        assert!(TradeSettings::default().validate().is_ok());

        let no_stop = TradeSettings {
            stop_pips: Decimal::ZERO,
            ..Default::default()
        };
        assert!(no_stop.validate().is_err());

        let bad_risk = TradeSettings {
            lot_sizing: LotSizing::RiskBased {
                risk_amount: dec!(100),
                value_per_point: Decimal::ZERO,
            },
            ..Default::default()
        };
        assert!(CompositeStrategy::new("x", Box::new(Fixed(SignalResult::neutral())), bad_risk).is_err());
    }

    #[test]
    fn test_prices_per_order_kind() {
        let market = market(at(5, 10));
        let strategy = strategy(TradeSettings::default());

        with_ctx(&market, |ctx| {
            let price = |signal: SignalResult| {
                (
                    strategy.entry_price(ctx, "EURUSD", &signal).unwrap(),
                    strategy.stop_loss(ctx, "EURUSD", &signal).unwrap(),
                    strategy.take_profit(ctx, "EURUSD", &signal).unwrap(),
                )
            };

            assert_eq!(
                price(SignalResult::buy_market()),
                (dec!(1.1002), dec!(1.0982), Some(dec!(1.1042)))
            );
            assert_eq!(
                price(SignalResult::sell_stop()),
                (dec!(1.0995), dec!(1.1015), Some(dec!(1.0955)))
            );
            assert_eq!(price(SignalResult::buy_limit()).0, dec!(1.0997));
            assert_eq!(price(SignalResult::sell_limit()).0, dec!(1.1005));
            assert_eq!(price(SignalResult::sell_market()).0, dec!(1.1000));
        });
    }

    #[test]
    fn test_no_take_profit_without_ratio() {
        let market = market(at(5, 10));
        let strategy = strategy(TradeSettings {
            reward_ratio: Decimal::ZERO,
            ..Default::default()
        });

        let tp = with_ctx(&market, |ctx| {
            strategy.take_profit(ctx, "EURUSD", &SignalResult::buy_market())
        });
        assert_eq!(tp.unwrap(), None);
    }

    #[test]
    fn test_pending_expiry() {
        let market = market(at(5, 10));
        let strategy = strategy(TradeSettings {
            expiry_bars: 3,
            ..Default::default()
        });

        with_ctx(&market, |ctx| {
            assert_eq!(
                strategy.expiry(ctx, "EURUSD", &SignalResult::buy_stop()).unwrap(),
                Some(at(5, 13))
            );
            assert_eq!(
                strategy.expiry(ctx, "EURUSD", &SignalResult::buy_market()).unwrap(),
                None
            );
        });
    }

    #[test]
    fn test_lot_sizing() {
        let market = market(at(5, 10));
        let fixed = strategy(TradeSettings::default());
        let risk = strategy(TradeSettings {
            lot_sizing: LotSizing::RiskBased {
                risk_amount: dec!(100),
                value_per_point: dec!(1),
            },
            ..Default::default()
        });
        let huge_risk = strategy(TradeSettings {
            lot_sizing: LotSizing::RiskBased {
                risk_amount: dec!(100000),
                value_per_point: dec!(1),
            },
            ..Default::default()
        });

        with_ctx(&market, |ctx| {
            assert_eq!(fixed.lot_size(ctx, "EURUSD", dec!(0.0020)).unwrap(), dec!(0.10));
            // 200 points at 1 per point
            assert_eq!(risk.lot_size(ctx, "EURUSD", dec!(0.0020)).unwrap(), dec!(0.50));
            assert_eq!(huge_risk.lot_size(ctx, "EURUSD", dec!(0.0020)).unwrap(), dec!(10));
            assert!(risk.lot_size(ctx, "EURUSD", Decimal::ZERO).is_err());
        });
    }

    #[test]
    fn test_normalize_lots() {
        let settings = TradeSettings::default();
        assert_eq!(settings.normalize_lots(dec!(0.237)), dec!(0.23));
        assert_eq!(settings.normalize_lots(dec!(0.001)), dec!(0.01));
        assert_eq!(settings.normalize_lots(dec!(55)), dec!(10));
    }

    #[test]
    fn test_magic_and_comment() {
        let mut settings = TradeSettings::default();
        settings.magic_offsets.insert("GBPUSD".to_string(), 1);
        let named = strategy(settings.clone());
        assert_eq!(named.magic_number("EURUSD"), 100);
        assert_eq!(named.magic_number("GBPUSD"), 101);
        assert_eq!(named.comment("EURUSD"), "test");

        settings.comment = "ma cross v1".to_string();
        assert_eq!(strategy(settings).comment("EURUSD"), "ma cross v1");
    }

    #[test]
    fn test_weekend_sleep() {
        let mut strategy = strategy(TradeSettings::default());

        // 2024-03-09 is a Saturday
        let saturday = market(at(9, 10));
        assert!(with_ctx(&saturday, |ctx| strategy.is_asleep(ctx, "EURUSD")).unwrap());

        let tuesday = market(at(5, 10));
        assert!(!with_ctx(&tuesday, |ctx| strategy.is_asleep(ctx, "EURUSD")).unwrap());
    }

    #[test]
    fn test_filters_chain() {
        let window = TimeOfDayFilter::new(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        )
        .unwrap();
        let mut strategy = strategy(TradeSettings::default()).with_filter(Box::new(window));

        let inside = market(at(5, 10));
        assert!(with_ctx(&inside, |ctx| strategy.filter(ctx, "EURUSD")).unwrap());

        let outside = market(at(5, 20));
        assert!(!with_ctx(&outside, |ctx| strategy.filter(ctx, "EURUSD")).unwrap());
    }

    #[test]
    fn test_manage_open_trade_logs_once_per_day() {
        let market = market(at(5, 10));
        let mut strategy = strategy(TradeSettings::default());
        let request = OrderRequest::new(
            "EURUSD",
            OrderKind::Market,
            Side::Buy,
            dec!(0.1),
            dec!(1.1),
            dec!(1.09),
            100,
        );
        let order = OpenOrder::from_request(7, &request, at(5, 9));
        let mut log = DedupLog::new();

        for _ in 0..3 {
            let mut ctx = HookContext {
                market: &market,
                timeframe: Timeframe::H1,
                log: &mut log,
            };
            strategy.manage_open_trade(&mut ctx, "EURUSD", &order).unwrap();
        }
        assert_eq!(log.len(), 1);

        market.set_time("EURUSD", at(6, 1));
        let mut ctx = HookContext {
            market: &market,
            timeframe: Timeframe::H1,
            log: &mut log,
        };
        strategy.manage_open_trade(&mut ctx, "EURUSD", &order).unwrap();
        assert_eq!(log.len(), 2);
    }
}
