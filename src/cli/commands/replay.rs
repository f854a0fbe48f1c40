//! Replay command implementation.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tradeloop_broker::PaperBroker;
use tradeloop_config::{load_config, AppConfig};
use tradeloop_core::{Bar, MarketDataProvider, SymbolInfo, Timeframe};
use tradeloop_data::{load_csv, InMemoryMarketData};
use tradeloop_engine::TickOrchestrator;
use tradeloop_monitor::RunStats;
use tradeloop_strategies::{SignalFilter, StrategyRegistry};

use crate::cli::ReplayArgs;

pub async fn run(args: ReplayArgs, config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let symbol = match args.symbol {
        Some(symbol) => symbol,
        None => config
            .engine
            .symbols
            .first()
            .cloned()
            .context("No symbol configured; pass --symbol")?,
    };
    config.engine.symbols = vec![symbol.clone()];

    if !args.data.exists() {
        anyhow::bail!(
            "Data path '{}' does not exist. Provide a CSV file of bars (e.g. --data ./data/eurusd_h1.csv)",
            args.data.display()
        );
    }
    let bars = load_csv(&args.data)
        .with_context(|| format!("Failed to load bars from {}", args.data.display()))?;
    info!(symbol = %symbol, bars = bars.len(), "Loaded replay data");

    let market = Arc::new(market_for(&config));
    let broker = Arc::new(PaperBroker::new());

    let filters: Vec<Box<dyn SignalFilter>> = config
        .time_filter
        .map(|window| Box::new(window) as Box<dyn SignalFilter>)
        .into_iter()
        .collect();
    let params = serde_json::to_value(&config.ma_cross)?;
    let hooks = StrategyRegistry::new()
        .create(&config.strategy.name, params, config.trade.clone(), filters)
        .context("Failed to create strategy")?;

    let timeframe = config.engine.timeframe;
    let mut orchestrator =
        TickOrchestrator::new(config.engine.clone(), market.clone(), broker.clone(), hooks)
            .context("Failed to create strategy instance")?;
    orchestrator.init().context("Strategy init failed")?;

    let mut stats = RunStats::new(orchestrator.strategy_name());
    let mut interval = (args.tick_interval_ms > 0)
        .then(|| tokio::time::interval(Duration::from_millis(args.tick_interval_ms)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    for bar in bars {
        let stop = match interval.as_mut() {
            Some(interval) => tokio::select! {
                _ = &mut shutdown => true,
                _ = interval.tick() => false,
            },
            None => tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = tokio::task::yield_now() => false,
            },
        };
        if stop {
            warn!("Shutdown requested, stopping replay");
            break;
        }

        step(&market, &broker, &symbol, timeframe, bar)?;
        stats.record(&orchestrator.on_tick());
    }

    orchestrator.deinit().context("Strategy deinit failed")?;
    stats.log_summary();

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => {
            println!("{}", stats);
            println!("Open orders: {}", broker.open_count());
            println!("Closed orders: {}", broker.closed_orders().len());
        }
    }

    Ok(())
}

fn market_for(config: &AppConfig) -> InMemoryMarketData {
    let digits = config.paper.digits;
    InMemoryMarketData::new()
        .with_spread(config.paper.spread)
        .with_default_symbol_info(SymbolInfo {
            digits,
            tick_size: Decimal::new(1, digits),
        })
}

/// Advance the simulated market by one bar and let the broker react to it.
fn step(
    market: &InMemoryMarketData,
    broker: &PaperBroker,
    symbol: &str,
    timeframe: Timeframe,
    bar: Bar,
) -> Result<()> {
    let now = bar.open_time();
    market.push_bar(symbol, timeframe, bar);
    broker.set_time(now);

    let quote = market.quote(symbol)?;
    let filled = broker.trigger_pending(symbol, &quote);
    let expired = broker.expire_pending(now);
    if !filled.is_empty() || !expired.is_empty() {
        debug!(symbol, ?filled, ?expired, "Pending orders updated");
    }
    Ok(())
}
