//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use tradeloop_config::load_config;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Strategy: {}", config.strategy.name);
            println!("Timeframe: {}", config.engine.timeframe);
            println!("Symbols: {}", config.engine.symbols.join(", "));
            println!("Eval once per candle: {}", config.engine.eval_once_per_candle);
            println!("Close on opposing signal: {}", config.engine.close_on_opposing_signal);
            match &config.time_filter {
                Some(window) => println!("Trading window: {} - {}", window.start, window.stop),
                None => println!("Trading window: none"),
            }
            println!("Magic base: {}", config.trade.magic_base);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
