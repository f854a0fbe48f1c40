//! List strategies command.

use anyhow::Result;
use tradeloop_strategies::StrategyRegistry;

pub async fn run() -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for (key, info) in registry.list() {
        println!("  {} ({})", info.name, key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!("  Defaults: {}", info.default_config);
        println!();
    }

    println!("Select a strategy with `name` under [strategy] in the config file.");

    Ok(())
}
