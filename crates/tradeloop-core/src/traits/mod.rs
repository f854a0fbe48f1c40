//! Collaborator traits the orchestrator depends on.

mod broker;
mod hooks;
mod market_data;

pub use broker::BrokerClient;
pub use hooks::{HookContext, StrategyHooks};
pub use market_data::{MarketDataProvider, Quote, SymbolInfo};
