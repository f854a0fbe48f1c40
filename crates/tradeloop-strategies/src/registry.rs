//! Strategy registry for building hooks from configuration.

use crate::{CompositeStrategy, MaCross, MaCrossConfig, SignalFilter, SignalSource, TradeSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tradeloop_core::{StrategyError, StrategyHooks};

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Strategy name
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default signal parameters as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available signal strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut strategies = BTreeMap::new();

        strategies.insert(
            "ma_cross".to_string(),
            StrategyInfo {
                name: "MA Cross".to_string(),
                description: "Market orders on fast/slow moving average crossovers of closed bars"
                    .to_string(),
                default_config: serde_json::to_value(MaCrossConfig::default()).unwrap_or_default(),
            },
        );

        Self { strategies }
    }

    /// List all available strategies, ordered by key.
    pub fn list(&self) -> Vec<(&str, &StrategyInfo)> {
        self.strategies
            .iter()
            .map(|(key, info)| (key.as_str(), info))
            .collect()
    }

    /// Get strategy info by key.
    pub fn get(&self, key: &str) -> Option<&StrategyInfo> {
        self.strategies.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    /// Build strategy hooks from signal parameters, trade settings and
    /// filters.
    pub fn create(
        &self,
        key: &str,
        params: serde_json::Value,
        settings: TradeSettings,
        filters: Vec<Box<dyn SignalFilter>>,
    ) -> Result<Box<dyn StrategyHooks>, StrategyError> {
        let info = self
            .get(key)
            .ok_or_else(|| StrategyError::NotFound(key.to_string()))?;

        let signal: Box<dyn SignalSource> = match key {
            "ma_cross" => {
                let config: MaCrossConfig = serde_json::from_value(params)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
                Box::new(MaCross::new(config)?)
            }
            _ => return Err(StrategyError::NotFound(key.to_string())),
        };

        let strategy = filters.into_iter().fold(
            CompositeStrategy::new(info.name.clone(), signal, settings)?,
            CompositeStrategy::with_filter,
        );
        Ok(Box::new(strategy))
    }

    /// Create a strategy with default signal parameters.
    pub fn create_default(
        &self,
        key: &str,
        settings: TradeSettings,
    ) -> Result<Box<dyn StrategyHooks>, StrategyError> {
        let info = self
            .get(key)
            .ok_or_else(|| StrategyError::NotFound(key.to_string()))?;
        self.create(key, info.default_config.clone(), settings, Vec::new())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
