//! Configuration structures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradeloop_core::Timeframe;
use tradeloop_engine::EngineConfig;
use tradeloop_strategies::{MaCrossConfig, TimeOfDayFilter, TradeSettings};

/// Errors raised while loading or checking configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid [{section}] settings: {message}")]
    Invalid { section: &'static str, message: String },
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_engine")]
    pub engine: EngineConfig,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub ma_cross: MaCrossConfig,
    #[serde(default)]
    pub time_filter: Option<TimeOfDayFilter>,
    #[serde(default)]
    pub trade: TradeSettings,
    #[serde(default)]
    pub paper: PaperSettings,
}

fn default_engine() -> EngineConfig {
    EngineConfig::new(Timeframe::H1, ["EURUSD"])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            logging: LoggingConfig::default(),
            engine: default_engine(),
            strategy: StrategySettings::default(),
            ma_cross: MaCrossConfig::default(),
            time_filter: None,
            trade: TradeSettings::default(),
            paper: PaperSettings::default(),
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tradeloop".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for daily-rolling log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Which registered strategy drives the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySettings {
    pub name: String,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            name: "ma_cross".to_string(),
        }
    }
}

/// Simulated market used by the replay command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSettings {
    /// Ask minus bid for quotes derived from bar closes
    pub spread: Decimal,
    /// Price digits of replayed symbols
    pub digits: u32,
}

/// Largest price precision the paper market will quote.
pub const MAX_PRICE_DIGITS: u32 = 10;

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            spread: Decimal::new(2, 4),
            digits: 5,
        }
    }
}

impl AppConfig {
    /// Check the semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |section: &'static str, message: String| SettingsError::Invalid {
            section,
            message,
        };

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid(
                "logging",
                format!("unknown format '{}'", self.logging.format),
            ));
        }
        self.engine
            .validate()
            .map_err(|e| invalid("engine", e.to_string()))?;
        self.ma_cross
            .validate()
            .map_err(|e| invalid("ma_cross", e.to_string()))?;
        self.trade
            .validate()
            .map_err(|e| invalid("trade", e.to_string()))?;
        if let Some(window) = &self.time_filter {
            TimeOfDayFilter::new(window.start, window.stop)
                .map_err(|e| invalid("time_filter", e.to_string()))?;
        }
        if self.paper.spread < Decimal::ZERO {
            return Err(invalid("paper", "spread must not be negative".to_string()));
        }
        if self.paper.digits > MAX_PRICE_DIGITS {
            return Err(invalid(
                "paper",
                format!(
                    "digits must be at most {}, got {}",
                    MAX_PRICE_DIGITS, self.paper.digits
                ),
            ));
        }
        Ok(())
    }
}
