//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, LoggingConfig, PaperSettings, SettingsError, StrategySettings,
};

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

const ENV_PREFIX: &str = "TRADELOOP";

/// Load configuration from file and environment, then validate it.
///
/// Environment variables override the file, e.g.
/// `TRADELOOP__ENGINE__TIMEFRAME=M15` or
/// `TRADELOOP__ENGINE__SYMBOLS=EURUSD,GBPUSD`.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment())
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Parse and validate configuration from TOML text, without environment
/// overrides.
pub fn parse_config(toml: &str) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("engine.symbols")
        .try_parsing(true)
}
