use crate::models::Instrument;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tickwatch_indicators::IndicatorConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Application configuration, usually loaded from a TOML file.
/// Every field has a default so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the API server binds to.
    pub bind: String,
    /// SQLite URL for the alert store; in-memory store when absent.
    pub database_url: Option<String>,
    /// Cadence of the tick loop.
    pub tick_interval_ms: u64,
    /// Maximum relative price move per simulated tick (0.02 = ±2%).
    pub volatility: f64,
    /// Buffered events per subscriber before slow ones start lagging.
    pub event_capacity: usize,
    pub instruments: Vec<Instrument>,
    pub indicators: IndicatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5001".to_string(),
            database_url: None,
            tick_interval_ms: 2000,
            volatility: 0.02,
            event_capacity: 256,
            instruments: Instrument::default_catalogue(),
            indicators: IndicatorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0".into()));
        }
        if !self.volatility.is_finite() || !(0.0..1.0).contains(&self.volatility) {
            return Err(ConfigError::Invalid(format!(
                "volatility must be in [0, 1), got {}",
                self.volatility
            )));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be > 0".into()));
        }
        let ind = &self.indicators;
        for (name, period) in [
            ("sma_period", ind.sma_period),
            ("ema_period", ind.ema_period),
            ("rsi_period", ind.rsi_period),
            ("bollinger_period", ind.bollinger_period),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
        ] {
            if period == 0 {
                return Err(ConfigError::Invalid(format!("indicators.{name} must be > 0")));
            }
        }
        if !ind.bollinger_k.is_finite() || ind.bollinger_k < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "indicators.bollinger_k must be a finite non-negative number, got {}",
                ind.bollinger_k
            )));
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::Invalid(
                "indicators.macd_fast must be less than indicators.macd_slow".into(),
            ));
        }
        for inst in &self.instruments {
            if inst.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("instrument symbol must not be empty".into()));
            }
            if !inst.base_price.is_finite() || inst.base_price <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "instrument {} needs a positive base_price",
                    inst.symbol
                )));
            }
        }
        Ok(())
    }
}
