use serde::{Deserialize, Serialize};

/// Lookback parameters for the indicator set computed on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    /// Band width in standard deviations.
    pub bollinger_k: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 14,
            ema_period: 14,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_k: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorConfig {
    /// History length at which the snapshot starts reporting MACD.
    pub fn macd_warm_up(&self) -> usize {
        (self.macd_slow + self.macd_signal).saturating_sub(1)
    }
}
