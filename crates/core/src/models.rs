use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tickwatch_indicators::IndicatorSnapshot;

// ---------------------------------------------------------------------------
// Instrument
// ---------------------------------------------------------------------------

/// A quoted instrument (e.g. BTC, CAC40, SP500).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Price the simulated feed starts from.
    pub base_price: f64,
}

impl Instrument {
    pub fn new(symbol: &str, name: &str, base_price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            base_price,
        }
    }

    /// The built-in catalogue served when no instruments are configured.
    pub fn default_catalogue() -> Vec<Instrument> {
        vec![
            Instrument::new("BTC", "Bitcoin", 30_000.0),
            Instrument::new("CAC40", "CAC 40", 6_000.0),
            Instrument::new("SP500", "S&P 500", 4_000.0),
        ]
    }
}

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// One observed price sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(symbol: &str, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            timestamp,
        }
    }
}

/// A point of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// A tick together with the indicator snapshot computed after ingesting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTick {
    #[serde(flatten)]
    pub tick: Tick,
    pub indicators: IndicatorSnapshot,
}

/// One row of a chart: a stored price and every overlay aligned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub regression: Option<f64>,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Registry-assigned alert identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the target price fires the alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDirection {
    /// Fires once the price has fallen to or below the target.
    #[default]
    Below,
    /// Fires once the price has risen to or above the target.
    Above,
}

impl AlertDirection {
    pub fn is_triggered(&self, price: f64, target: f64) -> bool {
        match self {
            AlertDirection::Below => price <= target,
            AlertDirection::Above => price >= target,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Below => "below",
            AlertDirection::Above => "above",
        }
    }
}

impl std::str::FromStr for AlertDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "below" => Ok(AlertDirection::Below),
            "above" => Ok(AlertDirection::Above),
            other => Err(format!("unknown alert direction: {other}")),
        }
    }
}

/// A user-registered price threshold. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub symbol: String,
    pub target_price: f64,
    #[serde(default)]
    pub direction: AlertDirection,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_triggered_by(&self, price: f64) -> bool {
        self.direction.is_triggered(price, self.target_price)
    }
}

/// Alerts fired by one tick of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredGroup {
    pub symbol: String,
    /// Display name of the instrument, when the catalogue knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub price: f64,
    pub alerts: Vec<Alert>,
}

/// Outcome of one processing cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub enriched: Vec<EnrichedTick>,
    pub triggered: Vec<TriggeredGroup>,
}

impl CycleReport {
    pub fn triggered_count(&self) -> usize {
        self.triggered.iter().map(|g| g.alerts.len()).sum()
    }
}
