use crate::models::*;
use serde::{Deserialize, Serialize};

/// Events pushed to subscribers after each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum EngineEvent {
    /// The enriched tick batch (price + indicator snapshot per symbol).
    Ticks(Vec<EnrichedTick>),
    /// Alerts fired by one tick; sent once per triggered group.
    PriceAlert(TriggeredGroup),
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Ticks(_) => "ticks",
            EngineEvent::PriceAlert(_) => "price_alert",
        }
    }
}
