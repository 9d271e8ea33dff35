use std::collections::HashMap;
use tickwatch_indicators::{IndicatorConfig, IndicatorSnapshot, IndicatorState};

#[derive(Debug)]
struct CacheEntry {
    state: IndicatorState,
    snapshot: IndicatorSnapshot,
}

/// Running indicator state and most recent snapshot per symbol.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    config: IndicatorConfig,
    entries: HashMap<String, CacheEntry>,
}

impl IndicatorCache {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Bring the snapshot for `symbol` up to date with its history.
    ///
    /// Only the prices appended since the previous refresh are fed to the
    /// running calculators. A history shorter than what was already fed
    /// restarts the state from scratch.
    pub fn refresh(&mut self, symbol: &str, prices: &[f64]) -> &IndicatorSnapshot {
        let Self { config, entries } = self;
        let entry = entries
            .entry(symbol.to_string())
            .or_insert_with(|| CacheEntry {
                state: IndicatorState::new(config),
                snapshot: IndicatorSnapshot::default(),
            });

        if prices.len() < entry.state.len() {
            entry.state = IndicatorState::new(config);
        }
        for &price in &prices[entry.state.len()..] {
            entry.state.push(price);
        }
        entry.snapshot = entry.state.snapshot(prices);
        &entry.snapshot
    }

    /// A copy of the latest snapshot; the empty snapshot for unknown symbols.
    pub fn snapshot(&self, symbol: &str) -> IndicatorSnapshot {
        self.entries
            .get(symbol)
            .map(|e| e.snapshot.clone())
            .unwrap_or_default()
    }
}
