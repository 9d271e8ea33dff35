use crate::error::EngineError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tickwatch_core::{Alert, AlertDirection, AlertId, Tick, TriggeredGroup};
use tracing::debug;

/// Active alerts bucketed by symbol.
///
/// Every id lives in at most one bucket and is never handed out twice, so a
/// removed alert can never come back.
#[derive(Debug)]
pub struct AlertRegistry {
    next_id: u64,
    buckets: HashMap<String, Vec<Alert>>,
    /// id → symbol, for removal by id.
    index: HashMap<AlertId, String>,
}

impl Default for AlertRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            buckets: HashMap::new(),
            index: HashMap::new(),
        }
    }

    fn validate(symbol: &str, target_price: f64) -> Result<(), EngineError> {
        if symbol.trim().is_empty() {
            return Err(EngineError::InvalidAlert("symbol must not be empty".into()));
        }
        if !target_price.is_finite() || target_price < 0.0 {
            return Err(EngineError::InvalidAlert(format!(
                "target price must be a finite non-negative number, got {target_price}"
            )));
        }
        Ok(())
    }

    /// Register a new alert under a fresh id. Surrounding whitespace is
    /// stripped from the symbol so it matches ticks for that instrument.
    pub fn create(
        &mut self,
        symbol: &str,
        target_price: f64,
        direction: AlertDirection,
        created_at: DateTime<Utc>,
    ) -> Result<Alert, EngineError> {
        let symbol = symbol.trim();
        Self::validate(symbol, target_price)?;

        let alert = Alert {
            id: AlertId(self.next_id),
            symbol: symbol.to_string(),
            target_price,
            direction,
            created_at,
        };
        self.next_id += 1;
        self.insert(alert.clone());
        Ok(alert)
    }

    /// Re-register a previously persisted alert, keeping its id.
    /// Later `create` calls allocate ids above every restored one, including
    /// ids of alerts rejected here, since those may still occupy storage.
    pub fn restore(&mut self, alert: Alert) -> Result<(), EngineError> {
        self.next_id = self.next_id.max(alert.id.0.saturating_add(1));
        Self::validate(&alert.symbol, alert.target_price)?;
        if self.index.contains_key(&alert.id) {
            return Err(EngineError::InvalidAlert(format!(
                "alert {} is already registered",
                alert.id
            )));
        }
        self.insert(alert);
        Ok(())
    }

    fn insert(&mut self, alert: Alert) {
        self.index.insert(alert.id, alert.symbol.clone());
        self.buckets
            .entry(alert.symbol.clone())
            .or_default()
            .push(alert);
    }

    /// Remove an alert. Absent ids are ignored.
    pub fn remove(&mut self, id: AlertId) -> Option<Alert> {
        let symbol = self.index.remove(&id)?;
        let bucket = self.buckets.get_mut(&symbol)?;
        let pos = bucket.iter().position(|a| a.id == id)?;
        let alert = bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&symbol);
        }
        Some(alert)
    }

    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        let symbol = self.index.get(&id)?;
        self.buckets.get(symbol)?.iter().find(|a| a.id == id)
    }

    /// Active alerts for one symbol, ordered by id.
    pub fn for_symbol(&self, symbol: &str) -> Vec<Alert> {
        let mut alerts = self.buckets.get(symbol).cloned().unwrap_or_default();
        alerts.sort_by_key(|a| a.id);
        alerts
    }

    /// Every active alert, ordered by id.
    pub fn all(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.buckets.values().flatten().cloned().collect();
        alerts.sort_by_key(|a| a.id);
        alerts
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Fire every alert whose condition holds for a tick of the batch.
    ///
    /// Fired alerts are removed before the next tick is looked at, so one
    /// alert fires at most once even if several ticks of the batch match it.
    pub fn match_and_trigger(&mut self, batch: &[Tick]) -> Vec<TriggeredGroup> {
        let mut groups = Vec::new();

        for tick in batch {
            let Some(bucket) = self.buckets.get_mut(&tick.symbol) else {
                continue;
            };
            let (mut fired, kept): (Vec<Alert>, Vec<Alert>) = bucket
                .drain(..)
                .partition(|a| a.is_triggered_by(tick.price));
            *bucket = kept;
            if bucket.is_empty() {
                self.buckets.remove(&tick.symbol);
            }
            if fired.is_empty() {
                continue;
            }

            fired.sort_by_key(|a| a.id);
            for alert in &fired {
                self.index.remove(&alert.id);
            }
            debug!(
                symbol = %tick.symbol,
                price = tick.price,
                fired = fired.len(),
                "Alerts triggered"
            );
            groups.push(TriggeredGroup {
                symbol: tick.symbol.clone(),
                name: None,
                price: tick.price,
                alerts: fired,
            });
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(symbol: &str, price: f64) -> Tick {
        Tick::new(symbol, price, Utc::now())
    }

    fn below(registry: &mut AlertRegistry, symbol: &str, target: f64) -> Alert {
        registry
            .create(symbol, target, AlertDirection::Below, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let mut reg = AlertRegistry::new();
        let a = below(&mut reg, "BTC", 30_000.0);
        let b = below(&mut reg, "BTC", 29_000.0);
        let c = below(&mut reg, "SP500", 4_000.0);
        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.for_symbol("BTC"), vec![a, b]);
    }

    #[test]
    fn test_create_rejects_invalid() {
        let mut reg = AlertRegistry::new();
        let now = Utc::now();
        for (symbol, price) in [("", 1.0), ("  ", 1.0), ("BTC", -1.0), ("BTC", f64::NAN)] {
            let err = reg.create(symbol, price, AlertDirection::Below, now).unwrap_err();
            assert!(matches!(err, EngineError::InvalidAlert(_)));
        }
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reg = AlertRegistry::new();
        let a = below(&mut reg, "BTC", 30_000.0);
        assert_eq!(reg.remove(a.id), Some(a.clone()));
        assert_eq!(reg.remove(a.id), None);
        assert_eq!(reg.remove(AlertId(999)), None);
        assert!(reg.for_symbol("BTC").is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut reg = AlertRegistry::new();
        let a = below(&mut reg, "BTC", 30_000.0);
        reg.remove(a.id);
        let b = below(&mut reg, "BTC", 30_000.0);
        assert!(b.id > a.id);
    }

    #[test]
    fn test_triggers_at_or_below_target() {
        let mut reg = AlertRegistry::new();
        let hit = below(&mut reg, "BTC", 30_000.0);
        let miss = below(&mut reg, "BTC", 20_000.0);

        let groups = reg.match_and_trigger(&[tick("BTC", 29_999.0)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].symbol, "BTC");
        assert_eq!(groups[0].price, 29_999.0);
        assert_eq!(groups[0].alerts, vec![hit.clone()]);
        assert!(reg.get(hit.id).is_none());
        assert!(reg.get(miss.id).is_some());
    }

    #[test]
    fn test_fires_once() {
        let mut reg = AlertRegistry::new();
        below(&mut reg, "BTC", 30_000.0);
        let batch = [tick("BTC", 30_000.0), tick("BTC", 29_000.0)];
        let groups = reg.match_and_trigger(&batch);
        assert_eq!(groups.len(), 1);
        assert!(reg.match_and_trigger(&[tick("BTC", 30_000.0)]).is_empty());
    }

    #[test]
    fn test_above_direction() {
        let mut reg = AlertRegistry::new();
        reg.create("SP500", 4_100.0, AlertDirection::Above, Utc::now())
            .unwrap();
        assert!(reg.match_and_trigger(&[tick("SP500", 4_050.0)]).is_empty());
        assert_eq!(reg.match_and_trigger(&[tick("SP500", 4_100.0)]).len(), 1);
    }

    #[test]
    fn test_no_match_for_other_symbols() {
        let mut reg = AlertRegistry::new();
        below(&mut reg, "BTC", 30_000.0);
        assert!(reg.match_and_trigger(&[tick("CAC40", 1.0)]).is_empty());
        assert!(reg.match_and_trigger(&[]).is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_restore_keeps_ids_and_bumps_counter() {
        let mut reg = AlertRegistry::new();
        let persisted = Alert {
            id: AlertId(41),
            symbol: "BTC".into(),
            target_price: 31_000.0,
            direction: AlertDirection::Below,
            created_at: Utc::now(),
        };
        reg.restore(persisted.clone()).unwrap();
        assert!(reg.restore(persisted).is_err());
        let fresh = below(&mut reg, "BTC", 1.0);
        assert_eq!(fresh.id, AlertId(42));
        assert_eq!(reg.all().len(), 2);
    }

    #[test]
    fn test_rejected_restore_still_reserves_id() {
        let mut reg = AlertRegistry::new();
        let broken = Alert {
            id: AlertId(9),
            symbol: "BTC".into(),
            target_price: f64::NAN,
            direction: AlertDirection::Below,
            created_at: Utc::now(),
        };
        assert!(reg.restore(broken).is_err());
        assert!(reg.is_empty());
        let fresh = below(&mut reg, "BTC", 30_000.0);
        assert_eq!(fresh.id, AlertId(10));
    }

    #[test]
    fn test_symbol_is_trimmed() {
        let mut reg = AlertRegistry::new();
        let alert = below(&mut reg, " BTC ", 30_000.0);
        assert_eq!(alert.symbol, "BTC");
        assert_eq!(reg.for_symbol("BTC").len(), 1);
        let groups = reg.match_and_trigger(&[tick("BTC", 29_000.0)]);
        assert_eq!(groups.len(), 1);
    }
}
