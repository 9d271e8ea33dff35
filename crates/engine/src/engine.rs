use crate::alerts::AlertRegistry;
use crate::cache::IndicatorCache;
use crate::error::EngineError;
use crate::series::SeriesStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tickwatch_core::*;
use tickwatch_indicators::{overlays, IndicatorConfig};
use tracing::{debug, warn};

/// The indicator and alert engine.
///
/// Owns every piece of per-instrument state: price series, latest indicator
/// snapshots and active alerts. Construct one per process and hand it to
/// the dispatcher.
#[derive(Debug, Default)]
pub struct Engine {
    series: SeriesStore,
    cache: IndicatorCache,
    alerts: AlertRegistry,
}

impl Engine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            series: SeriesStore::new(),
            cache: IndicatorCache::new(config),
            alerts: AlertRegistry::new(),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        self.cache.config()
    }

    /// Append one point and refresh that symbol's indicator snapshot.
    pub fn ingest(
        &mut self,
        symbol: &str,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let series = self.series.append(symbol, price, timestamp)?;
        self.cache.refresh(symbol, series.prices());
        Ok(())
    }

    /// Latest snapshot; the "insufficient history" snapshot for unknown symbols.
    pub fn snapshot(&self, symbol: &str) -> IndicatorSnapshot {
        self.cache.snapshot(symbol)
    }

    /// Full ordered price history of a symbol.
    pub fn history(&self, symbol: &str) -> Vec<f64> {
        self.series.history(symbol).to_vec()
    }

    pub fn last_price(&self, symbol: &str) -> Option<PricePoint> {
        self.series.get(symbol).and_then(|s| s.last().copied())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.series.symbols()
    }

    /// Every stored point with the indicator overlays aligned to it.
    pub fn chart(&self, symbol: &str) -> Vec<ChartPoint> {
        let points = self.series.points(symbol);
        let prices = self.series.history(symbol);
        points
            .iter()
            .zip(overlays(prices, self.cache.config()))
            .map(|(point, overlay)| ChartPoint {
                timestamp: point.timestamp,
                price: point.price,
                sma: overlay.sma,
                ema: overlay.ema,
                upper_band: overlay.upper_band,
                lower_band: overlay.lower_band,
                regression: overlay.regression,
            })
            .collect()
    }

    /// Create a downside alert: fires once the price is at or below `target_price`.
    pub fn create_alert(&mut self, symbol: &str, target_price: f64) -> Result<Alert, EngineError> {
        self.create_alert_with(symbol, target_price, AlertDirection::Below)
    }

    pub fn create_alert_with(
        &mut self,
        symbol: &str,
        target_price: f64,
        direction: AlertDirection,
    ) -> Result<Alert, EngineError> {
        self.alerts
            .create(symbol, target_price, direction, Utc::now())
    }

    pub fn restore_alert(&mut self, alert: Alert) -> Result<(), EngineError> {
        self.alerts.restore(alert)
    }

    /// Delete an alert without reporting it. Absent ids are a no-op.
    pub fn delete_alert(&mut self, id: AlertId) -> Option<Alert> {
        self.alerts.remove(id)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.all()
    }

    pub fn alerts_for(&self, symbol: &str) -> Vec<Alert> {
        self.alerts.for_symbol(symbol)
    }

    /// Run one processing cycle over a tick batch.
    ///
    /// Each tick is appended and its symbol's snapshot refreshed; a rejected
    /// tick is logged and left out of the report without affecting the rest.
    /// Alerts are then matched against the accepted ticks in one pass.
    pub fn run_cycle(&mut self, batch: &[Tick]) -> CycleReport {
        let mut accepted = Vec::with_capacity(batch.len());
        for tick in batch {
            match self.series.append(&tick.symbol, tick.price, tick.timestamp) {
                Ok(_) => accepted.push(tick.clone()),
                Err(e) => warn!(symbol = %tick.symbol, error = %e, "Rejected tick"),
            }
        }

        let touched: BTreeSet<&str> = accepted.iter().map(|t| t.symbol.as_str()).collect();
        for symbol in touched {
            self.cache.refresh(symbol, self.series.history(symbol));
        }

        let enriched = accepted
            .iter()
            .map(|tick| EnrichedTick {
                tick: tick.clone(),
                indicators: self.cache.snapshot(&tick.symbol),
            })
            .collect();
        let triggered = self.alerts.match_and_trigger(&accepted);

        debug!(
            ticks = batch.len(),
            accepted = accepted.len(),
            triggered = triggered.len(),
            "Cycle complete"
        );

        CycleReport {
            enriched,
            triggered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    const SERIES: [f64; 15] = [
        100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0, 108.0, 111.0, 115.0, 113.0, 112.0, 116.0,
        114.0, 118.0,
    ];

    #[test]
    fn test_snapshot_after_fifteen_points() {
        let mut engine = Engine::new(IndicatorConfig::default());
        for (i, p) in SERIES.iter().enumerate() {
            engine.ingest("AAPL", *p, t(i as i64)).unwrap();
        }
        let snap = engine.snapshot("AAPL");
        assert_eq!(snap.history_len, 15);
        let rsi = snap.rsi.unwrap();
        assert!((0.0..=100.0).contains(&rsi));
        assert!(snap.bollinger.is_none());

        for i in 15..20 {
            engine.ingest("AAPL", 118.0, t(i)).unwrap();
        }
        assert!(engine.snapshot("AAPL").bollinger.is_some());
    }

    #[test]
    fn test_unknown_symbol_snapshot() {
        let engine = Engine::default();
        assert_eq!(engine.snapshot("BTC"), IndicatorSnapshot::default());
        assert!(engine.chart("BTC").is_empty());
    }

    #[test]
    fn test_ingest_rejects_bad_point() {
        let mut engine = Engine::new(IndicatorConfig::default());
        engine.ingest("BTC", 100.0, t(5)).unwrap();
        assert!(engine.ingest("BTC", f64::NAN, t(6)).is_err());
        assert!(engine.ingest("BTC", 101.0, t(1)).is_err());
        assert_eq!(engine.history("BTC"), vec![100.0]);
        assert_eq!(engine.snapshot("BTC").history_len, 1);
    }

    #[test]
    fn test_alert_fires_once_through_cycles() {
        let mut engine = Engine::new(IndicatorConfig::default());
        let alert = engine.create_alert("BTC", 30_000.0).unwrap();

        let report = engine.run_cycle(&[Tick::new("BTC", 29_999.0, t(0))]);
        assert_eq!(report.triggered.len(), 1);
        assert_eq!(report.triggered[0].symbol, "BTC");
        assert_eq!(report.triggered[0].alerts[0].id, alert.id);
        assert!(engine.alerts_for("BTC").is_empty());

        let report = engine.run_cycle(&[Tick::new("BTC", 29_999.0, t(1))]);
        assert!(report.triggered.is_empty());
        assert_eq!(report.enriched.len(), 1);
    }

    #[test]
    fn test_alert_at_exact_target() {
        let mut engine = Engine::default();
        engine.create_alert("SP500", 4_000.0).unwrap();
        let report = engine.run_cycle(&[Tick::new("SP500", 4_000.0, t(0))]);
        assert_eq!(report.triggered_count(), 1);
    }

    #[test]
    fn test_deleted_alert_never_fires() {
        let mut engine = Engine::default();
        let alert = engine.create_alert("BTC", 30_000.0).unwrap();
        assert!(engine.delete_alert(alert.id).is_some());
        assert!(engine.delete_alert(alert.id).is_none());
        let report = engine.run_cycle(&[Tick::new("BTC", 1.0, t(0))]);
        assert!(report.triggered.is_empty());
    }

    #[test]
    fn test_bad_tick_does_not_abort_cycle() {
        let mut engine = Engine::default();
        engine.create_alert("CAC40", 6_000.0).unwrap();
        engine.create_alert("BTC", 30_000.0).unwrap();
        let batch = [
            Tick::new("BTC", f64::INFINITY, t(0)),
            Tick::new("CAC40", 5_900.0, t(0)),
        ];
        let report = engine.run_cycle(&batch);
        assert_eq!(report.enriched.len(), 1);
        assert_eq!(report.enriched[0].tick.symbol, "CAC40");
        assert_eq!(report.triggered.len(), 1);
        assert_eq!(report.triggered[0].symbol, "CAC40");
        assert_eq!(engine.alerts_for("BTC").len(), 1);
        assert!(engine.history("BTC").is_empty());
    }

    #[test]
    fn test_enriched_snapshot_reflects_batch() {
        let mut engine = Engine::default();
        let batch = [
            Tick::new("BTC", 30_000.0, t(0)),
            Tick::new("SP500", 4_000.0, t(0)),
        ];
        engine.run_cycle(&batch);
        let report = engine.run_cycle(&[
            Tick::new("BTC", 30_100.0, t(2)),
            Tick::new("SP500", 4_010.0, t(2)),
        ]);
        for e in &report.enriched {
            assert_eq!(e.indicators.history_len, 2);
            assert!(e.indicators.regression.is_some());
        }
        assert_eq!(engine.symbols(), vec!["BTC".to_string(), "SP500".to_string()]);
        assert_eq!(engine.last_price("BTC").map(|p| p.price), Some(30_100.0));
    }

    #[test]
    fn test_chart_aligns_overlays() {
        let mut engine = Engine::default();
        for (i, p) in SERIES.iter().enumerate() {
            engine.ingest("AAPL", *p, t(i as i64)).unwrap();
        }
        let chart = engine.chart("AAPL");
        assert_eq!(chart.len(), 15);
        assert!(chart[12].sma.is_none());
        assert!(chart[13].sma.is_some());
        let snap_sma = engine.snapshot("AAPL").sma.unwrap();
        assert!((chart[14].sma.unwrap() - snap_sma).abs() < 1e-9);
        assert!(chart.iter().all(|row| row.upper_band.is_none()));
        assert_eq!(chart[3].timestamp, t(3));
    }
}
