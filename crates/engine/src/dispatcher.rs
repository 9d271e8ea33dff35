use crate::engine::Engine;
use crate::error::EngineError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tickwatch_core::*;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

type AlertSender = mpsc::UnboundedSender<TriggeredGroup>;

/// One subscriber's view of the event stream.
///
/// Tick batches travel over a bounded broadcast channel and a subscriber
/// that falls behind loses the oldest ones (`RecvError::Lagged`). Fired
/// alerts have a queue of their own per subscriber and are never dropped
/// while the subscription is alive.
pub struct Subscription {
    ticks: broadcast::Receiver<EngineEvent>,
    alerts: mpsc::UnboundedReceiver<TriggeredGroup>,
}

impl Subscription {
    /// Wait for the next event.
    ///
    /// Pending tick batches are handed out before pending alerts, keeping
    /// the per-cycle order for subscribers that keep up. Returns
    /// `RecvError::Closed` once the dispatcher is gone and both queues are
    /// drained. Cancel safe.
    pub async fn recv(&mut self) -> Result<EngineEvent, RecvError> {
        tokio::select! {
            biased;
            result = self.ticks.recv() => match result {
                Err(RecvError::Closed) => self
                    .alerts
                    .try_recv()
                    .map(EngineEvent::PriceAlert)
                    .map_err(|_| RecvError::Closed),
                other => other,
            },
            Some(group) = self.alerts.recv() => Ok(EngineEvent::PriceAlert(group)),
        }
    }
}

/// Boundary between the engine and its collaborators.
///
/// Owns the engine behind a single lock so cycles, alert creation and alert
/// removal never interleave, persists alert changes to the store, and fans
/// events out to every connected subscriber.
pub struct Dispatcher {
    engine: RwLock<Engine>,
    store: Arc<dyn AlertStore>,
    ticks: broadcast::Sender<EngineEvent>,
    alert_subscribers: Mutex<Vec<AlertSender>>,
    /// symbol → display name, attached to fired alert groups.
    names: HashMap<String, String>,
}

impl Dispatcher {
    /// `capacity` bounds how many tick batches a slow subscriber may fall
    /// behind before it starts losing them.
    pub fn new(engine: Engine, store: Arc<dyn AlertStore>, capacity: usize) -> Self {
        let (ticks, _) = broadcast::channel(capacity.max(1));
        Self {
            engine: RwLock::new(engine),
            store,
            ticks,
            alert_subscribers: Mutex::new(Vec::new()),
            names: HashMap::new(),
        }
    }

    /// Name fired alert groups after their instrument.
    pub fn with_instruments(mut self, instruments: &[Instrument]) -> Self {
        self.names = instruments
            .iter()
            .map(|i| (i.symbol.clone(), i.name.clone()))
            .collect();
        self
    }

    fn alert_senders(&self) -> MutexGuard<'_, Vec<AlertSender>> {
        self.alert_subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every event published from now on. Events sent while a
    /// subscriber is disconnected are not replayed.
    pub fn subscribe(&self) -> Subscription {
        let (tx, alerts) = mpsc::unbounded_channel();
        self.alert_senders().push(tx);
        Subscription {
            ticks: self.ticks.subscribe(),
            alerts,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.alert_senders();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Load persisted alerts into the registry. Returns how many were restored.
    pub async fn restore_alerts(&self) -> Result<usize, StoreError> {
        let persisted = self.store.list().await?;
        let mut engine = self.engine.write().await;
        let mut restored = 0;
        for alert in persisted {
            let id = alert.id;
            match engine.restore_alert(alert) {
                Ok(()) => restored += 1,
                Err(e) => warn!(alert_id = %id, error = %e, "Skipping persisted alert"),
            }
        }
        info!(restored, "Restored alerts from store");
        Ok(restored)
    }

    /// Register and persist a new alert. Nothing is kept if persisting fails.
    pub async fn create_alert(
        &self,
        symbol: &str,
        target_price: f64,
        direction: AlertDirection,
    ) -> Result<Alert, DispatchError> {
        let mut engine = self.engine.write().await;
        let alert = engine.create_alert_with(symbol, target_price, direction)?;
        if let Err(e) = self.store.insert(&alert).await {
            engine.delete_alert(alert.id);
            return Err(e.into());
        }
        info!(
            alert_id = %alert.id,
            symbol = %alert.symbol,
            target = alert.target_price,
            direction = alert.direction.as_str(),
            "Alert created"
        );
        Ok(alert)
    }

    /// Remove an alert from the registry and the store. Idempotent.
    pub async fn delete_alert(&self, id: AlertId) -> Result<(), DispatchError> {
        let mut engine = self.engine.write().await;
        if engine.delete_alert(id).is_some() {
            info!(alert_id = %id, "Alert deleted");
        }
        self.store.delete(id).await?;
        Ok(())
    }

    pub async fn list_alerts(&self, symbol: Option<&str>) -> Vec<Alert> {
        let engine = self.engine.read().await;
        match symbol {
            Some(symbol) => engine.alerts_for(symbol),
            None => engine.alerts(),
        }
    }

    pub async fn snapshot(&self, symbol: &str) -> IndicatorSnapshot {
        self.engine.read().await.snapshot(symbol)
    }

    pub async fn chart(&self, symbol: &str) -> Vec<ChartPoint> {
        self.engine.read().await.chart(symbol)
    }

    pub async fn last_price(&self, symbol: &str) -> Option<PricePoint> {
        self.engine.read().await.last_price(symbol)
    }

    /// Run one cycle and publish its results.
    ///
    /// Triggered alerts are removed from the store as well; a store failure
    /// is logged and does not hold back the events.
    pub async fn dispatch(&self, batch: Vec<Tick>) -> CycleReport {
        let mut report = self.engine.write().await.run_cycle(&batch);
        for group in &mut report.triggered {
            group.name = self.names.get(&group.symbol).cloned();
        }

        for group in &report.triggered {
            for alert in &group.alerts {
                if let Err(e) = self.store.delete(alert.id).await {
                    warn!(
                        alert_id = %alert.id,
                        error = %e,
                        "Failed to remove triggered alert from store"
                    );
                }
            }
        }

        if !report.enriched.is_empty() {
            self.publish_ticks(report.enriched.clone());
        }
        for group in &report.triggered {
            info!(
                symbol = %group.symbol,
                price = group.price,
                alerts = group.alerts.len(),
                "Price alert fired"
            );
            self.publish_alert(group);
        }

        report
    }

    fn publish_ticks(&self, enriched: Vec<EnrichedTick>) {
        match self.ticks.send(EngineEvent::Ticks(enriched)) {
            Ok(receivers) => trace!(receivers, "Ticks published"),
            Err(_) => trace!("No subscribers for ticks"),
        }
    }

    fn publish_alert(&self, group: &TriggeredGroup) {
        let mut subscribers = self.alert_senders();
        // A failed send means the subscription was dropped
        subscribers.retain(|tx| tx.send(group.clone()).is_ok());
        trace!(symbol = %group.symbol, receivers = subscribers.len(), "Price alert published");
    }

    /// Drive one cycle per `period` from `source` until `shutdown` resolves
    /// or the source is exhausted. Returns the number of cycles run.
    pub async fn run<S, F>(&self, source: &mut S, period: Duration, shutdown: F) -> u64
    where
        S: TickSource + ?Sized,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0u64;
        info!(period_ms = period.as_millis() as u64, "Tick loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(cycles, "Tick loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match source.next_batch().await {
                        Ok(batch) => {
                            let report = self.dispatch(batch).await;
                            cycles += 1;
                            debug!(
                                cycle = cycles,
                                fired = report.triggered_count(),
                                "Cycle dispatched"
                            );
                        }
                        Err(SourceError::Exhausted) => {
                            info!(cycles, "Tick source exhausted");
                            break;
                        }
                        Err(e) => warn!(error = %e, "Tick source failed, skipping cycle"),
                    }
                }
            }
        }
        cycles
    }
}
