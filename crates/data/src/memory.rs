use async_trait::async_trait;
use std::collections::BTreeMap;
use tickwatch_core::{Alert, AlertId, AlertStore, StoreError};
use tokio::sync::RwLock;

/// Alert store that lives and dies with the process.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    alerts: RwLock<BTreeMap<AlertId, Alert>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts.write().await.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn delete(&self, id: AlertId) -> Result<(), StoreError> {
        self.alerts.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(self.alerts.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tickwatch_core::AlertDirection;

    fn alert(id: u64) -> Alert {
        Alert {
            id: AlertId(id),
            symbol: "BTC".to_string(),
            target_price: 30_000.0,
            direction: AlertDirection::Below,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_list_delete() {
        let store = InMemoryAlertStore::new();
        store.insert(&alert(2)).await.unwrap();
        store.insert(&alert(1)).await.unwrap();
        let ids: Vec<AlertId> = store.list().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![AlertId(1), AlertId(2)]);

        store.delete(AlertId(1)).await.unwrap();
        store.delete(AlertId(1)).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
