pub mod db;
pub mod memory;
pub mod simulated;

pub use db::SqliteAlertStore;
pub use memory::InMemoryAlertStore;
pub use simulated::SimulatedTickSource;

use std::sync::Arc;
use tickwatch_core::{AlertStore, StoreError};

/// Open the alert store for a database URL, or an in-memory store without one.
pub async fn open_alert_store(
    database_url: Option<&str>,
) -> Result<Arc<dyn AlertStore>, StoreError> {
    match database_url {
        Some(url) => Ok(Arc::new(SqliteAlertStore::open(url).await?)),
        None => {
            tracing::info!("No database configured, alerts will not survive a restart");
            Ok(Arc::new(InMemoryAlertStore::new()))
        }
    }
}
