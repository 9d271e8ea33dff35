use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Tick Source Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while producing ticks.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Tick source exhausted")]
    Exhausted,
    #[error("Tick source error: {0}")]
    Other(String),
}

/// Produces one batch of ticks per call, at whatever cadence the caller drives.
#[async_trait]
pub trait TickSource: Send {
    /// Instruments this source quotes.
    fn instruments(&self) -> Vec<Instrument>;

    /// Produce the next tick batch.
    async fn next_batch(&mut self) -> Result<Vec<Tick>, SourceError>;
}

// ---------------------------------------------------------------------------
// Alert Store Trait
// ---------------------------------------------------------------------------

/// Errors that can occur during alert persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Corrupt alert record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Durable key-value records of active alerts, keyed by alert id.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persist a newly created alert.
    async fn insert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Remove an alert. Removing an absent id is not an error.
    async fn delete(&self, id: AlertId) -> Result<(), StoreError>;

    /// Every persisted alert, ordered by id.
    async fn list(&self) -> Result<Vec<Alert>, StoreError>;
}
