use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tickwatch_core::{Alert, AlertDirection, AlertId, AlertStore, StoreError};
use tracing::info;

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::DatabaseError(e.to_string())
}

/// Run embedded migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Open a SQLite pool, creating the database file if needed.
///
/// In-memory databases are private to one connection, so the pool is
/// pinned to a single long-lived connection for them.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    pool_options.connect_with(options).await
}

/// Alerts persisted in the `alerts` table.
#[derive(Debug, Clone)]
pub struct SqliteAlertStore {
    pool: SqlitePool,
}

impl SqliteAlertStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and migrate in one step.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = connect(database_url).await.map_err(db_err)?;
        run_migrations(&pool).await.map_err(db_err)?;
        info!(url = %database_url, "Alert store ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_id(id: AlertId) -> Result<i64, StoreError> {
    i64::try_from(id.0).map_err(|_| db_err(format!("alert id {id} does not fit in a row id")))
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO alerts (id, symbol, price, direction, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(row_id(alert.id)?)
        .bind(&alert.symbol)
        .bind(alert.target_price)
        .bind(alert.direction.as_str())
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: AlertId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM alerts WHERE id = ?")
            .bind(row_id(id)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Alert>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, symbol, price, direction, created_at
             FROM alerts
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|r| -> Result<Alert, StoreError> {
                let id: i64 = r.try_get("id").map_err(db_err)?;
                let corrupt = |reason: String| StoreError::Corrupt { id, reason };
                let raw_direction: String = r.try_get("direction").map_err(db_err)?;
                let direction = AlertDirection::from_str(&raw_direction).map_err(corrupt)?;
                let created_at: DateTime<Utc> = r.try_get("created_at").map_err(db_err)?;
                Ok(Alert {
                    id: AlertId(u64::try_from(id).map_err(|_| corrupt("negative id".into()))?),
                    symbol: r.try_get("symbol").map_err(db_err)?,
                    target_price: r.try_get("price").map_err(db_err)?,
                    direction,
                    created_at,
                })
            })
            .collect()
    }
}
