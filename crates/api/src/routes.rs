use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tickwatch_core::{AlertDirection, AlertId, ChartPoint, IndicatorSnapshot};

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Instruments
        .route("/instruments", get(list_instruments))
        .route("/instruments/{symbol}/snapshot", get(instrument_snapshot))
        .route("/instruments/{symbol}/chart", get(instrument_chart))
        // Alerts
        .route("/alerts", get(list_alerts).post(create_alert))
        .route("/alerts/{id}", delete(delete_alert))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "subscribers": state.dispatcher.subscriber_count(),
    }))
}

// ---------------------------------------------------------------------------
// Instruments
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct InstrumentQuote {
    symbol: String,
    name: String,
    base_price: f64,
    /// Latest accepted price, absent until the first tick arrives.
    price: Option<f64>,
    timestamp: Option<DateTime<Utc>>,
}

async fn list_instruments(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut quotes = Vec::with_capacity(state.instruments.len());
    for instrument in &state.instruments {
        let last = state.dispatcher.last_price(&instrument.symbol).await;
        quotes.push(InstrumentQuote {
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            base_price: instrument.base_price,
            price: last.map(|p| p.price),
            timestamp: last.map(|p| p.timestamp),
        });
    }
    Json(quotes)
}

/// Symbols outside the catalogue are only served once they have history.
async fn ensure_known(state: &AppState, symbol: &str) -> Result<(), ApiError> {
    if state.instrument(symbol).is_some() || state.dispatcher.last_price(symbol).await.is_some() {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("Unknown instrument {symbol}")))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotResponse {
    symbol: String,
    indicators: IndicatorSnapshot,
}

async fn instrument_snapshot(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    ensure_known(&state, &symbol).await?;
    let indicators = state.dispatcher.snapshot(&symbol).await;
    Ok(Json(SnapshotResponse { symbol, indicators }))
}

async fn instrument_chart(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<ChartPoint>>, ApiError> {
    ensure_known(&state, &symbol).await?;
    Ok(Json(state.dispatcher.chart(&symbol).await))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AlertFilter {
    symbol: Option<String>,
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AlertFilter>,
) -> impl IntoResponse {
    Json(state.dispatcher.list_alerts(filter.symbol.as_deref()).await)
}

#[derive(Debug, Deserialize)]
struct CreateAlertRequest {
    symbol: String,
    price: f64,
    #[serde(default)]
    direction: AlertDirection,
}

async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = state
        .dispatcher
        .create_alert(&req.symbol, req.price, req.direction)
        .await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn delete_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.dispatcher.delete_alert(AlertId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
