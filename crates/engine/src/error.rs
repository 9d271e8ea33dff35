use chrono::{DateTime, Utc};

/// Errors returned by the engine. Both are local to the offending request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A malformed tick; the series is left untouched.
    #[error("Invalid point for {symbol}: {reason}")]
    InvalidPoint { symbol: String, reason: PointRejection },
    /// A malformed alert request; the registry is left untouched.
    #[error("Invalid alert: {0}")]
    InvalidAlert(String),
}

/// Why a point was refused by the series store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PointRejection {
    #[error("price {0} is not a finite number")]
    NonFinitePrice(f64),
    #[error("price {0} is negative")]
    NegativePrice(f64),
    #[error("timestamp {timestamp} precedes last point at {last}")]
    OutOfOrder {
        timestamp: DateTime<Utc>,
        last: DateTime<Utc>,
    },
    #[error("symbol is empty")]
    EmptySymbol,
}
