use crate::error::{EngineError, PointRejection};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tickwatch_core::PricePoint;

/// Append-only price history of one instrument.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
    /// Prices mirrored from `points` so calculators can borrow a slice.
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            points: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Check a point against the series invariants without appending it.
    pub fn check(&self, price: f64, timestamp: DateTime<Utc>) -> Result<(), PointRejection> {
        if !price.is_finite() {
            return Err(PointRejection::NonFinitePrice(price));
        }
        if price < 0.0 {
            return Err(PointRejection::NegativePrice(price));
        }
        if let Some(last) = self.points.last() {
            if timestamp < last.timestamp {
                return Err(PointRejection::OutOfOrder {
                    timestamp,
                    last: last.timestamp,
                });
            }
        }
        Ok(())
    }

    pub fn push(&mut self, price: f64, timestamp: DateTime<Utc>) -> Result<(), PointRejection> {
        self.check(price, timestamp)?;
        self.points.push(PricePoint { timestamp, price });
        self.prices.push(price);
        Ok(())
    }
}

/// Every instrument's price series, keyed by symbol.
#[derive(Debug, Default)]
pub struct SeriesStore {
    series: HashMap<String, PriceSeries>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one point, creating the series on first use.
    /// A rejected point never creates or modifies a series.
    pub fn append(
        &mut self,
        symbol: &str,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<&PriceSeries, EngineError> {
        let invalid = |reason| EngineError::InvalidPoint {
            symbol: symbol.to_string(),
            reason,
        };
        if symbol.trim().is_empty() {
            return Err(invalid(PointRejection::EmptySymbol));
        }

        match self.series.get_mut(symbol) {
            Some(series) => {
                series.push(price, timestamp).map_err(invalid)?;
            }
            None => {
                let mut series = PriceSeries::new(symbol);
                series.push(price, timestamp).map_err(invalid)?;
                self.series.insert(symbol.to_string(), series);
            }
        }
        self.series
            .get(symbol)
            .ok_or_else(|| invalid(PointRejection::EmptySymbol))
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    /// Full ordered price history; empty for an unknown symbol.
    pub fn history(&self, symbol: &str) -> &[f64] {
        self.series.get(symbol).map(|s| s.prices()).unwrap_or(&[])
    }

    pub fn points(&self, symbol: &str) -> &[PricePoint] {
        self.series.get(symbol).map(|s| s.points()).unwrap_or(&[])
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}
