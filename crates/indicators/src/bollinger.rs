use crate::sma::Sma;
use crate::Indicator;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One Bollinger Bands reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBand {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

impl BollingerBand {
    fn from_window(window: &[f64], k: f64) -> Self {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let sd = population_std_dev(window, mean);
        Self {
            middle: mean,
            upper: mean + k * sd,
            lower: mean - k * sd,
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.upper - self.lower
    }
}

fn population_std_dev<'a>(values: impl IntoIterator<Item = &'a f64>, mean: f64) -> f64 {
    let (sum_sq, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + (v - mean).powi(2), c + 1));
    if count == 0 {
        return 0.0;
    }
    // Rounding can push a constant window's variance a hair below zero
    (sum_sq / count as f64).max(0.0).sqrt()
}

/// Bollinger Bands over every trailing window of `period` prices, using the
/// population standard deviation. Same truncation as [`crate::sma`].
pub fn bollinger(prices: &[f64], period: usize, k: f64) -> Vec<BollingerBand> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    prices
        .windows(period)
        .map(|w| BollingerBand::from_window(w, k))
        .collect()
}

/// Bollinger Bands, streaming form.
///
/// Returns the middle band (SMA). Use `output()` for the full reading.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    len: usize,
    num_std: f64,
    sma: Sma,
    buffer: VecDeque<f64>,
    current: Option<BollingerBand>,
}

impl BollingerBands {
    pub fn new(period: usize, num_std_dev: f64) -> Self {
        Self {
            len: period,
            num_std: num_std_dev,
            sma: Sma::new(period),
            buffer: VecDeque::with_capacity(period),
            current: None,
        }
    }

    /// Standard Bollinger Bands (20, 2).
    pub fn default_periods() -> Self {
        Self::new(20, 2.0)
    }

    pub fn output(&self) -> Option<BollingerBand> {
        self.current
    }

    pub fn next_output(&mut self, value: f64) -> Option<BollingerBand> {
        self.buffer.push_back(value);
        if self.buffer.len() > self.len {
            self.buffer.pop_front();
        }

        if let Some(mid) = self.sma.next(value) {
            let sd = population_std_dev(&self.buffer, mid);
            self.current = Some(BollingerBand {
                middle: mid,
                upper: mid + self.num_std * sd,
                lower: mid - self.num_std * sd,
            });
        }

        self.output()
    }
}

impl Indicator for BollingerBands {
    fn next(&mut self, value: f64) -> Option<f64> {
        self.next_output(value).map(|o| o.middle)
    }

    fn reset(&mut self) {
        self.sma.reset();
        self.buffer.clear();
        self.current = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_basic() {
        let out = bollinger(&[10.0, 11.0, 12.0], 3, 2.0);
        assert_eq!(out.len(), 1);
        let band = out[0];
        assert_eq!(band.middle, 11.0);
        // population sd of [10, 11, 12] = sqrt(2/3)
        let sd = (2.0f64 / 3.0).sqrt();
        assert!((band.upper - (11.0 + 2.0 * sd)).abs() < 1e-12);
        assert!((band.lower - (11.0 - 2.0 * sd)).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_short_series() {
        let prices: Vec<f64> = (0..19).map(f64::from).collect();
        assert!(bollinger(&prices, 20, 2.0).is_empty());
        assert!(bollinger(&prices, 0, 2.0).is_empty());
    }

    #[test]
    fn test_bollinger_constant_window_collapses() {
        let out = bollinger(&[5.0; 20], 20, 2.0);
        assert_eq!(out[0].upper, 5.0);
        assert_eq!(out[0].lower, 5.0);
        assert_eq!(out[0].bandwidth(), 0.0);
    }

    #[test]
    fn test_streaming_matches_batch() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i * 7 % 11)).collect();
        let mut bb = BollingerBands::default_periods();
        let mut last = None;
        for p in &prices {
            last = bb.next_output(*p);
        }
        let batch = bollinger(&prices, 20, 2.0);
        let expected = batch.last().copied().unwrap();
        let got = last.unwrap();
        assert!((got.middle - expected.middle).abs() < 1e-9);
        assert!((got.upper - expected.upper).abs() < 1e-9);
        assert!((got.lower - expected.lower).abs() < 1e-9);
    }
}
