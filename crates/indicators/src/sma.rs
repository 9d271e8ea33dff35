use crate::Indicator;
use std::collections::VecDeque;

/// Simple Moving Average over every trailing window of `period` prices.
///
/// The first value lines up with `prices[period - 1]`; the output is empty
/// when there are fewer than `period` prices.
pub fn sma(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    prices
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Simple Moving Average (SMA), streaming form.
///
/// A zero period never becomes ready, matching the empty batch output.
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            len: period,
            buffer: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    /// Get the current SMA value without feeding new data.
    pub fn value(&self) -> Option<f64> {
        if self.is_ready() {
            Some(self.sum / self.len as f64)
        } else {
            None
        }
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: f64) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        self.sum += value;
        self.buffer.push_back(value);

        if self.buffer.len() > self.len {
            if let Some(removed) = self.buffer.pop_front() {
                self.sum -= removed;
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sum = 0.0;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.len > 0 && self.buffer.len() == self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_windows() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sma_short_series() {
        assert!(sma(&[1.0, 2.0], 3).is_empty());
        assert!(sma(&[], 1).is_empty());
        assert!(sma(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_sma_streaming() {
        let mut sma = Sma::new(3);
        assert_eq!(sma.next(1.0), None);
        assert_eq!(sma.next(2.0), None);
        assert_eq!(sma.next(3.0), Some(2.0));
        assert_eq!(sma.next(4.0), Some(3.0));
        assert_eq!(sma.next(5.0), Some(4.0));
    }

    #[test]
    fn test_sma_reset() {
        let mut sma = Sma::new(2);
        sma.next(10.0);
        sma.next(20.0);
        sma.reset();
        assert!(!sma.is_ready());
        assert_eq!(sma.next(5.0), None);
        assert_eq!(sma.next(15.0), Some(10.0));
    }

    #[test]
    fn test_sma_zero_period_never_ready() {
        let mut sma = Sma::new(0);
        assert_eq!(sma.next(1.0), None);
        assert_eq!(sma.value(), None);
    }

    #[test]
    fn test_streaming_matches_batch() {
        let prices = [100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0];
        let mut stream = Sma::new(4);
        let mut last = None;
        for p in prices {
            last = stream.next(p);
        }
        let batch = sma(&prices, 4);
        let expected = batch.last().copied().unwrap();
        assert!((last.unwrap() - expected).abs() < 1e-9);
    }
}
