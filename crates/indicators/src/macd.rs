use crate::ema::{ema, Ema};
use crate::Indicator;
use serde::{Deserialize, Serialize};

/// MACD output with all three components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD (Moving Average Convergence Divergence).
///
/// The MACD line is `EMA(fast) - EMA(slow)` over the full series. The first
/// `slow - 1` points are dropped as slow-EMA warm-up, the signal line is an
/// EMA of what remains, and the histogram is their difference. The result
/// therefore has `len - (slow - 1)` entries, the first lining up with
/// `prices[slow - 1]`.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<MacdOutput> {
    if fast == 0 || signal == 0 || fast >= slow || prices.len() < slow {
        return Vec::new();
    }

    let fast_line = ema(prices, fast);
    let slow_line = ema(prices, slow);
    let trimmed: Vec<f64> = fast_line
        .iter()
        .zip(slow_line.iter())
        .skip(slow - 1)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&trimmed, signal);

    trimmed
        .iter()
        .zip(signal_line.iter())
        .map(|(&macd, &signal)| MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        })
        .collect()
}

/// MACD, streaming form. Emits the same values as [`macd`] from the
/// `slow`-th price on; invalid periods never emit.
#[derive(Debug, Clone)]
pub struct Macd {
    slow_len: usize,
    valid: bool,
    fast: Ema,
    slow: Ema,
    signal: Ema,
    count: usize,
    current: Option<MacdOutput>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            slow_len: slow,
            valid: fast > 0 && signal > 0 && fast < slow,
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            count: 0,
            current: None,
        }
    }

    pub fn output(&self) -> Option<MacdOutput> {
        self.current
    }

    pub fn next_output(&mut self, price: f64) -> Option<MacdOutput> {
        if !self.valid {
            return None;
        }
        let fast = self.fast.next(price);
        let slow = self.slow.next(price);
        self.count += 1;
        if self.count < self.slow_len {
            return None;
        }

        if let (Some(fast), Some(slow)) = (fast, slow) {
            let line = fast - slow;
            if let Some(signal) = self.signal.next(line) {
                self.current = Some(MacdOutput {
                    macd: line,
                    signal,
                    histogram: line - signal,
                });
            }
        }
        self.current
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: f64) -> Option<f64> {
        self.next_output(value).map(|o| o.macd)
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.count = 0;
        self.current = None;
    }

    fn period(&self) -> usize {
        self.slow_len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: i32) -> Vec<f64> {
        (0..n).map(|i| 100.0 + f64::from(i) * 0.5 + f64::from(i % 3)).collect()
    }

    #[test]
    fn test_macd_needs_slow_period_data() {
        assert!(macd(&series(25), 12, 26, 9).is_empty());
        assert_eq!(macd(&series(26), 12, 26, 9).len(), 1);
    }

    #[test]
    fn test_macd_trimmed_length() {
        for n in [26, 30, 34, 60] {
            let out = macd(&series(n), 12, 26, 9);
            assert_eq!(out.len(), n as usize - 25);
        }
    }

    #[test]
    fn test_macd_histogram_is_difference() {
        for out in macd(&series(50), 12, 26, 9) {
            assert!((out.histogram - (out.macd - out.signal)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_macd_first_signal_equals_macd() {
        // signal EMA is seeded with the first trimmed MACD value
        let out = macd(&series(40), 3, 5, 3);
        assert_eq!(out[0].signal, out[0].macd);
        assert_eq!(out[0].histogram, 0.0);
    }

    #[test]
    fn test_macd_rejects_bad_periods() {
        assert!(macd(&series(40), 26, 12, 9).is_empty());
        assert!(macd(&series(40), 0, 26, 9).is_empty());
        assert!(macd(&series(40), 12, 26, 0).is_empty());
    }

    #[test]
    fn test_macd_flat_series_is_zero() {
        let out = macd(&[10.0; 30], 12, 26, 9);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|o| o.macd.abs() < 1e-9 && o.signal.abs() < 1e-9));
    }

    #[test]
    fn test_streaming_matches_batch() {
        let prices = series(45);
        let batch = macd(&prices, 12, 26, 9);
        let mut stream = Macd::new(12, 26, 9);
        let streamed: Vec<MacdOutput> = prices
            .iter()
            .filter_map(|p| stream.next_output(*p))
            .collect();
        assert_eq!(streamed.len(), batch.len());
        for (a, b) in streamed.iter().zip(batch.iter()) {
            assert!((a.macd - b.macd).abs() < 1e-12);
            assert!((a.signal - b.signal).abs() < 1e-12);
        }
    }

    #[test]
    fn test_streaming_rejects_bad_periods() {
        let mut stream = Macd::new(26, 12, 9);
        for p in series(40) {
            assert_eq!(stream.next_output(p), None);
        }
        assert!(!stream.is_ready());
    }
}
