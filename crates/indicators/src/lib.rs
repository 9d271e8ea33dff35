pub mod bollinger;
pub mod config;
pub mod ema;
pub mod macd;
pub mod regression;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use bollinger::{bollinger, BollingerBand, BollingerBands};
pub use config::IndicatorConfig;
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdOutput};
pub use regression::{linear_regression, RegressionFit};
pub use rsi::{rsi, Rsi};
pub use sma::{sma, Sma};
pub use snapshot::{overlays, IndicatorSnapshot, IndicatorState, Overlay};

/// Trait for streaming (incremental) indicators.
/// Feed one value at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if ready).
    fn next(&mut self, value: f64) -> Option<f64>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of data points needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

/// Map position `index` of a series of `total_len` points onto an indicator
/// output of `output_len` values that ends at the same point.
///
/// Returns `None` while the indicator is still warming up at `index`.
pub fn aligned_offset(index: usize, output_len: usize, total_len: usize) -> Option<usize> {
    if index >= total_len || output_len > total_len {
        return None;
    }
    let warm_up = total_len - output_len;
    index.checked_sub(warm_up)
}

/// Look up the indicator value reported alongside series position `index`.
pub fn aligned<T: Clone>(output: &[T], index: usize, total_len: usize) -> Option<T> {
    aligned_offset(index, output.len(), total_len).and_then(|i| output.get(i).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_offset_warm_up() {
        // 5 points, SMA(3) yields 3 values starting at index 2
        assert_eq!(aligned_offset(0, 3, 5), None);
        assert_eq!(aligned_offset(1, 3, 5), None);
        assert_eq!(aligned_offset(2, 3, 5), Some(0));
        assert_eq!(aligned_offset(4, 3, 5), Some(2));
        assert_eq!(aligned_offset(5, 3, 5), None);
    }

    #[test]
    fn test_aligned_lookup_matches_window_end() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&prices, 3);
        assert_eq!(aligned(&out, 1, prices.len()), None);
        assert_eq!(aligned(&out, 2, prices.len()), Some(2.0));
        assert_eq!(aligned(&out, 4, prices.len()), Some(4.0));
    }

    #[test]
    fn test_aligned_empty_output() {
        let out: Vec<f64> = Vec::new();
        for i in 0..4 {
            assert_eq!(aligned(&out, i, 4), None);
        }
    }
}
