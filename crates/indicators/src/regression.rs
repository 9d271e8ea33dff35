use serde::{Deserialize, Serialize};

/// Ordinary least squares fit of price against index position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    /// Fitted value at every index of the input series.
    pub fitted: Vec<f64>,
}

impl RegressionFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `price = slope * i + intercept` over `i = 0..len`.
///
/// Returns `None` for fewer than two prices, where the denominator would be
/// zero.
pub fn linear_regression(prices: &[f64]) -> Option<RegressionFit> {
    if prices.len() < 2 {
        return None;
    }
    let n = prices.len() as f64;

    let (sum_x, sum_y, sum_xy, sum_x2) = prices.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sx2 + x * x)
        },
    );

    let denominator = n * sum_x2 - sum_x * sum_x;
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mut fit = RegressionFit {
        slope,
        intercept,
        fitted: Vec::with_capacity(prices.len()),
    };
    fit.fitted = (0..prices.len()).map(|i| fit.predict(i as f64)).collect();
    Some(fit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_exact_line() {
        let prices: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * f64::from(i)).collect();
        let fit = linear_regression(&prices).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 3.0).abs() < 1e-9);
        for (f, p) in fit.fitted.iter().zip(prices.iter()) {
            assert!((f - p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_regression_two_points() {
        let fit = linear_regression(&[10.0, 14.0]).unwrap();
        assert_eq!(fit.slope, 4.0);
        assert_eq!(fit.intercept, 10.0);
        assert_eq!(fit.fitted, vec![10.0, 14.0]);
    }

    #[test]
    fn test_regression_needs_two_points() {
        assert!(linear_regression(&[]).is_none());
        assert!(linear_regression(&[42.0]).is_none());
    }

    #[test]
    fn test_regression_is_deterministic() {
        let prices = [100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0, 108.0];
        let a = linear_regression(&prices).unwrap();
        let b = linear_regression(&prices).unwrap();
        assert!((a.slope - b.slope).abs() < 1e-12);
        assert!((a.intercept - b.intercept).abs() < 1e-12);
        assert_eq!(a.fitted.len(), prices.len());
    }

    #[test]
    fn test_regression_flat_series() {
        let fit = linear_regression(&[7.0; 5]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 7.0);
    }
}
