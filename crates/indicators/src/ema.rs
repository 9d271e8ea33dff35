use crate::Indicator;

fn multiplier(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Exponential Moving Average seeded with the first price.
///
/// Produces one value per input, with no warm-up truncation.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let k = multiplier(period);
    let mut out = Vec::with_capacity(prices.len());
    for &price in prices {
        let value = match out.last() {
            None => price,
            Some(&prev) => price * k + prev * (1.0 - k),
        };
        out.push(value);
    }
    out
}

/// Exponential Moving Average (EMA), streaming form.
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: f64,
    current: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            len: period,
            multiplier: multiplier(period),
            current: None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.current
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: f64) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let ema = match self.current {
            None => value,
            Some(prev) => value * self.multiplier + prev * (1.0 - self.multiplier),
        };
        self.current = Some(ema);
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}
