use crate::Indicator;

/// Turn average gain/loss into an RSI value.
///
/// Zero average loss saturates at 100 before any division happens.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

fn split(delta: f64) -> (f64, f64) {
    if delta >= 0.0 {
        (delta, 0.0)
    } else {
        (0.0, -delta)
    }
}

/// Relative Strength Index with Wilder's smoothing.
///
/// The first value lines up with `prices[period]`; the output is empty
/// until at least `period + 1` prices exist.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period + 1 {
        return Vec::new();
    }

    let deltas: Vec<(f64, f64)> = prices.windows(2).map(|w| split(w[1] - w[0])).collect();
    let n = period as f64;

    let (seed_gain, seed_loss) = deltas[..period]
        .iter()
        .fold((0.0, 0.0), |(g, l), (dg, dl)| (g + dg, l + dl));
    let mut avg_gain = seed_gain / n;
    let mut avg_loss = seed_loss / n;

    let mut out = Vec::with_capacity(prices.len() - period);
    out.push(rsi_value(avg_gain, avg_loss));
    for &(gain, loss) in &deltas[period..] {
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        out.push(rsi_value(avg_gain, avg_loss));
    }
    out
}

/// Relative Strength Index (RSI), streaming form.
/// Carries average gain/loss forward instead of recomputing.
#[derive(Debug, Clone)]
pub struct Rsi {
    len: usize,
    prev_value: Option<f64>,
    seed_gain: f64,
    seed_loss: f64,
    avg_gain: Option<f64>,
    avg_loss: Option<f64>,
    count: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            len: period,
            prev_value: None,
            seed_gain: 0.0,
            seed_loss: 0.0,
            avg_gain: None,
            avg_loss: None,
            count: 0,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match (self.avg_gain, self.avg_loss) {
            (Some(ag), Some(al)) => Some(rsi_value(ag, al)),
            _ => None,
        }
    }
}

impl Indicator for Rsi {
    fn next(&mut self, value: f64) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        if let Some(prev) = self.prev_value {
            let (gain, loss) = split(value - prev);
            self.count += 1;
            let n = self.len as f64;

            match (self.avg_gain, self.avg_loss) {
                (Some(ag), Some(al)) => {
                    // Wilder's smoothing
                    self.avg_gain = Some((ag * (n - 1.0) + gain) / n);
                    self.avg_loss = Some((al * (n - 1.0) + loss) / n);
                }
                _ => {
                    self.seed_gain += gain;
                    self.seed_loss += loss;
                    if self.count >= self.len {
                        self.avg_gain = Some(self.seed_gain / n);
                        self.avg_loss = Some(self.seed_loss / n);
                    }
                }
            }
        }

        self.prev_value = Some(value);
        self.value()
    }

    fn reset(&mut self) {
        self.prev_value = None;
        self.seed_gain = 0.0;
        self.seed_loss = 0.0;
        self.avg_gain = None;
        self.avg_loss = None;
        self.count = 0;
    }

    fn period(&self) -> usize {
        self.len + 1 // need one extra data point for the first change
    }

    fn is_ready(&self) -> bool {
        self.avg_gain.is_some()
    }
}
