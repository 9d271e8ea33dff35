use crate::{
    aligned, bollinger, linear_regression, sma, BollingerBand, BollingerBands, Indicator,
    IndicatorConfig, Macd, MacdOutput, RegressionFit, Rsi, Sma,
};
use serde::{Deserialize, Serialize};

/// Latest value of every indicator for one price history.
///
/// `None` means the indicator's warm-up has not elapsed yet; that is the
/// normal state for a young series, not a fault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Number of prices the snapshot was computed from.
    pub history_len: usize,
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub bollinger: Option<BollingerBand>,
    pub macd: Option<MacdOutput>,
    pub regression: Option<RegressionFit>,
}

impl IndicatorSnapshot {
    /// Whether at least one indicator has finished warming up.
    pub fn has_values(&self) -> bool {
        self.sma.is_some()
            || self.rsi.is_some()
            || self.bollinger.is_some()
            || self.macd.is_some()
            || self.regression.is_some()
    }
}

/// Running indicator state for one price history.
///
/// Prices are fed once each; window sums and smoothed averages are carried
/// forward, so a new point costs O(period) instead of a full recompute.
/// Only the regression is refit over the whole history.
#[derive(Debug, Clone)]
pub struct IndicatorState {
    len: usize,
    macd_warm_up: usize,
    sma: Sma,
    rsi: Rsi,
    bands: BollingerBands,
    macd: Macd,
}

impl IndicatorState {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            len: 0,
            macd_warm_up: config.macd_warm_up(),
            sma: Sma::new(config.sma_period),
            rsi: Rsi::new(config.rsi_period),
            bands: BollingerBands::new(config.bollinger_period, config.bollinger_k),
            macd: Macd::new(config.macd_fast, config.macd_slow, config.macd_signal),
        }
    }

    /// Number of prices fed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, price: f64) {
        self.sma.next(price);
        self.rsi.next(price);
        self.bands.next_output(price);
        self.macd.next_output(price);
        self.len += 1;
    }

    /// Latest value of every indicator. `prices` is the history fed so far.
    pub fn snapshot(&self, prices: &[f64]) -> IndicatorSnapshot {
        // MACD waits until its signal line is a real EMA, not just the seed
        let macd = if self.len >= self.macd_warm_up {
            self.macd.output()
        } else {
            None
        };
        IndicatorSnapshot {
            history_len: self.len,
            sma: self.sma.value(),
            rsi: self.rsi.value(),
            bollinger: self.bands.output(),
            macd,
            regression: linear_regression(prices),
        }
    }
}

/// Indicator values that line up with one point of the price history,
/// as drawn on a chart overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub regression: Option<f64>,
}

/// Build one [`Overlay`] per price, each indicator looked up with
/// [`aligned`] so historical values sit against the right point.
pub fn overlays(prices: &[f64], config: &IndicatorConfig) -> Vec<Overlay> {
    let total = prices.len();
    let sma = sma(prices, config.sma_period);
    let ema = crate::ema(prices, config.ema_period);
    let bands = bollinger(prices, config.bollinger_period, config.bollinger_k);
    let fitted = linear_regression(prices)
        .map(|fit| fit.fitted)
        .unwrap_or_default();

    (0..total)
        .map(|i| {
            let band = aligned(&bands, i, total);
            Overlay {
                sma: aligned(&sma, i, total),
                ema: aligned(&ema, i, total),
                upper_band: band.map(|b| b.upper),
                lower_band: band.map(|b| b.lower),
                regression: aligned(&fitted, i, total),
            }
        })
        .collect()
}
