use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickwatch_core::*;

/// Random-walk price feed for demos and tests.
///
/// Every batch moves each instrument by a uniform factor in
/// `[-volatility, +volatility]` and quotes the result rounded to cents.
pub struct SimulatedTickSource {
    instruments: Vec<Instrument>,
    /// Unrounded walk state, one per instrument.
    prices: Vec<f64>,
    volatility: f64,
    rng: StdRng,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SimulatedTickSource {
    pub fn new(instruments: Vec<Instrument>, volatility: f64) -> Self {
        Self::with_rng(instruments, volatility, StdRng::from_os_rng())
    }

    /// A reproducible feed.
    pub fn with_seed(instruments: Vec<Instrument>, volatility: f64, seed: u64) -> Self {
        Self::with_rng(instruments, volatility, StdRng::seed_from_u64(seed))
    }

    fn with_rng(instruments: Vec<Instrument>, volatility: f64, rng: StdRng) -> Self {
        let prices = instruments.iter().map(|i| i.base_price).collect();
        Self {
            instruments,
            prices,
            volatility: volatility.abs(),
            rng,
            last_timestamp: None,
        }
    }

    fn step(&mut self, index: usize) -> f64 {
        let factor = if self.volatility > 0.0 {
            self.rng.random_range(-self.volatility..=self.volatility)
        } else {
            0.0
        };
        let next = (self.prices[index] * (1.0 + factor)).max(0.0);
        self.prices[index] = next;
        (next * 100.0).round() / 100.0
    }

    /// Stamp for the next batch; never earlier than the previous one.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[async_trait]
impl TickSource for SimulatedTickSource {
    fn instruments(&self) -> Vec<Instrument> {
        self.instruments.clone()
    }

    async fn next_batch(&mut self) -> Result<Vec<Tick>, SourceError> {
        let timestamp = self.next_timestamp();
        let batch = (0..self.instruments.len())
            .map(|i| {
                let price = self.step(i);
                Tick::new(&self.instruments[i].symbol, price, timestamp)
            })
            .collect();
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_covers_catalogue() {
        let mut source = SimulatedTickSource::with_seed(Instrument::default_catalogue(), 0.02, 1);
        let batch = source.next_batch().await.unwrap();
        let symbols: Vec<&str> = batch.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "CAC40", "SP500"]);
        assert!(batch.iter().all(|t| t.timestamp == batch[0].timestamp));
    }

    #[tokio::test]
    async fn test_moves_stay_within_volatility() {
        let btc = vec![Instrument::new("BTC", "Bitcoin", 30_000.0)];
        let mut source = SimulatedTickSource::with_seed(btc, 0.02, 7);
        let mut prev = 30_000.0;
        for _ in 0..50 {
            let tick = source.next_batch().await.unwrap().remove(0);
            // rounding to cents can add at most half a cent
            assert!((tick.price - prev).abs() <= prev * 0.02 + 0.01);
            assert!(tick.price.is_finite() && tick.price >= 0.0);
            prev = source.prices[0];
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_walk() {
        let mut a = SimulatedTickSource::with_seed(Instrument::default_catalogue(), 0.02, 42);
        let mut b = SimulatedTickSource::with_seed(Instrument::default_catalogue(), 0.02, 42);
        for _ in 0..5 {
            let pa: Vec<f64> = a.next_batch().await.unwrap().iter().map(|t| t.price).collect();
            let pb: Vec<f64> = b.next_batch().await.unwrap().iter().map(|t| t.price).collect();
            assert_eq!(pa, pb);
        }
    }

    #[tokio::test]
    async fn test_zero_volatility_is_flat() {
        let sp500 = vec![Instrument::new("SP500", "S&P 500", 4_000.0)];
        let mut source = SimulatedTickSource::with_seed(sp500, 0.0, 3);
        for _ in 0..3 {
            assert_eq!(source.next_batch().await.unwrap()[0].price, 4_000.0);
        }
    }

    #[tokio::test]
    async fn test_timestamps_never_go_back() {
        let mut source = SimulatedTickSource::with_seed(Instrument::default_catalogue(), 0.02, 9);
        let mut last = None;
        for _ in 0..10 {
            let ts = source.next_batch().await.unwrap()[0].timestamp;
            if let Some(prev) = last {
                assert!(ts >= prev);
            }
            last = Some(ts);
        }
    }
}
