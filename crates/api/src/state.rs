use std::sync::Arc;
use tickwatch_core::Instrument;
use tickwatch_engine::Dispatcher;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Instruments quoted by the running tick source.
    pub instruments: Vec<Instrument>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, instruments: Vec<Instrument>) -> Self {
        Self {
            dispatcher,
            instruments,
        }
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }
}
