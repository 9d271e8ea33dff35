pub mod alerts;
pub mod cache;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod series;

pub use alerts::AlertRegistry;
pub use cache::IndicatorCache;
pub use dispatcher::{DispatchError, Dispatcher, Subscription};
pub use engine::Engine;
pub use error::{EngineError, PointRejection};
pub use series::{PriceSeries, SeriesStore};
