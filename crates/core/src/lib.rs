pub mod config;
pub mod events;
pub mod models;
pub mod traits;

pub use config::*;
pub use events::*;
pub use models::*;
pub use traits::*;
pub use tickwatch_indicators::IndicatorSnapshot;
