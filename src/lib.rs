pub mod config;
pub mod decision;
pub mod detector;
pub mod distance;
pub mod error;
pub mod histogram;
pub mod mercator;
pub mod model;
pub mod notify;
pub mod palette;
pub mod provider;
pub mod region;
pub mod state;
pub mod time_bucket;

pub use config::DetectorConfig;
pub use decision::{Decision, Outcome, StateTransition};
pub use detector::{RainDetector, RunSummary};
pub use error::{RainError, Result};
pub use model::{GeoPoint, PixelGrid, Rgb, TileIndex};
pub use provider::{JmaTileProvider, TileProvider};
pub use state::{FileStateStore, MemoryStateStore, StateStore};
pub use time_bucket::TimeBucket;
