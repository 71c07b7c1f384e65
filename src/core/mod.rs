pub mod engine;
pub mod export;
pub mod metrics;
pub mod normalizer;
pub mod paginator;
pub mod tabulation;
pub mod trend;

pub use crate::domain::model::{InsightsReport, NormalizedDataset, SourceCollections};
pub use crate::domain::ports::{ConfigProvider, Pipeline, SourceClient, Storage};
pub use crate::utils::error::Result;
