pub mod insights_pipeline;

pub use insights_pipeline::{InsightsPipeline, ReportSettings};
