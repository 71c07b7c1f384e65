pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{http::ApiClient, storage::LocalStorage};
pub use app::pipelines::{InsightsPipeline, ReportSettings};
pub use crate::core::{
    engine::{collect_sources, InsightsEngine},
    export::export_rows,
    metrics::{compute_age_distribution, compute_location_distribution, compute_summary},
    normalizer::normalize,
    paginator::{sort_and_paginate, PageSizePolicy},
    tabulation::{summarize_form, tabulate_question},
    trend::{compute_trend, TrendBucketer},
};
pub use domain::credential::Credential;
pub use domain::model::*;
pub use utils::error::{InsightsError, Result};
