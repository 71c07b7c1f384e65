#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::core::trend::DEFAULT_TIMEZONE;
use crate::core::ConfigProvider;
use crate::utils::error::{InsightsError, Result};
use crate::utils::validation;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_PAGE_SIZE: usize = 500;
pub const MAX_TIMEOUT_SECONDS: u64 = 600;

pub(crate) fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Checks shared by every configuration source. Page indices are not checked;
/// out-of-range pages clamp when the list is paginated.
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validation::validate_url("api_base_url", config.api_base_url())?;
    validation::validate_path("output_path", config.output_path())?;
    validation::validate_timezone("timezone", config.timezone())?;
    validation::validate_range(
        "request_timeout_seconds",
        config.request_timeout_seconds(),
        1,
        MAX_TIMEOUT_SECONDS,
    )?;

    let policy = config.page_size_policy();
    validation::validate_range("page_size", policy.base, 1, MAX_PAGE_SIZE)?;
    validation::validate_range("expanded_page_size", policy.expanded, 1, MAX_PAGE_SIZE)?;

    if let crate::domain::model::Scope::Form(form_id) = config.scope() {
        validation::validate_non_empty_string("form_id", &form_id)?;
    }

    let credential = config
        .credential()
        .ok_or_else(|| InsightsError::MissingConfigError {
            field: "token".to_string(),
        })?;
    if credential.is_blank() {
        return Err(InsightsError::MissingConfigError {
            field: "token".to_string(),
        });
    }
    if credential.is_unresolved_placeholder() {
        return Err(InsightsError::ConfigValidationError {
            field: "token".to_string(),
            message: "environment placeholder was not resolved".to_string(),
        });
    }

    Ok(())
}
