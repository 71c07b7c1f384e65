use crate::domain::model::SourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to fetch {kind}: {reason}")]
    UpstreamFetchFailure { kind: SourceKind, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a run that failed at this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl InsightsError {
    pub fn upstream(kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::UpstreamFetchFailure {
            kind,
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::UpstreamFetchFailure { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(_) | Self::UpstreamFetchFailure { .. } => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(_) => "Check network connectivity and the API base URL".to_string(),
            Self::UpstreamFetchFailure { kind, .. } => format!(
                "Verify the access token and that the {} endpoint is reachable, then retry",
                kind
            ),
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Review the configuration file syntax and values".to_string()
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            Self::MissingConfigError { field } => {
                format!("Provide '{}' via flag, environment or config file", field)
            }
            Self::IoError(_) => "Check that the output path is writable".to_string(),
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                "Inspect the upstream payload for unexpected shapes".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UpstreamFetchFailure { kind, .. } => {
                format!("Could not load {}; no partial report was produced", kind)
            }
            Self::MissingConfigError { field } => format!("Missing setting: {}", field),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
