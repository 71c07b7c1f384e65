use crate::config::{validate_provider, DEFAULT_API_BASE_URL, DEFAULT_OUTPUT_PATH};
use crate::core::paginator::PageSizePolicy;
use crate::core::trend::DEFAULT_TIMEZONE;
use crate::core::ConfigProvider;
use crate::domain::credential::Credential;
use crate::domain::model::Scope;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "form-insights")]
#[command(about = "Compute dashboard analytics for form responses")]
pub struct CliConfig {
    #[arg(long, env = "FORM_INSIGHTS_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    #[arg(long, env = "FORM_INSIGHTS_TOKEN", hide_env_values = true, value_parser = Credential::parse)]
    pub token: Option<Credential>,

    /// Restrict the report to one form and tabulate its questions
    #[arg(long)]
    pub form_id: Option<String>,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    /// IANA zone used for month buckets
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Fixed page size; the list grows its page size past 50 forms when unset
    #[arg(long)]
    pub page_size: Option<usize>,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    /// Load settings from a TOML file instead of flags
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn credential(&self) -> Option<&Credential> {
        self.token.as_ref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn scope(&self) -> Scope {
        match &self.form_id {
            Some(id) => Scope::Form(id.clone()),
            None => Scope::AllForms,
        }
    }

    fn timezone(&self) -> &str {
        &self.timezone
    }

    fn page_index(&self) -> usize {
        self.page
    }

    fn page_size_policy(&self) -> PageSizePolicy {
        self.page_size
            .map(PageSizePolicy::fixed)
            .unwrap_or_default()
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
