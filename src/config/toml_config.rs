use crate::config::{default_timezone, validate_provider, DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT_SECONDS};
use crate::core::paginator::{PageSizePolicy, DEFAULT_EXPANDED_PAGE_SIZE, DEFAULT_EXPAND_THRESHOLD, DEFAULT_PAGE_SIZE};
use crate::core::ConfigProvider;
use crate::domain::credential::Credential;
use crate::domain::model::Scope;
use crate::utils::error::{InsightsError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub token: Option<Credential>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeConfig {
    pub form_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub expanded_page_size: Option<usize>,
    pub expand_threshold: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            page: None,
            page_size: None,
            expanded_page_size: None,
            expand_threshold: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

fn env_placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"))
}

impl TomlConfig {
    /// Reads and parses a config file; see [`TomlConfig::from_toml_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(InsightsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses after substituting `${VAR}` placeholders from the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| InsightsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Unset variables are left in place so validation can name them.
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base_url(&self) -> &str {
        &self.source.base_url
    }

    fn credential(&self) -> Option<&Credential> {
        self.source.token.as_ref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn scope(&self) -> Scope {
        match &self.scope.form_id {
            Some(id) => Scope::Form(id.clone()),
            None => Scope::AllForms,
        }
    }

    fn timezone(&self) -> &str {
        &self.report.timezone
    }

    fn page_index(&self) -> usize {
        self.report.page.unwrap_or(1)
    }

    /// A lone `page_size` is fixed, as with `--page-size`; growth past the
    /// threshold needs `expanded_page_size` or `expand_threshold`.
    fn page_size_policy(&self) -> PageSizePolicy {
        let report = &self.report;
        match (report.page_size, report.expanded_page_size, report.expand_threshold) {
            (Some(size), None, None) => PageSizePolicy::fixed(size),
            (base, expanded, threshold) => {
                let base = base.unwrap_or(DEFAULT_PAGE_SIZE);
                PageSizePolicy {
                    base,
                    expanded: expanded.unwrap_or(DEFAULT_EXPANDED_PAGE_SIZE.max(base)),
                    threshold: threshold.unwrap_or(DEFAULT_EXPAND_THRESHOLD),
                }
            }
        }
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
