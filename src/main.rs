use anyhow::Context;
use clap::Parser;
use form_insights::config::cli::LogFormat;
use form_insights::core::ConfigProvider;
use form_insights::utils::error::InsightsError;
use form_insights::utils::{logger, validation::Validate};
use form_insights::{ApiClient, CliConfig, InsightsEngine, InsightsPipeline, LocalStorage, ReportSettings, TomlConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting form-insights");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let outcome = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            run(&config).await
        }
        None => run(&cli).await,
    };

    match outcome {
        Ok(output_path) => {
            tracing::info!("Insights report completed");
            println!("Report saved to: {}", output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "Insights run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }
}

async fn run<C: ConfigProvider + Validate>(config: &C) -> Result<String, InsightsError> {
    config.validate()?;

    let credential = config
        .credential()
        .cloned()
        .ok_or_else(|| InsightsError::MissingConfigError {
            field: "token".to_string(),
        })?;

    let client = ApiClient::new(
        config.api_base_url(),
        credential,
        Duration::from_secs(config.request_timeout_seconds()),
    )?;
    let storage = LocalStorage::new(config.output_path().to_string());
    let settings = ReportSettings::from_config(config)?;

    tracing::info!(
        "Scope: {}, timezone: {}, output: {}",
        settings.scope,
        config.timezone(),
        settings.output_path
    );

    let engine = InsightsEngine::new(InsightsPipeline::new(storage, client, settings));
    engine.run().await
}
