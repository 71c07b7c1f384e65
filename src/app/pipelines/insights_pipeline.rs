use crate::core::engine::collect_sources;
use crate::core::export::export_rows;
use crate::core::metrics::{compute_age_distribution, compute_location_distribution, compute_summary};
use crate::core::paginator::{paginate, sort_forms, PageSizePolicy};
use crate::core::tabulation::summarize_form;
use crate::core::trend::TrendBucketer;
use crate::core::{ConfigProvider, InsightsReport, NormalizedDataset, Pipeline, SourceClient, SourceCollections, Storage};
use crate::domain::model::{CategoryDistribution, FormListPage, Scope};
use crate::utils::error::{InsightsError, Result};
use crate::utils::validation::validate_timezone;

pub const REPORT_FILE: &str = "insights.json";

/// Per-run report settings, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub scope: Scope,
    pub bucketer: TrendBucketer,
    pub page_index: usize,
    pub page_size_policy: PageSizePolicy,
    pub output_path: String,
}

impl ReportSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let tz = validate_timezone("timezone", config.timezone())?;
        Ok(Self {
            scope: config.scope(),
            bucketer: TrendBucketer::new(tz),
            page_index: config.page_index(),
            page_size_policy: config.page_size_policy(),
            output_path: config.output_path().to_string(),
        })
    }
}

pub struct InsightsPipeline<S: Storage, C: SourceClient> {
    storage: S,
    client: C,
    settings: ReportSettings,
}

impl<S: Storage, C: SourceClient> InsightsPipeline<S, C> {
    pub fn new(storage: S, client: C, settings: ReportSettings) -> Self {
        Self {
            storage,
            client,
            settings,
        }
    }

    async fn write_csv(&self, name: &str, header: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        let data = writer.into_inner().map_err(|e| InsightsError::ProcessingError {
            message: format!("Failed to flush {}: {}", name, e),
        })?;

        tracing::debug!("Writing {} ({} bytes) to storage", name, data.len());
        self.storage.write_file(name, &data).await
    }
}

fn distribution_rows(distribution: &CategoryDistribution) -> Vec<Vec<String>> {
    distribution
        .entries
        .iter()
        .map(|e| vec![e.label.clone(), e.count.to_string()])
        .collect()
}

#[async_trait::async_trait]
impl<S: Storage, C: SourceClient> Pipeline for InsightsPipeline<S, C> {
    async fn extract(&self) -> Result<SourceCollections> {
        tracing::info!("Collecting sources for {}", self.settings.scope);
        collect_sources(&self.client, &self.settings.scope).await
    }

    async fn transform(&self, data: NormalizedDataset) -> Result<InsightsReport> {
        let responses = &data.responses;
        let settings = &self.settings;

        let sorted = sort_forms(&data.forms);
        let page_size = settings.page_size_policy.page_size_for(sorted.len());
        let page = paginate(&sorted, settings.page_index, page_size);
        if page.page_index != settings.page_index {
            tracing::debug!(
                "Requested page {} clamped to {} of {}",
                settings.page_index,
                page.page_index,
                page.total_pages
            );
        }

        Ok(InsightsReport {
            scope: settings.scope.clone(),
            timezone: settings.bucketer.timezone().name().to_string(),
            totals: compute_summary(responses),
            locations: compute_location_distribution(responses),
            ages: compute_age_distribution(responses),
            trend: settings.bucketer.bucket(responses),
            forms: FormListPage::from(&page),
            questions: summarize_form(&data.questions, responses),
            rows: export_rows(responses, settings.bucketer.timezone()),
            dropped_answers: data.dropped_answers,
            dropped_responses: data.dropped_responses,
        })
    }

    async fn load(&self, report: InsightsReport) -> Result<String> {
        let output_path = format!("{}/{}", self.settings.output_path, REPORT_FILE);

        let json_data = serde_json::to_vec_pretty(&report)?;
        self.storage.write_file(REPORT_FILE, &json_data).await?;

        let trend_rows = report
            .trend
            .points
            .iter()
            .map(|p| vec![p.key.clone(), p.label.clone(), p.count.to_string()])
            .collect();
        self.write_csv("trend.csv", &["month", "label", "count"], trend_rows)
            .await?;
        self.write_csv("locations.csv", &["location", "count"], distribution_rows(&report.locations))
            .await?;
        self.write_csv("ages.csv", &["age", "count"], distribution_rows(&report.ages))
            .await?;

        if !report.questions.is_empty() {
            let question_rows = report
                .questions
                .iter()
                .flat_map(|q| {
                    q.tabulation.entries.iter().map(move |e| {
                        vec![
                            q.question_id.clone(),
                            q.text.clone(),
                            e.answer.clone(),
                            e.label.clone(),
                            e.count.to_string(),
                        ]
                    })
                })
                .collect();
            self.write_csv(
                "questions.csv",
                &["question_id", "question", "answer", "label", "count"],
                question_rows,
            )
            .await?;
        }

        tracing::info!("Report files saved under {}", self.settings.output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::normalize;
    use crate::domain::model::{Answer, Form, Question, QuestionKind, Response};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct StaticSource;

    #[async_trait]
    impl SourceClient for StaticSource {
        async fn fetch_forms(&self) -> Result<Vec<Form>> {
            Ok(vec![survey_form()])
        }

        async fn fetch_form(&self, _form_id: &str) -> Result<Form> {
            Ok(survey_form())
        }

        async fn fetch_questions(&self, _form_id: &str) -> Result<Vec<Question>> {
            Ok(vec![Question {
                id: "q1".to_string(),
                form_id: "f1".to_string(),
                text: "How often do you dine out?".to_string(),
                kind: QuestionKind::Choice,
                options: vec![],
            }])
        }

        async fn fetch_answers(&self, _form_id: &str) -> Result<Vec<Answer>> {
            Ok(vec![
                answer("a1", "r1", "Always"),
                answer("a2", "r2", "Always"),
                answer("a3", "r3", "Rarely"),
            ])
        }
    }

    fn answer(id: &str, response_id: &str, value: &str) -> Answer {
        Answer {
            id: id.to_string(),
            response_id: Some(response_id.to_string()),
            question_id: "q1".to_string(),
            value: value.to_string(),
        }
    }

    fn survey_form() -> Form {
        let responses = [
            ("r1", Some("2025-08-01"), Some("Lagos"), true),
            ("r2", Some("2025-08-15"), Some("Lagos"), false),
            ("r3", Some("2025-09-02"), None, false),
            ("r4", None, Some("Abuja"), true),
        ]
        .into_iter()
        .map(|(id, created_at, location, manual)| Response {
            id: id.to_string(),
            form_id: "f1".to_string(),
            created_at: created_at.map(str::to_string),
            location: location.map(str::to_string),
            manually_filled: manual,
            ai_filled: !manual,
            ..Default::default()
        })
        .collect();

        Form {
            id: "f1".to_string(),
            form_name: "Dining Survey".to_string(),
            updated_at: Some("2025-09-03T12:00:00Z".to_string()),
            responses: Some(responses),
            ..Default::default()
        }
    }

    fn settings(scope: Scope) -> ReportSettings {
        ReportSettings {
            scope,
            bucketer: TrendBucketer::default(),
            page_index: 1,
            page_size_policy: PageSizePolicy::default(),
            output_path: "test_output".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transform_builds_form_report() {
        let pipeline = InsightsPipeline::new(
            MockStorage::new(),
            StaticSource,
            settings(Scope::Form("f1".to_string())),
        );

        let sources = pipeline.extract().await.unwrap();
        let report = pipeline.transform(normalize(sources)).await.unwrap();

        assert_eq!(report.totals.total, 4);
        assert_eq!(report.totals.manual_count, 2);
        assert_eq!(report.totals.ai_count, 2);
        assert_eq!(report.locations.get("Lagos"), Some(2));
        assert_eq!(report.locations.get("Unknown"), Some(1));
        assert_eq!(
            report.trend.labels_and_counts(),
            vec![("Aug 2025", 2), ("Sep 2025", 1), ("Unknown", 1)]
        );
        assert_eq!(report.questions.len(), 1);
        assert_eq!(
            report.questions[0].tabulation.pairs(),
            vec![("Always", 2), ("Rarely", 1)]
        );
        assert_eq!(report.forms.items[0].response_count, 4);
        assert_eq!(report.timezone, "Africa/Lagos");
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.rows[0].date, "2025-08-01 01:00");
        assert_eq!(report.rows[0].mode, "Manual");
        assert_eq!(report.rows[3].date, "N/A");
    }

    #[tokio::test]
    async fn test_all_forms_report_has_no_questions() {
        let pipeline =
            InsightsPipeline::new(MockStorage::new(), StaticSource, settings(Scope::AllForms));

        let sources = pipeline.extract().await.unwrap();
        let report = pipeline.transform(normalize(sources)).await.unwrap();

        assert_eq!(report.totals.total, 4);
        assert!(report.questions.is_empty());
        assert_eq!(report.forms.total_items, 1);
    }

    #[tokio::test]
    async fn test_load_writes_report_and_tables() {
        let storage = MockStorage::new();
        let pipeline = InsightsPipeline::new(
            storage.clone(),
            StaticSource,
            settings(Scope::Form("f1".to_string())),
        );

        let sources = pipeline.extract().await.unwrap();
        let report = pipeline.transform(normalize(sources)).await.unwrap();
        let output_path = pipeline.load(report).await.unwrap();

        assert_eq!(output_path, "test_output/insights.json");

        let json = storage.get_file("insights.json").await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["totals"]["total"], 4);
        assert_eq!(value["scope"]["formId"], "f1");

        let trend = String::from_utf8(storage.get_file("trend.csv").await.unwrap()).unwrap();
        let lines: Vec<&str> = trend.lines().collect();
        assert_eq!(lines[0], "month,label,count");
        assert_eq!(lines[1], "2025-08,Aug 2025,2");
        assert_eq!(lines[3], "Unknown,Unknown,1");

        let questions = String::from_utf8(storage.get_file("questions.csv").await.unwrap()).unwrap();
        assert!(questions.contains("q1,How often do you dine out?,Always,Always,2"));
        assert!(storage.get_file("locations.csv").await.is_some());
        assert!(storage.get_file("ages.csv").await.is_some());
    }

    #[tokio::test]
    async fn test_load_skips_questions_table_without_questions() {
        let storage = MockStorage::new();
        let pipeline =
            InsightsPipeline::new(storage.clone(), StaticSource, settings(Scope::AllForms));

        let sources = pipeline.extract().await.unwrap();
        let report = pipeline.transform(normalize(sources)).await.unwrap();
        pipeline.load(report).await.unwrap();

        assert!(storage.get_file("questions.csv").await.is_none());
    }
}
