use crate::core::normalizer::normalize;
use crate::core::Pipeline;
use crate::domain::model::{Scope, SourceCollections};
use crate::domain::ports::SourceClient;
use crate::utils::error::Result;

/// Fetches every collection a scope needs, concurrently.
///
/// Normalization must not see a partial view, so the first failure aborts the
/// whole collection and is returned as the single error.
pub async fn collect_sources<C: SourceClient + ?Sized>(
    client: &C,
    scope: &Scope,
) -> Result<SourceCollections> {
    match scope {
        Scope::AllForms => {
            let forms = client.fetch_forms().await?;
            Ok(SourceCollections {
                forms,
                ..Default::default()
            })
        }
        Scope::Form(form_id) => {
            let (form, questions, answers) = tokio::try_join!(
                client.fetch_form(form_id),
                client.fetch_questions(form_id),
                client.fetch_answers(form_id),
            )?;
            Ok(SourceCollections {
                forms: vec![form],
                questions,
                answers: Some(answers),
                responses: Vec::new(),
            })
        }
    }
}

pub struct InsightsEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> InsightsEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting insights run");

        let sources = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} forms, {} questions, {} answers",
            sources.forms.len(),
            sources.questions.len(),
            sources.answers.as_ref().map(Vec::len).unwrap_or(0)
        );

        let dataset = normalize(sources);
        tracing::info!("Normalized {} responses", dataset.responses.len());

        let report = self.pipeline.transform(dataset).await?;
        tracing::info!(
            "Computed report for {}: {} responses, {} trend buckets, {} questions",
            report.scope,
            report.totals.total,
            report.trend.points.len(),
            report.questions.len()
        );

        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Report saved to: {}", output_path);

        Ok(output_path)
    }
}
