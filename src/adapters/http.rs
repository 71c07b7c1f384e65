use crate::domain::credential::Credential;
use crate::domain::model::lenient::Records;
use crate::domain::model::{Answer, Form, Question, SourceKind};
use crate::domain::ports::SourceClient;
use crate::utils::error::{InsightsError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const API_PREFIX: [&str; 3] = ["api", "v1", "user"];
const MAX_ERROR_BODY: usize = 200;

/// The forms API wraps every payload as `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Bearer-authenticated client for the forms API.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credential: Credential,
}

impl ApiClient {
    pub fn new(base_url: &str, credential: Credential, timeout: Duration) -> Result<Self> {
        let base_url = validate_url("api_base_url", base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            credential,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }

    async fn get_data<T: DeserializeOwned>(&self, kind: SourceKind, url: Url) -> Result<Option<T>> {
        tracing::debug!("Fetching {} from: {}", kind, url);

        let response = self
            .client
            .get(url)
            .bearer_auth(self.credential.expose())
            .send()
            .await
            .map_err(|e| InsightsError::upstream(kind, e.to_string()))?;

        let status = response.status();
        tracing::debug!("{} response status: {}", kind, status);

        let body = response
            .text()
            .await
            .map_err(|e| InsightsError::upstream(kind, e.to_string()))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(InsightsError::upstream(
                kind,
                format!("HTTP {} {}", status, snippet).trim_end().to_string(),
            ));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| InsightsError::upstream(kind, format!("unparseable payload: {}", e)))?;
        Ok(envelope.data)
    }

    /// List payloads keep every element that parses; one bad record is skipped.
    async fn get_list<T: DeserializeOwned>(&self, kind: SourceKind, url: Url) -> Result<Vec<T>> {
        let data = match self.get_data::<Value>(kind, url).await? {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(data) => data,
        };
        let records = Records::from_value(data)
            .ok_or_else(|| InsightsError::upstream(kind, "expected a list payload"))?;
        if records.skipped > 0 {
            tracing::warn!("Skipped {} malformed {} records", records.skipped, kind);
        }
        Ok(records.items)
    }
}

#[async_trait]
impl SourceClient for ApiClient {
    async fn fetch_forms(&self) -> Result<Vec<Form>> {
        let url = self.endpoint(&["get-forms"]);
        self.get_list(SourceKind::Forms, url).await
    }

    async fn fetch_form(&self, form_id: &str) -> Result<Form> {
        let url = self.endpoint(&["get-singular-form", form_id]);
        self.get_data(SourceKind::Form, url)
            .await?
            .ok_or_else(|| InsightsError::upstream(SourceKind::Form, format!("form '{}' not found", form_id)))
    }

    async fn fetch_questions(&self, form_id: &str) -> Result<Vec<Question>> {
        let url = self.endpoint(&["get-questions", form_id]);
        self.get_list(SourceKind::Questions, url).await
    }

    async fn fetch_answers(&self, form_id: &str) -> Result<Vec<Answer>> {
        let url = self.endpoint(&["get-answers", form_id]);
        self.get_list(SourceKind::Answers, url).await
    }
}
