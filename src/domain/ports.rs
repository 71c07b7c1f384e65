use crate::core::paginator::PageSizePolicy;
use crate::domain::credential::Credential;
use crate::domain::model::{
    Answer, Form, InsightsReport, NormalizedDataset, Question, Scope, SourceCollections,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Destination for report files, addressed by relative path.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn credential(&self) -> Option<&Credential>;
    fn output_path(&self) -> &str;
    fn scope(&self) -> Scope;
    fn timezone(&self) -> &str;
    fn page_index(&self) -> usize;
    fn page_size_policy(&self) -> PageSizePolicy;
    fn request_timeout_seconds(&self) -> u64;
}

/// Read-only access to the upstream forms API.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch_forms(&self) -> Result<Vec<Form>>;
    async fn fetch_form(&self, form_id: &str) -> Result<Form>;
    async fn fetch_questions(&self, form_id: &str) -> Result<Vec<Question>>;
    async fn fetch_answers(&self, form_id: &str) -> Result<Vec<Answer>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceCollections>;
    async fn transform(&self, data: NormalizedDataset) -> Result<InsightsReport>;
    async fn load(&self, report: InsightsReport) -> Result<String>;
}
