use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for any bucket whose key is missing, empty or unparseable.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawForm", rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub form_name: String,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub response_count: Option<u64>,
    pub responses: Option<Vec<Response>>,
    /// Nested entries that could not be read as a response.
    #[serde(skip)]
    pub malformed_responses: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawForm {
    #[serde(deserialize_with = "lenient::id")]
    id: String,
    #[serde(default, alias = "title", deserialize_with = "lenient::text")]
    form_name: String,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    response_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_records")]
    responses: Option<lenient::Records<Response>>,
}

impl From<RawForm> for Form {
    fn from(raw: RawForm) -> Self {
        let (responses, malformed_responses) = match raw.responses {
            Some(records) => (Some(records.items), records.skipped),
            None => (None, 0),
        };
        Form {
            id: raw.id,
            form_name: raw.form_name,
            updated_at: raw.updated_at,
            created_at: raw.created_at,
            response_count: raw.response_count,
            responses,
            malformed_responses,
        }
    }
}

impl Form {
    /// Embedded count when the API sent one, otherwise the nested responses.
    pub fn resolved_response_count(&self) -> u64 {
        self.response_count.unwrap_or_else(|| {
            self.responses
                .as_ref()
                .map(|r| r.len() as u64)
                .unwrap_or(0)
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    OpenEnded,
    Choice,
}

impl From<Option<String>> for QuestionKind {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("choice") | Some("radio") | Some("checkbox") | Some("select")
            | Some("dropdown") | Some("multiple_choice") | Some("single_choice") => {
                QuestionKind::Choice
            }
            _ => QuestionKind::OpenEnded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
    pub value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Text(String),
    Full {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        value: Option<String>,
    },
}

impl From<RawOption> for QuestionOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Text(text) => QuestionOption {
                id: text.clone(),
                label: text.clone(),
                value: text,
            },
            RawOption::Full { id, label, value } => {
                let value = value.or_else(|| label.clone()).unwrap_or_default();
                let label = label.unwrap_or_else(|| value.clone());
                QuestionOption {
                    id: id.unwrap_or_else(|| value.clone()),
                    label,
                    value,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub form_id: String,
    #[serde(default, alias = "label", deserialize_with = "lenient::text")]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, deserialize_with = "lenient::list")]
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn option_for_value(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub form_id: String,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub manually_filled: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub ai_filled: bool,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub progress: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_list")]
    pub answers: Option<Vec<Answer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub response_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub question_id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub value: String,
}

/// A response after normalization: owning form resolved, answers always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    pub id: String,
    pub form_id: String,
    pub form_name: String,
    pub created_at: Option<String>,
    pub manually_filled: bool,
    pub ai_filled: bool,
    pub location: Option<String>,
    pub age: Option<String>,
    pub progress: Option<String>,
    pub answers: Vec<Answer>,
}

impl NormalizedResponse {
    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }
}

/// Which upstream collection a fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Forms,
    Form,
    Questions,
    Answers,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Forms => "forms",
            SourceKind::Form => "form",
            SourceKind::Questions => "questions",
            SourceKind::Answers => "answers",
        };
        f.write_str(name)
    }
}

/// Responses considered by one derivation: every form of the account, or one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "formId", rename_all = "snake_case")]
pub enum Scope {
    AllForms,
    Form(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::AllForms => f.write_str("all forms"),
            Scope::Form(id) => write!(f, "form {}", id),
        }
    }
}

/// Raw collections as delivered by the source, before any joins.
#[derive(Debug, Clone, Default)]
pub struct SourceCollections {
    pub forms: Vec<Form>,
    pub questions: Vec<Question>,
    /// `None` when the scope does not fetch answers separately.
    pub answers: Option<Vec<Answer>>,
    /// Responses delivered outside their form.
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedDataset {
    pub forms: Vec<Form>,
    pub questions: Vec<Question>,
    pub responses: Vec<NormalizedResponse>,
    pub dropped_answers: usize,
    pub dropped_responses: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSummary {
    pub total: usize,
    pub manual_count: usize,
    pub ai_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryDistribution {
    pub entries: Vec<CategoryCount>,
}

impl CategoryDistribution {
    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// `YYYY-MM`, or `Unknown`.
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn labels_and_counts(&self) -> Vec<(&str, usize)> {
        self.points
            .iter()
            .map(|p| (p.label.as_str(), p.count))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabulationEntry {
    pub answer: String,
    /// Option label for choice questions, the raw answer otherwise.
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTabulation {
    pub question_id: String,
    pub entries: Vec<TabulationEntry>,
}

impl QuestionTabulation {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pairs(&self) -> Vec<(&str, usize)> {
        self.entries
            .iter()
            .map(|e| (e.answer.as_str(), e.count))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub question_id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub answered: usize,
    pub tabulation: QuestionTabulation,
    /// Raw answers in response order; only filled for open-ended questions.
    pub open_answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPage {
    pub items: Vec<Form>,
    /// 1-based, after clamping.
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormListItem {
    pub id: String,
    pub form_name: String,
    pub updated_at: Option<String>,
    pub response_count: u64,
}

impl From<&Form> for FormListItem {
    fn from(form: &Form) -> Self {
        FormListItem {
            id: form.id.clone(),
            form_name: form.form_name.clone(),
            updated_at: form.updated_at.clone(),
            response_count: form.resolved_response_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormListPage {
    pub items: Vec<FormListItem>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl From<&FormPage> for FormListPage {
    fn from(page: &FormPage) -> Self {
        FormListPage {
            items: page.items.iter().map(FormListItem::from).collect(),
            page_index: page.page_index,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_items: page.total_items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportRow {
    pub location: String,
    pub age: String,
    pub date: String,
    pub mode: String,
    pub progress: String,
}

/// Everything a dashboard needs for one scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    pub scope: Scope,
    pub timezone: String,
    pub totals: TotalsSummary,
    pub locations: CategoryDistribution,
    pub ages: CategoryDistribution,
    pub trend: TrendSeries,
    pub forms: FormListPage,
    pub questions: Vec<QuestionSummary>,
    /// Flat per-response rows for downstream export.
    pub rows: Vec<ExportRow>,
    pub dropped_answers: usize,
    pub dropped_responses: usize,
}

/// Deserializers that degrade odd field shapes instead of rejecting the record.
pub(crate) mod lenient {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Array elements that parsed, and how many did not.
    #[derive(Debug)]
    pub struct Records<T> {
        pub items: Vec<T>,
        pub skipped: usize,
    }

    impl<T: DeserializeOwned> Records<T> {
        /// `None` unless the value is an array.
        pub fn from_value(value: Value) -> Option<Self> {
            let Value::Array(values) = value else {
                return None;
            };
            let mut records = Records {
                items: Vec::with_capacity(values.len()),
                skipped: 0,
            };
            for value in values {
                match serde_json::from_value(value) {
                    Ok(item) => records.items.push(item),
                    Err(e) => {
                        tracing::debug!("Skipping malformed record: {}", e);
                        records.skipped += 1;
                    }
                }
            }
            Some(records)
        }
    }

    fn stringify(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Array(items) => {
                let parts: Vec<String> = items.into_iter().filter_map(stringify).collect();
                Some(parts.join(", "))
            }
            Value::Object(_) => None,
        }
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(stringify(Value::deserialize(d)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(stringify(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_i64().map(|n| n != 0).unwrap_or(false),
            _ => false,
        })
    }

    /// Record identifiers must be present; numbers are accepted as text.
    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match stringify(Value::deserialize(d)?) {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(D::Error::custom("record id is missing or empty")),
        }
    }

    /// Numbers are epoch milliseconds and come out as RFC 3339 text.
    pub fn opt_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            other => stringify(other),
        })
    }

    pub fn opt_records<'de, D, T>(d: D) -> Result<Option<Records<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(Records::from_value(Value::deserialize(d)?))
    }

    pub fn opt_list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(opt_records(d)?.map(|records: Records<T>| records.items))
    }

    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(opt_list(d)?.unwrap_or_default())
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }
}
