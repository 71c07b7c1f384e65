use crate::domain::model::{Answer, Form, NormalizedDataset, NormalizedResponse, Response, SourceCollections};
use std::collections::{HashMap, HashSet};

/// Reconciles forms, loose responses and answers into one response collection.
///
/// Every returned response carries its owning form's id and name, and an answer
/// list that is never absent. When `sources.answers` is present the answers are
/// joined on `responseId` and replace anything nested; otherwise nested answers
/// are kept as delivered. Records whose join target is missing are dropped and
/// counted in the dataset rather than failing the whole normalization.
pub fn normalize(sources: SourceCollections) -> NormalizedDataset {
    let SourceCollections {
        forms,
        questions,
        answers,
        responses: loose_responses,
    } = sources;

    let mut seen: HashSet<String> = HashSet::new();
    let mut dropped_responses = 0;
    let mut owned: Vec<(&Form, &Response)> = Vec::new();

    for form in &forms {
        dropped_responses += form.malformed_responses;
        for response in form.responses.iter().flatten() {
            if seen.insert(response.id.clone()) {
                owned.push((form, response));
            }
        }
    }

    let forms_by_id: HashMap<&str, &Form> = forms.iter().map(|f| (f.id.as_str(), f)).collect();
    for response in &loose_responses {
        match forms_by_id.get(response.form_id.as_str()) {
            Some(&form) => {
                if seen.insert(response.id.clone()) {
                    owned.push((form, response));
                }
            }
            None => {
                tracing::debug!(
                    "Dropping response {} for unknown form '{}'",
                    response.id,
                    response.form_id
                );
                dropped_responses += 1;
            }
        }
    }

    let (mut answers_by_response, skipped_answers) = match answers {
        Some(answers) => {
            let (grouped, skipped) = group_answers(answers);
            (Some(grouped), skipped)
        }
        None => (None, 0),
    };

    let normalized: Vec<NormalizedResponse> = owned
        .into_iter()
        .map(|(form, response)| {
            let answers = match answers_by_response.as_mut() {
                Some(grouped) => grouped.remove(response.id.as_str()).unwrap_or_default(),
                None => response.answers.clone().unwrap_or_default(),
            };
            NormalizedResponse {
                id: response.id.clone(),
                form_id: form.id.clone(),
                form_name: form.form_name.clone(),
                created_at: response.created_at.clone(),
                manually_filled: response.manually_filled,
                ai_filled: response.ai_filled,
                location: response.location.clone(),
                age: response.age.clone(),
                progress: response.progress.clone(),
                answers,
            }
        })
        .collect();

    // Whatever is left in the map references a response we never saw.
    let orphaned_answers: usize = answers_by_response
        .map(|rest| rest.values().map(Vec::len).sum())
        .unwrap_or(0);
    let dropped_answers = skipped_answers + orphaned_answers;

    if dropped_answers > 0 || dropped_responses > 0 {
        tracing::warn!(
            "Normalization dropped {} answers and {} responses with missing join targets",
            dropped_answers,
            dropped_responses
        );
    }
    tracing::debug!(
        "Normalized {} responses across {} forms",
        normalized.len(),
        forms.len()
    );

    NormalizedDataset {
        forms,
        questions,
        responses: normalized,
        dropped_answers,
        dropped_responses,
    }
}

/// Single pass over the answers, keyed by response id. Answers without a
/// response id are counted as skipped.
fn group_answers(answers: Vec<Answer>) -> (HashMap<String, Vec<Answer>>, usize) {
    let mut grouped: HashMap<String, Vec<Answer>> = HashMap::new();
    let mut skipped = 0;
    for answer in answers {
        match answer.response_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                grouped.entry(id.to_string()).or_default().push(answer);
            }
            _ => skipped += 1,
        }
    }
    (grouped, skipped)
}
