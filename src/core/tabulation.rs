use crate::domain::model::{
    NormalizedResponse, Question, QuestionKind, QuestionSummary, QuestionTabulation, TabulationEntry,
};
use std::collections::HashMap;

/// Label for an answer that exists but carries no text.
pub const NO_ANSWER_LABEL: &str = "No answer";

/// Frequency table of the distinct answer values given to `question`.
///
/// Each response contributes its first answer for the question, if any;
/// responses that skipped the question contribute nothing. Entries keep the
/// order in which values were first seen.
pub fn tabulate_question(question: &Question, responses: &[NormalizedResponse]) -> QuestionTabulation {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<TabulationEntry> = Vec::new();

    for answer in answers_for(question, responses) {
        let value = if answer.trim().is_empty() {
            NO_ANSWER_LABEL
        } else {
            answer
        };
        match index.get(value) {
            Some(&slot) => entries[slot].count += 1,
            None => {
                index.insert(value, entries.len());
                entries.push(TabulationEntry {
                    answer: value.to_string(),
                    label: display_label(question, value),
                    count: 1,
                });
            }
        }
    }

    QuestionTabulation {
        question_id: question.id.clone(),
        entries,
    }
}

/// One summary per question, in question order.
pub fn summarize_form(questions: &[Question], responses: &[NormalizedResponse]) -> Vec<QuestionSummary> {
    questions
        .iter()
        .map(|question| {
            let tabulation = tabulate_question(question, responses);
            let open_answers = match question.kind {
                QuestionKind::OpenEnded => answers_for(question, responses)
                    .filter(|v| !v.trim().is_empty())
                    .map(str::to_string)
                    .collect(),
                QuestionKind::Choice => Vec::new(),
            };
            QuestionSummary {
                question_id: question.id.clone(),
                text: question.text.clone(),
                kind: question.kind,
                answered: tabulation.total(),
                tabulation,
                open_answers,
            }
        })
        .collect()
}

fn answers_for<'a>(
    question: &'a Question,
    responses: &'a [NormalizedResponse],
) -> impl Iterator<Item = &'a str> + 'a {
    responses
        .iter()
        .filter_map(move |r| r.answer_for(&question.id))
        .map(|a| a.value.as_str())
}

fn display_label(question: &Question, value: &str) -> String {
    match question.kind {
        QuestionKind::Choice => question
            .option_for_value(value)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| value.to_string()),
        QuestionKind::OpenEnded => value.to_string(),
    }
}
