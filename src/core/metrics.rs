use crate::domain::model::{CategoryCount, CategoryDistribution, NormalizedResponse, TotalsSummary, UNKNOWN_LABEL};
use std::collections::HashMap;

/// Total, manually-filled and AI-filled counts.
///
/// The two flags are counted independently: a response may raise both
/// counters or neither, so `manual_count + ai_count` need not equal `total`.
pub fn compute_summary(responses: &[NormalizedResponse]) -> TotalsSummary {
    TotalsSummary {
        total: responses.len(),
        manual_count: responses.iter().filter(|r| r.manually_filled).count(),
        ai_count: responses.iter().filter(|r| r.ai_filled).count(),
    }
}

pub fn compute_location_distribution(responses: &[NormalizedResponse]) -> CategoryDistribution {
    count_by(responses.iter().map(|r| r.location.as_deref()))
}

pub fn compute_age_distribution(responses: &[NormalizedResponse]) -> CategoryDistribution {
    count_by(responses.iter().map(|r| r.age.as_deref()))
}

/// Counts labels in first-seen order. Absent or blank labels land in "Unknown".
pub fn count_by<'a, I>(labels: I) -> CategoryDistribution
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<CategoryCount> = Vec::new();

    for raw in labels {
        let label = match raw.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => UNKNOWN_LABEL,
        };
        match index.get(label) {
            Some(&slot) => entries[slot].count += 1,
            None => {
                index.insert(label.to_string(), entries.len());
                entries.push(CategoryCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    CategoryDistribution { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(location: Option<&str>, age: Option<&str>, manual: bool, ai: bool) -> NormalizedResponse {
        NormalizedResponse {
            location: location.map(str::to_string),
            age: age.map(str::to_string),
            manually_filled: manual,
            ai_filled: ai,
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_counts_flags_independently() {
        let responses = vec![
            response(None, None, true, false),
            response(None, None, false, true),
            response(None, None, true, true),
            response(None, None, false, false),
        ];

        let summary = compute_summary(&responses);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.manual_count, 2);
        assert_eq!(summary.ai_count, 2);
    }

    #[test]
    fn test_location_scenario() {
        let responses = vec![
            response(Some("Lagos"), None, false, false),
            response(Some("Lagos"), None, false, false),
            response(Some(""), None, false, false),
            response(Some("Abuja"), None, false, false),
        ];

        let locations = compute_location_distribution(&responses);

        let pairs: Vec<(&str, usize)> = locations
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.count))
            .collect();
        assert_eq!(pairs, vec![("Lagos", 2), ("Unknown", 1), ("Abuja", 1)]);
        assert_eq!(locations.total(), 4);
    }

    #[test]
    fn test_distributions_partition_total() {
        let responses = vec![
            response(Some("Lagos"), Some("18-24"), true, false),
            response(None, Some("25-34"), false, true),
            response(Some("  "), None, false, false),
            response(Some("Kano"), Some("18-24"), false, false),
            response(Some("Lagos "), Some(""), true, true),
        ];

        let total = compute_summary(&responses).total;
        let locations = compute_location_distribution(&responses);
        let ages = compute_age_distribution(&responses);

        assert_eq!(locations.total(), total);
        assert_eq!(ages.total(), total);
        assert_eq!(locations.get("Lagos"), Some(2));
        assert_eq!(locations.get("Unknown"), Some(2));
        assert_eq!(ages.get("Unknown"), Some(2));
        assert_eq!(ages.get("18-24"), Some(2));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compute_summary(&[]), TotalsSummary::default());
        assert!(compute_location_distribution(&[]).is_empty());
        assert!(compute_age_distribution(&[]).is_empty());
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let responses = vec![
            response(Some("Ibadan"), Some("35-44"), false, false),
            response(Some("Lagos"), Some("18-24"), false, false),
            response(Some("Ibadan"), None, false, false),
        ];
        assert_eq!(
            compute_location_distribution(&responses),
            compute_location_distribution(&responses)
        );
        assert_eq!(compute_age_distribution(&responses), compute_age_distribution(&responses));
    }
}
