use crate::core::trend::parse_timestamp;
use crate::domain::model::{ExportRow, NormalizedResponse};
use chrono_tz::Tz;

const NOT_AVAILABLE: &str = "N/A";

/// Flat per-response rows handed to a spreadsheet writer.
pub fn export_rows(responses: &[NormalizedResponse], tz: Tz) -> Vec<ExportRow> {
    responses.iter().map(|r| export_row(r, tz)).collect()
}

fn export_row(response: &NormalizedResponse, tz: Tz) -> ExportRow {
    let date = response
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string());

    let mode = if response.manually_filled {
        "Manual"
    } else if response.ai_filled {
        "AI"
    } else {
        NOT_AVAILABLE
    };

    ExportRow {
        location: or_na(response.location.as_deref()),
        age: or_na(response.age.as_deref()),
        date: date.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        mode: mode.to_string(),
        progress: or_na(response.progress.as_deref()),
    }
}

fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_row_fallbacks_and_mode() {
        let responses = vec![
            NormalizedResponse {
                location: Some("Lagos".to_string()),
                age: Some("18-24".to_string()),
                created_at: Some("2025-08-01T09:30:00Z".to_string()),
                manually_filled: true,
                ai_filled: true,
                progress: Some("100".to_string()),
                ..Default::default()
            },
            NormalizedResponse {
                ai_filled: true,
                created_at: Some("yesterday".to_string()),
                ..Default::default()
            },
            NormalizedResponse::default(),
        ];

        let rows = export_rows(&responses, chrono_tz::Africa::Lagos);

        assert_eq!(rows[0].date, "2025-08-01 10:30");
        assert_eq!(rows[0].mode, "Manual");
        assert_eq!(rows[0].progress, "100");
        assert_eq!(rows[1].mode, "AI");
        assert_eq!(rows[1].date, "N/A");
        assert_eq!(rows[1].location, "N/A");
        assert_eq!(rows[2].mode, "N/A");
        assert_eq!(rows[2].age, "N/A");
    }
}
