use crate::utils::error::{InsightsError, Result};
use chrono_tz::Tz;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> InsightsError {
    InsightsError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// An http(s) URL that request paths can be appended to.
pub fn validate_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("Invalid URL format: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field,
            raw,
            format!("Unsupported URL scheme: {}", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(invalid(field, raw, "URL cannot carry a path"));
    }
    Ok(url)
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_timezone(field: &str, name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| invalid(field, name, "Unknown IANA timezone"))
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
