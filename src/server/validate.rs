use super::error::AppError;
use crate::spotify::endpoints::TimeRange;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;
pub const MIN_QUERY_CHARS: usize = 2;
const MAX_TRACK_ID_LEN: usize = 64;

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

pub fn search_query(raw: Option<&str>) -> Result<String, AppError> {
    let query = raw.map(str::trim).unwrap_or_default();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(invalid(format!(
            "Search query must be at least {} characters",
            MIN_QUERY_CHARS
        )));
    }
    Ok(query.to_string())
}

pub fn limit(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_LIMIT);
    };
    match raw.parse::<u32>() {
        Ok(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
        _ => Err(invalid(format!(
            "limit must be a number between 1 and {}",
            MAX_LIMIT
        ))),
    }
}

/// two letter country code, uppercased
pub fn market(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if raw.len() != 2 || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("market must be a two letter country code"));
    }
    Ok(Some(raw.to_ascii_uppercase()))
}

pub fn track_id(raw: &str) -> Result<&str, AppError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(invalid("Track id is required"));
    }
    if id.len() > MAX_TRACK_ID_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("Track id must be alphanumeric"));
    }
    Ok(id)
}

pub fn time_range(raw: Option<&str>) -> Result<TimeRange, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse().map_err(invalid),
        None => Ok(TimeRange::default()),
    }
}

/// ?force=true / ?force=1
pub fn flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}
