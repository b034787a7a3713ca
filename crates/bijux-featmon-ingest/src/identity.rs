// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use url::Url;

/// Canonical form of a URL or absolute path used as a natural key.
///
/// Scheme and host are lowercased, the fragment is dropped, and a trailing `/`
/// is removed. Relative paths are refused: they cannot prove identity.
pub fn canonicalize_url_or_path(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("url_or_path is blank".to_string());
    }
    if trimmed.starts_with('/') {
        let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
        return Ok(strip_trailing_slash(without_fragment).to_string());
    }
    let mut url = Url::parse(trimmed).map_err(|e| format!("invalid url `{trimmed}`: {e}"))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(format!("url `{trimmed}` has no host"));
    }
    url.set_fragment(None);
    let text = url.to_string();
    if url.query().is_some() {
        return Ok(text);
    }
    Ok(strip_trailing_slash(&text).to_string())
}

fn strip_trailing_slash(value: &str) -> &str {
    let stripped = value.trim_end_matches('/');
    if stripped.is_empty() {
        "/"
    } else {
        stripped
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` date (read as midnight UTC).
#[must_use]
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

#[must_use]
pub fn is_graphql_name(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
