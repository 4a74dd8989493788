//! Free-text to structured value conversions shared by the dialog and the API.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

lazy_static::lazy_static! {
    /// Runs of anything that is not a lowercase letter or digit
    static ref NON_SLUG_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();

    /// Valid slug pattern: lowercase letters, numbers, and single hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// How a list-valued field is typed into a single text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Newline,
}

impl Delimiter {
    /// Split, trim and drop empty items.
    pub fn split(&self, text: &str) -> Vec<String> {
        let sep = match self {
            Delimiter::Comma => ',',
            Delimiter::Newline => '\n',
        };
        text.split(sep)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Inverse of `split` for display in the text input.
    pub fn join(&self, items: &[String]) -> String {
        match self {
            Delimiter::Comma => items.join(", "),
            Delimiter::Newline => items.join("\n"),
        }
    }
}

/// Clean list from whatever the draft holds: arrays are trimmed and
/// empty-filtered, strings are split, anything else is an empty list.
pub fn clean_list(value: &Value, delimiter: Delimiter) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(text) => delimiter.split(text),
        _ => Vec::new(),
    }
}

/// Lowercase, collapse non-alphanumeric runs to one hyphen, trim hyphens.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Safe numeric parse; anything unparseable is 0.
pub fn coerce_number(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Skill level: safe parse, clamped to 0..=100.
pub fn coerce_level(value: &Value) -> i32 {
    coerce_number(value).clamp(0, 100) as i32
}

pub fn coerce_count(value: &Value) -> i32 {
    coerce_number(value).clamp(0, i32::MAX as i64) as i32
}

/// Text field value, trimmed; `None` when blank or absent.
pub fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub fn text(value: Option<&Value>) -> String {
    optional_text(value).unwrap_or_default()
}

/// Multi-line text kept as written, so indentation and Markdown survive.
/// Blank input still collapses to an empty string.
pub fn long_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => String::new(),
    }
}

pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "on" | "1"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp, truncated to its date.
pub fn parse_date(value: Option<&Value>) -> Result<Option<NaiveDate>, String> {
    let Some(raw) = optional_text(value) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| format!("'{}' is not a date", raw))
}
