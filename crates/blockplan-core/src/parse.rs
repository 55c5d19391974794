//! Tolerant parsing of externally generated candidate schedules.
//!
//! Generators return a JSON array of event records, often wrapped in
//! Markdown code fences. Individual malformed records are dropped; only a
//! payload that is not valid JSON at all is an error, and even that is
//! recoverable (the metrics engine records it as `parsing_success=false`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::calendar::CalendarEvent;
use crate::error::ParseError;

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    title: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    #[serde(default)]
    description: Option<String>,
}

/// Parse a candidate schedule from raw generator output.
///
/// Strips code fences, parses the JSON array, and keeps only records with
/// valid timestamps, `end > start`, and a start at or after `now` (events
/// placed in the past are skipped, not errors).
pub fn parse_candidate_schedule(
    raw: &str,
    now: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>, ParseError> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(cleaned)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ParseError::NotAnArray {
                found: json_type_name(&other).to_string(),
            })
        }
    };

    let mut events = Vec::new();
    for item in items {
        let Ok(raw_event) = serde_json::from_value::<RawEvent>(item) else {
            continue;
        };
        let (Some(start), Some(end)) = (
            parse_datetime(&raw_event.start),
            parse_datetime(&raw_event.end),
        ) else {
            continue;
        };
        if start < now {
            continue;
        }
        let Ok(event) = CalendarEvent::new(raw_event.title, start, end) else {
            continue;
        };
        events.push(match raw_event.description {
            Some(description) => event.with_description(description),
            None => event,
        });
    }

    Ok(events)
}

/// Parse a timestamp from the formats generators actually emit.
///
/// Accepts RFC 3339 (offset or `Z`), naive `YYYY-MM-DDTHH:MM[:SS]` taken as
/// UTC, and bare dates promoted to end-of-day.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc());
    }

    None
}

fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the fence line, including a possible language tag
        text = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
    }
    if let Some(body) = text.trim_end().strip_suffix("```") {
        text = body;
    }
    text.trim()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
