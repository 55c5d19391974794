//! User scheduling preferences: working hours, daily caps, buffers.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Serde helper for `"HH:MM"` time-of-day fields.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// Daily working window, applied identically every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl WorkingHours {
    /// Create a validated window. Fails when `end <= start`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidWorkingWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse a window from `"HH:MM"` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        let parse_one = |label: &str, s: &str| {
            NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| ValidationError::InvalidValue {
                field: label.to_string(),
                message: format!("expected HH:MM, got '{s}': {e}"),
            })
        };
        Self::new(
            parse_one("working_hours.start", start)?,
            parse_one("working_hours.end", end)?,
        )
    }
}

fn default_buffer_minutes() -> i64 {
    15
}

/// User's scheduling preferences and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub working_hours: WorkingHours,
    /// Hard cap on hours scheduled per day
    pub max_daily_hours: f64,
    /// Symmetric padding around every busy interval, in minutes
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: i64,
    /// Free text, scanned for weekend-exclusion phrasing
    #[serde(default)]
    pub additional_notes: String,
}

impl UserPreferences {
    /// Create validated preferences.
    pub fn new(
        working_hours: WorkingHours,
        max_daily_hours: f64,
        buffer_minutes: i64,
    ) -> Result<Self, ValidationError> {
        if max_daily_hours <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "max_daily_hours",
                value: max_daily_hours,
            });
        }
        if buffer_minutes < 0 {
            return Err(ValidationError::InvalidValue {
                field: "buffer_minutes".to_string(),
                message: format!("must be non-negative, got {buffer_minutes}"),
            });
        }

        Ok(Self {
            working_hours,
            max_daily_hours,
            buffer_minutes,
            additional_notes: String::new(),
        })
    }

    /// Attach free-text notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.additional_notes = notes.into();
        self
    }

    /// Whether the notes contain a negative weekend statement.
    ///
    /// Substring heuristic on free text, not a structured flag; the rest of
    /// the system communicates this preference only in prose.
    pub fn excludes_weekends(&self) -> bool {
        let notes = self.additional_notes.to_lowercase();
        notes.contains("no weekend") || notes.contains("don't work on weekend")
    }
}
