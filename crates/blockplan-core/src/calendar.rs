//! Calendar event and schedule types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ValidationError;

/// A busy interval on the calendar, existing or newly scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl CalendarEvent {
    /// Create a validated event. Fails when `end <= start`.
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }

        Ok(Self {
            title: title.into(),
            start,
            end,
            description: None,
            event_id: None,
        })
    }

    /// Attach a free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get duration in hours
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Half-open interval overlap test.
    ///
    /// Events that share only an endpoint (`self.end == other.start`) do not
    /// overlap.
    pub fn overlaps_with(&self, other: &CalendarEvent) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Re-check the construction invariant, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end <= self.start {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// An ordered set of newly scheduled events, as produced by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub events: Vec<CalendarEvent>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Create a schedule stamped with the injected clock value.
    pub fn new(events: Vec<CalendarEvent>, created_at: DateTime<Utc>) -> Self {
        Self { events, created_at }
    }

    /// Total scheduled hours across all events.
    pub fn total_hours(&self) -> f64 {
        self.events.iter().map(|e| e.duration_hours()).sum()
    }

    /// Number of distinct event titles (one per task in practice).
    pub fn total_tasks(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.title.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Pairwise overlap scan over the schedule's own events.
    pub fn has_conflicts(&self) -> bool {
        for (i, event1) in self.events.iter().enumerate() {
            for event2 in &self.events[i + 1..] {
                if event1.overlaps_with(event2) {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
