//! Task types: priority levels and deadline-bound work items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Priority level of a task.
///
/// Ordered so that `Low < Medium < High`; the scheduler sorts equal-deadline
/// tasks by descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Weight multiplier applied to a task's estimated hours.
    ///
    /// Single source of truth for the weight table; the scheduler plans
    /// `estimated_hours * weight`, not the raw estimate.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Low => 0.8,
            Priority::Medium => 1.0,
            Priority::High => 1.3,
        }
    }

    /// Lowercase wire label, matching the serde representation.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// A deadline-bound unit of work to be placed into free calendar time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Subject/category label, carried into event descriptions
    pub subject: String,
    pub estimated_hours: f64,
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default = "default_can_be_split")]
    pub can_be_split: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_can_be_split() -> bool {
    true
}

impl Task {
    /// Create a validated task. Fails when `estimated_hours` is not positive.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        subject: impl Into<String>,
        estimated_hours: f64,
        deadline: DateTime<Utc>,
        priority: Priority,
    ) -> Result<Self, ValidationError> {
        if estimated_hours <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "estimated_hours",
                value: estimated_hours,
            });
        }

        Ok(Self {
            id: id.into(),
            name: name.into(),
            subject: subject.into(),
            estimated_hours,
            deadline,
            priority,
            can_be_split: true,
            description: None,
        })
    }

    /// Mark the task as unsplittable (must be placed in a single block per day).
    pub fn unsplittable(mut self) -> Self {
        self.can_be_split = false;
        self
    }

    /// Hours adjusted by priority weight; this is the quantity scheduled.
    pub fn weighted_hours(&self) -> f64 {
        self.estimated_hours * self.priority.weight()
    }

    /// Re-check the construction invariant, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.estimated_hours <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "estimated_hours",
                value: self.estimated_hours,
            });
        }
        Ok(())
    }
}
