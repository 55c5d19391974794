//! # Blockplan Core Library
//!
//! This library provides the core scheduling logic for Blockplan: a
//! deterministic greedy scheduler that places deadline-bound tasks into a
//! user's free calendar time, and a metrics engine that scores any candidate
//! schedule against correctness and quality criteria.
//!
//! ## Architecture
//!
//! - **Timeline**: Pure interval algebra computing free blocks from a
//!   working window and buffer-expanded busy intervals
//! - **Scheduler**: Greedy first-fit allocation across the day-span from an
//!   injected "now" to each task's deadline, in deadline/priority order
//! - **Metrics**: A stateless evaluation function producing a flat record of
//!   correctness flags, quality scores, and pass-through system metrics
//! - **Parse**: Tolerant conversion of externally generated JSON candidate
//!   schedules into event records
//!
//! The core is synchronous and side-effect free: no network, no clock reads,
//! no shared state. "Now" is always an explicit parameter, so identical
//! inputs always produce identical schedules and metrics.
//!
//! ## Key Components
//!
//! - [`GreedyScheduler`]: deterministic first-fit scheduler
//! - [`evaluate`] / [`evaluate_with_report`]: schedule quality metrics
//! - [`free_blocks`]: free-time computation over a working window
//! - [`parse_candidate_schedule`]: candidate schedule ingestion

pub mod calendar;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod preferences;
pub mod scheduler;
pub mod task;
pub mod timeline;

pub use calendar::{CalendarEvent, Schedule};
pub use error::{CoreError, ParseError, Result, ValidationError};
pub use metrics::{evaluate, evaluate_with_report, GenerationReport, ScheduleMetrics};
pub use parse::{parse_candidate_schedule, parse_datetime};
pub use preferences::{UserPreferences, WorkingHours};
pub use scheduler::GreedyScheduler;
pub use task::{Priority, Task};
pub use timeline::{free_blocks, FreeBlock};
