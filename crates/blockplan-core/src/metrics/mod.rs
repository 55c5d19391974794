//! Schedule quality metrics.
//!
//! A pure function of (candidate schedule, existing events, task list,
//! preferences) producing a flat metrics record: correctness flags
//! (conflicts, deadline compliance), quality scores (workload variance,
//! completion ratio, fragmentation, makespan) and pass-through system
//! metrics supplied by the caller. The engine is applied uniformly to
//! deterministic and externally generated schedules and assumes nothing
//! about how the schedule was produced.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarEvent, Schedule};
use crate::preferences::UserPreferences;
use crate::task::Task;

/// Flat record of every metric computed for one evaluation.
///
/// Produced fresh per evaluation and never mutated afterwards. Serializes
/// as flat key/value pairs for downstream tabulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    // Constraint/correctness metrics
    pub conflict_free: bool,
    pub num_conflicts: usize,
    pub deadline_compliance_rate: f64,
    pub tasks_meeting_deadline: usize,
    pub total_tasks: usize,

    // Quality/utility metrics
    pub workload_variance: f64,
    pub average_daily_hours: f64,
    pub completion_ratio: f64,
    pub hours_scheduled: f64,
    pub hours_requested: f64,
    pub fragmentation_score: f64,
    pub makespan_days: f64,

    // Parsing metrics
    pub parsing_success: bool,
    pub repair_attempted: bool,
    pub parse_error_message: String,

    // System metrics
    pub api_cost: f64,
    pub latency_seconds: f64,
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,

    // Preference compliance
    pub within_working_hours_rate: f64,
    pub weekend_violation: bool,
}

impl Default for ScheduleMetrics {
    fn default() -> Self {
        Self {
            conflict_free: true,
            num_conflicts: 0,
            deadline_compliance_rate: 0.0,
            tasks_meeting_deadline: 0,
            total_tasks: 0,
            workload_variance: 0.0,
            average_daily_hours: 0.0,
            completion_ratio: 0.0,
            hours_scheduled: 0.0,
            hours_requested: 0.0,
            fragmentation_score: 0.0,
            makespan_days: 0.0,
            parsing_success: true,
            repair_attempted: false,
            parse_error_message: String::new(),
            api_cost: 0.0,
            latency_seconds: 0.0,
            total_tokens: 0,
            prompt_tokens: 0,
            completion_tokens: 0,
            within_working_hours_rate: 0.0,
            weekend_violation: false,
        }
    }
}

/// Caller-supplied facts about how the candidate schedule was produced.
///
/// For the deterministic scheduler the default (no parse error, zero
/// latency, zero tokens) is correct; the engine must run fully on it.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// `Some` means the generator's output could not be parsed at all
    pub parse_error: Option<String>,
    /// Whether a repair pass was attempted on malformed output
    pub repair_attempted: bool,
    pub latency_seconds: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    /// Model name keying the API cost table
    pub model: String,
}

/// Evaluate a schedule with no external generation involved.
pub fn evaluate(
    schedule: &Schedule,
    existing_events: &[CalendarEvent],
    tasks: &[Task],
    preferences: &UserPreferences,
) -> ScheduleMetrics {
    evaluate_with_report(
        schedule,
        existing_events,
        tasks,
        preferences,
        &GenerationReport::default(),
    )
}

/// Evaluate a schedule together with its generation report.
///
/// When the report carries a parse error, or the schedule is empty, every
/// quality metric stays at its zero default: the engine never partially
/// trusts malformed input. Parsing/system fields and `total_tasks` are
/// populated regardless.
pub fn evaluate_with_report(
    schedule: &Schedule,
    existing_events: &[CalendarEvent],
    tasks: &[Task],
    preferences: &UserPreferences,
    report: &GenerationReport,
) -> ScheduleMetrics {
    let mut metrics = ScheduleMetrics {
        parsing_success: report.parse_error.is_none(),
        repair_attempted: report.repair_attempted,
        parse_error_message: report.parse_error.clone().unwrap_or_default(),
        latency_seconds: report.latency_seconds,
        prompt_tokens: report.prompt_tokens,
        completion_tokens: report.completion_tokens,
        total_tokens: report.prompt_tokens + report.completion_tokens,
        api_cost: api_cost(report.prompt_tokens, report.completion_tokens, &report.model),
        ..ScheduleMetrics::default()
    };

    if !metrics.parsing_success || schedule.is_empty() {
        metrics.total_tasks = tasks.len();
        return metrics;
    }

    let (conflict_free, num_conflicts) = check_conflicts(&schedule.events, existing_events);
    metrics.conflict_free = conflict_free;
    metrics.num_conflicts = num_conflicts;

    let (rate, meeting, total) = deadline_compliance(&schedule.events, tasks);
    metrics.deadline_compliance_rate = rate;
    metrics.tasks_meeting_deadline = meeting;
    metrics.total_tasks = total;

    let (variance, average) = workload_balance(&schedule.events);
    metrics.workload_variance = variance;
    metrics.average_daily_hours = average;

    let (ratio, scheduled, requested) = completion_ratio(&schedule.events, tasks);
    metrics.completion_ratio = ratio;
    metrics.hours_scheduled = scheduled;
    metrics.hours_requested = requested;

    metrics.fragmentation_score = fragmentation(&schedule.events, tasks);
    metrics.makespan_days = makespan_days(&schedule.events);

    let (within_rate, weekend_violation) = preference_compliance(&schedule.events, preferences);
    metrics.within_working_hours_rate = within_rate;
    metrics.weekend_violation = weekend_violation;

    metrics
}

/// Pairwise overlap scan over the union of new and existing events.
///
/// Each colliding unordered pair is counted once; shared endpoints are
/// never a conflict.
fn check_conflicts(
    scheduled: &[CalendarEvent],
    existing: &[CalendarEvent],
) -> (bool, usize) {
    let all: Vec<&CalendarEvent> = scheduled.iter().chain(existing).collect();
    let mut conflicts = 0;

    for (i, event1) in all.iter().enumerate() {
        for event2 in &all[i + 1..] {
            if event1.start < event2.end && event2.start < event1.end {
                conflicts += 1;
            }
        }
    }

    (conflicts == 0, conflicts)
}

/// Associate events to tasks by case-insensitive substring match of the
/// task name inside the event title. First matching task wins per event.
///
/// This is a heuristic, not a key join: two tasks sharing a common word can
/// cross-attribute. Preserved because every producer in the system
/// communicates via free-text titles only.
fn associate_events<'a>(
    events: &'a [CalendarEvent],
    tasks: &'a [Task],
) -> HashMap<&'a str, Vec<&'a CalendarEvent>> {
    let mut by_task: HashMap<&str, Vec<&CalendarEvent>> = HashMap::new();

    for event in events {
        let title = event.title.to_lowercase();
        for task in tasks {
            if title.contains(&task.name.to_lowercase()) {
                by_task.entry(task.id.as_str()).or_default().push(event);
                break;
            }
        }
    }

    by_task
}

/// Fraction of tasks whose latest associated event ends on or before the
/// deadline. Tasks with no associated events never count as compliant.
fn deadline_compliance(events: &[CalendarEvent], tasks: &[Task]) -> (f64, usize, usize) {
    if tasks.is_empty() {
        return (1.0, 0, 0);
    }

    let by_task = associate_events(events, tasks);
    let mut meeting = 0;

    for task in tasks {
        let Some(task_events) = by_task.get(task.id.as_str()) else {
            continue;
        };
        let latest_end = task_events.iter().map(|e| e.end).max();
        if matches!(latest_end, Some(end) if end <= task.deadline) {
            meeting += 1;
        }
    }

    (meeting as f64 / tasks.len() as f64, meeting, tasks.len())
}

/// Population variance and mean of per-day scheduled hours, keyed by each
/// event's start date. Lower variance means a more even workload.
fn workload_balance(events: &[CalendarEvent]) -> (f64, f64) {
    if events.is_empty() {
        return (0.0, 0.0);
    }

    let mut daily_hours: HashMap<NaiveDate, f64> = HashMap::new();
    for event in events {
        *daily_hours.entry(event.start.date_naive()).or_default() += event.duration_hours();
    }

    let n = daily_hours.len() as f64;
    let mean = daily_hours.values().sum::<f64>() / n;
    let variance = daily_hours
        .values()
        .map(|h| (h - mean) * (h - mean))
        .sum::<f64>()
        / n;

    (variance, mean)
}

/// Scheduled hours over requested hours. The denominator is the sum of raw
/// unweighted estimates, so a weighted scheduler can legitimately exceed 1.0.
fn completion_ratio(events: &[CalendarEvent], tasks: &[Task]) -> (f64, f64, f64) {
    let requested: f64 = tasks.iter().map(|t| t.estimated_hours).sum();
    let scheduled: f64 = events.iter().map(|e| e.duration_hours()).sum();

    let ratio = if requested > 0.0 {
        scheduled / requested
    } else {
        0.0
    };

    (ratio, scheduled, requested)
}

/// Mean number of event blocks per task with at least one associated event.
/// Lower means less splitting.
fn fragmentation(events: &[CalendarEvent], tasks: &[Task]) -> f64 {
    if tasks.is_empty() || events.is_empty() {
        return 0.0;
    }

    let by_task = associate_events(events, tasks);
    if by_task.is_empty() {
        return 0.0;
    }

    let total_blocks: usize = by_task.values().map(|v| v.len()).sum();
    total_blocks as f64 / by_task.len() as f64
}

/// Fractional days between the earliest event start and latest event end.
fn makespan_days(events: &[CalendarEvent]) -> f64 {
    let earliest = events.iter().map(|e| e.start).min();
    let latest = events.iter().map(|e| e.end).max();

    match (earliest, latest) {
        (Some(start), Some(end)) => (end - start).num_seconds() as f64 / 86_400.0,
        _ => 0.0,
    }
}

/// Weekend and working-hours compliance.
///
/// The weekend flag fires when the preference notes exclude weekends and
/// any event starts on Saturday or Sunday. Every event currently counts as
/// within working hours; checking against the preference window is pending
/// multi-window preferences.
fn preference_compliance(events: &[CalendarEvent], preferences: &UserPreferences) -> (f64, bool) {
    if events.is_empty() {
        return (1.0, false);
    }

    let no_weekends = preferences.excludes_weekends();
    let mut weekend_violation = false;
    let mut events_in_hours = 0usize;

    for event in events {
        let weekday = event.start.weekday();
        if no_weekends && (weekday == Weekday::Sat || weekday == Weekday::Sun) {
            weekend_violation = true;
        }
        events_in_hours += 1;
    }

    (events_in_hours as f64 / events.len() as f64, weekend_violation)
}

/// Piecewise linear API cost model, rates per 1K tokens keyed by model name.
/// Unknown models fall back to the gpt-4o rates.
pub fn api_cost(prompt_tokens: u64, completion_tokens: u64, model: &str) -> f64 {
    let (prompt_per_1k, completion_per_1k) = match model {
        "gpt-4o" => (0.005, 0.015),
        "gpt-4" => (0.03, 0.06),
        "gpt-3.5-turbo" => (0.0015, 0.002),
        _ => (0.005, 0.015),
    };

    (prompt_tokens as f64 / 1000.0) * prompt_per_1k
        + (completion_tokens as f64 / 1000.0) * completion_per_1k
}
