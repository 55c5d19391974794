//! Deterministic greedy scheduler.
//!
//! Places weighted task demand into free calendar time:
//! - Walks the day-span from the injected "now" to each task's deadline
//! - Computes per-day free blocks from the working window and busy events
//! - Allocates first-fit into chronological blocks under a daily budget
//! - Accumulates placed events into the busy set so later tasks never
//!   collide with earlier placements
//!
//! Infeasibility is silent: whatever does not fit before the deadline is
//! dropped and only shows up later in the metrics (completion ratio,
//! deadline compliance).

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};

use crate::calendar::{CalendarEvent, Schedule};
use crate::preferences::UserPreferences;
use crate::task::Task;
use crate::timeline::{free_blocks, FreeBlock};

const EPSILON_HOURS: f64 = 1e-9;

/// Greedy first-fit scheduler.
///
/// Given identical inputs (tasks, events, preferences, `now`) the output is
/// byte-for-byte identical; the scheduler never reads the system clock.
#[derive(Debug, Clone)]
pub struct GreedyScheduler {
    /// Smallest block worth emitting, in hours
    min_block_hours: f64,
}

impl GreedyScheduler {
    /// Create a scheduler with the default 30-minute minimum block.
    pub fn new() -> Self {
        Self {
            min_block_hours: 0.5,
        }
    }

    /// Override the minimum block size.
    pub fn with_min_block_hours(mut self, hours: f64) -> Self {
        self.min_block_hours = hours;
        self
    }

    /// Schedule every task into the free time left by `existing_events`.
    ///
    /// Tasks are ordered by deadline ascending, then priority descending.
    /// Each task is scheduled against the union of the original events and
    /// everything placed for earlier tasks in this run, so the result is
    /// internally conflict-free by construction. Once the ordering is fixed
    /// a later task can never bump an earlier one; a low-priority task with
    /// a near deadline claims its slots before a high-priority task with a
    /// far deadline.
    pub fn generate_schedule(
        &self,
        tasks: &[Task],
        existing_events: &[CalendarEvent],
        preferences: &UserPreferences,
        now: DateTime<Utc>,
    ) -> Schedule {
        let mut ordered: Vec<&Task> = tasks.iter().collect();
        ordered.sort_by_key(|t| (t.deadline, Reverse(t.priority)));

        let mut placed: Vec<CalendarEvent> = Vec::new();
        for task in ordered {
            let events = self.schedule_task(task, existing_events, &placed, preferences, now);
            placed.extend(events);
        }

        Schedule::new(placed, now)
    }

    /// Schedule a single task against a snapshot of the busy set.
    fn schedule_task(
        &self,
        task: &Task,
        existing_events: &[CalendarEvent],
        placed_events: &[CalendarEvent],
        preferences: &UserPreferences,
        now: DateTime<Utc>,
    ) -> Vec<CalendarEvent> {
        let start_date = now.date_naive();
        let deadline_date = task.deadline.date_naive();
        if deadline_date < start_date {
            return Vec::new();
        }

        // Busy intervals grouped by the day the event starts on
        let mut busy_by_day: HashMap<NaiveDate, Vec<(DateTime<Utc>, DateTime<Utc>)>> =
            HashMap::new();
        for event in existing_events.iter().chain(placed_events) {
            busy_by_day
                .entry(event.start.date_naive())
                .or_default()
                .push((event.start, event.end));
        }

        let num_days = (deadline_date - start_date).num_days() + 1;
        let hours_needed = task.weighted_hours();
        // Even-spread planning hint, not a hard per-day limit
        let per_day_target = hours_needed / num_days as f64;
        let buffer = Duration::minutes(preferences.buffer_minutes);

        let mut remaining = hours_needed;
        let mut events = Vec::new();
        let mut day = start_date;

        while day <= deadline_date {
            if remaining <= EPSILON_HOURS {
                break;
            }

            let mut window_start = day.and_time(preferences.working_hours.start).and_utc();
            let window_end = day.and_time(preferences.working_hours.end).and_utc();
            if day == start_date && now > window_start {
                // Never place blocks in the already-elapsed part of today
                window_start = now;
            }

            let empty = Vec::new();
            let day_busy = busy_by_day.get(&day).unwrap_or(&empty);
            let blocks = free_blocks(window_start, window_end, day_busy, buffer);

            let budget = per_day_target
                .min(remaining)
                .min(preferences.max_daily_hours);
            let (spans, consumed) = self.allocate_day(&blocks, budget, task.can_be_split);

            for (start, end) in spans {
                events.push(CalendarEvent {
                    title: task.name.clone(),
                    start,
                    end,
                    description: Some(format!(
                        "{} (priority {})",
                        task.subject,
                        task.priority.label()
                    )),
                    event_id: None,
                });
            }
            remaining -= consumed;

            day = day + Days::new(1);
        }

        events
    }

    /// First-fit allocation of a single day's budget into free blocks.
    ///
    /// Blocks too small to hold a useful chunk are skipped, never split
    /// further. An unsplittable task takes at most one block. This never
    /// prefers a later, better-sized block over an earlier adequate one.
    fn allocate_day(
        &self,
        blocks: &[FreeBlock],
        budget_hours: f64,
        can_split: bool,
    ) -> (Vec<(DateTime<Utc>, DateTime<Utc>)>, f64) {
        let mut spans = Vec::new();
        let mut remaining = budget_hours;

        for block in blocks {
            if remaining <= EPSILON_HOURS {
                break;
            }

            let available = block.duration_hours().min(remaining);
            if available < self.min_block_hours {
                continue;
            }

            let end = block.start + Duration::seconds((available * 3600.0).round() as i64);
            spans.push((block.start, end));
            remaining -= available;

            if !can_split {
                break;
            }
        }

        (spans, budget_hours - remaining)
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::WorkingHours;
    use crate::task::Priority;
    use chrono::TimeZone;

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, day, h, m, 0).unwrap()
    }

    fn prefs(max_daily_hours: f64) -> UserPreferences {
        UserPreferences::new(
            WorkingHours::parse("09:00", "17:00").unwrap(),
            max_daily_hours,
            15,
        )
        .unwrap()
    }

    fn task(name: &str, hours: f64, deadline: DateTime<Utc>, priority: Priority) -> Task {
        Task::new(name.to_lowercase(), name, "Studies", hours, deadline, priority).unwrap()
    }

    fn block(start: DateTime<Utc>, end: DateTime<Utc>) -> FreeBlock {
        FreeBlock { start, end }
    }

    #[test]
    fn test_first_fit_allocation() {
        // Budget 2.5h over blocks [09:00-10:00, 11:00-14:00]
        // => 09:00-10:00 (1h) then 11:00-12:30 (1.5h), exactly 2.5h consumed
        let scheduler = GreedyScheduler::new();
        let blocks = vec![
            block(at(3, 9, 0), at(3, 10, 0)),
            block(at(3, 11, 0), at(3, 14, 0)),
        ];

        let (spans, consumed) = scheduler.allocate_day(&blocks, 2.5, true);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], (at(3, 9, 0), at(3, 10, 0)));
        assert_eq!(spans[1], (at(3, 11, 0), at(3, 12, 30)));
        assert!((consumed - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_allocation_skips_undersized_blocks() {
        let scheduler = GreedyScheduler::new();
        let blocks = vec![
            block(at(3, 9, 0), at(3, 9, 15)),
            block(at(3, 11, 0), at(3, 12, 0)),
        ];

        let (spans, consumed) = scheduler.allocate_day(&blocks, 1.0, true);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0], (at(3, 11, 0), at(3, 12, 0)));
        assert!((consumed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsplittable_takes_one_block() {
        let scheduler = GreedyScheduler::new();
        let blocks = vec![
            block(at(3, 9, 0), at(3, 10, 0)),
            block(at(3, 11, 0), at(3, 14, 0)),
        ];

        let (spans, consumed) = scheduler.allocate_day(&blocks, 2.5, false);

        assert_eq!(spans.len(), 1);
        assert!((consumed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsplittable_task_first_fit_single_block() {
        let scheduler = GreedyScheduler::new();
        let presentation = task("Presentation", 3.0, at(3, 23, 0), Priority::Medium).unsplittable();
        let lecture = CalendarEvent::new("Lecture", at(3, 10, 0), at(3, 11, 0)).unwrap();
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&[presentation], &[lecture], &prefs(8.0), now);

        // First-fit takes the small morning block and stops for the day,
        // even though the afternoon block could hold the whole task.
        assert_eq!(schedule.events.len(), 1);
        assert_eq!(schedule.events[0].start, at(3, 9, 0));
        assert_eq!(schedule.events[0].end, at(3, 9, 45));
    }

    #[test]
    fn test_single_task_single_day() {
        let scheduler = GreedyScheduler::new();
        let tasks = vec![task("Essay", 2.0, at(3, 23, 0), Priority::Medium)];
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&tasks, &[], &prefs(8.0), now);

        assert_eq!(schedule.events.len(), 1);
        assert_eq!(schedule.events[0].start, at(3, 9, 0));
        assert_eq!(schedule.events[0].end, at(3, 11, 0));
        assert_eq!(schedule.events[0].title, "Essay");
    }

    #[test]
    fn test_even_spread_across_days() {
        // 4h over a 4-day span => 1h each morning
        let scheduler = GreedyScheduler::new();
        let tasks = vec![task("Revision", 4.0, at(6, 23, 0), Priority::Medium)];
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&tasks, &[], &prefs(8.0), now);

        assert_eq!(schedule.events.len(), 4);
        for (i, event) in schedule.events.iter().enumerate() {
            assert_eq!(event.start, at(3 + i as u32, 9, 0));
            assert_eq!(event.end, at(3 + i as u32, 10, 0));
        }
        assert!((schedule.total_hours() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_avoids_existing_events_with_buffer() {
        let scheduler = GreedyScheduler::new();
        let tasks = vec![task("Essay", 1.0, at(3, 23, 0), Priority::Medium)];
        let lecture = CalendarEvent::new("Lecture", at(3, 9, 0), at(3, 10, 0)).unwrap();
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&tasks, &[lecture.clone()], &prefs(8.0), now);

        assert_eq!(schedule.events.len(), 1);
        // 15 min buffer after the lecture
        assert_eq!(schedule.events[0].start, at(3, 10, 15));
        assert!(!schedule.events[0].overlaps_with(&lecture));
    }

    #[test]
    fn test_earlier_deadline_beats_higher_priority() {
        let scheduler = GreedyScheduler::new();
        let urgent_low = task("Reading", 7.0, at(9, 23, 0), Priority::Low);
        let later_high = task("Exam prep", 8.0, at(10, 23, 0), Priority::High);
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(
            &[later_high, urgent_low],
            &[],
            &prefs(8.0),
            now,
        );

        // The low-priority task has the earlier deadline and claims the
        // earliest slot.
        assert_eq!(schedule.events[0].title, "Reading");
    }

    #[test]
    fn test_higher_priority_wins_equal_deadline() {
        let scheduler = GreedyScheduler::new();
        let low = task("Reading", 1.0, at(3, 23, 0), Priority::Low);
        let high = task("Exam prep", 1.0, at(3, 23, 0), Priority::High);
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&[low, high], &[], &prefs(8.0), now);

        assert_eq!(schedule.events[0].title, "Exam prep");
    }

    #[test]
    fn test_multi_task_output_is_conflict_free() {
        let scheduler = GreedyScheduler::new();
        let tasks = vec![
            task("Essay", 3.0, at(4, 23, 0), Priority::High),
            task("Reading", 2.0, at(4, 23, 0), Priority::Low),
            task("Problem set", 4.0, at(5, 23, 0), Priority::Medium),
        ];
        let existing = vec![
            CalendarEvent::new("Lecture", at(3, 11, 0), at(3, 12, 0)).unwrap(),
            CalendarEvent::new("Lab", at(4, 14, 0), at(4, 16, 0)).unwrap(),
        ];
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&tasks, &existing, &prefs(6.0), now);

        assert!(!schedule.has_conflicts());
        for event in &schedule.events {
            for busy in &existing {
                assert!(!event.overlaps_with(busy));
            }
        }
    }

    #[test]
    fn test_never_schedules_past_deadline() {
        let scheduler = GreedyScheduler::new();
        // Far more work than fits before the deadline
        let tasks = vec![task("Thesis", 40.0, at(4, 23, 0), Priority::Medium)];
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&tasks, &[], &prefs(4.0), now);

        for event in &schedule.events {
            assert!(event.end.date_naive() <= at(4, 0, 0).date_naive());
        }
        // Capped at max_daily_hours on each of the two available days
        assert!(schedule.total_hours() <= 8.0 + 1e-9);
    }

    #[test]
    fn test_deadline_in_the_past_schedules_nothing() {
        let scheduler = GreedyScheduler::new();
        let tasks = vec![task("Late essay", 2.0, at(1, 23, 0), Priority::High)];
        let now = at(3, 0, 0);

        let schedule = scheduler.generate_schedule(&tasks, &[], &prefs(8.0), now);

        assert!(schedule.is_empty());
    }

    #[test]
    fn test_first_day_window_clamped_to_now() {
        let scheduler = GreedyScheduler::new();
        let tasks = vec![task("Essay", 1.0, at(3, 23, 0), Priority::Medium)];
        // Mid-afternoon start
        let now = at(3, 14, 30);

        let schedule = scheduler.generate_schedule(&tasks, &[], &prefs(8.0), now);

        assert_eq!(schedule.events.len(), 1);
        assert_eq!(schedule.events[0].start, at(3, 14, 30));
    }

    #[test]
    fn test_deterministic_output() {
        let scheduler = GreedyScheduler::new();
        let tasks = vec![
            task("Essay", 3.0, at(5, 23, 0), Priority::High),
            task("Reading", 2.0, at(4, 23, 0), Priority::Low),
        ];
        let existing = vec![CalendarEvent::new("Lecture", at(3, 10, 0), at(3, 12, 0)).unwrap()];
        let now = at(3, 0, 0);
        let preferences = prefs(5.0);

        let first = scheduler.generate_schedule(&tasks, &existing, &preferences, now);
        let second = scheduler.generate_schedule(&tasks, &existing, &preferences, now);

        assert_eq!(first.events, second.events);
    }
}
