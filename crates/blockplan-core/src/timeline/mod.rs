//! Free-block computation over a working window.
//!
//! Pure interval algebra: given a window and a set of busy ranges, each
//! expanded by a symmetric buffer, compute the complementary free ranges
//! available for scheduling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous span of free time within a working window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreeBlock {
    /// Get duration in hours
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Compute the free blocks of `[window_start, window_end]` after subtracting
/// every busy interval, each expanded by `buffer` on both ends.
///
/// Busy intervals are sorted by start before subtraction so iteration order
/// is deterministic; the result itself does not depend on the order
/// (set difference is commutative). Returned blocks are non-overlapping and
/// chronologically ordered. Zero-length results are dropped.
pub fn free_blocks(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
    buffer: Duration,
) -> Vec<FreeBlock> {
    if window_end <= window_start {
        return Vec::new();
    }

    let mut expanded: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .map(|&(start, end)| (start - buffer, end + buffer))
        .collect();
    expanded.sort();

    let mut free = vec![(window_start, window_end)];

    for (busy_start, busy_end) in expanded {
        let mut next = Vec::with_capacity(free.len() + 1);
        for (fs, fe) in free {
            if busy_end <= fs || busy_start >= fe {
                // No intersection, keep as is
                next.push((fs, fe));
            } else {
                if fs < busy_start {
                    next.push((fs, busy_start));
                }
                if busy_end < fe {
                    next.push((busy_end, fe));
                }
            }
        }
        free = next;
    }

    free.into_iter()
        .filter(|&(start, end)| end > start)
        .map(|(start, end)| FreeBlock { start, end })
        .collect()
}
