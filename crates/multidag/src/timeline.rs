//! Busy intervals of a single processor.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

use crate::Time;

/// Committed half-open interval `[start, finish)` and the task occupying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: Time,
    pub finish: Time,
    pub workload: usize,
    pub task: usize,
}

/// Set of disjoint busy intervals keyed by start time.
///
/// Intervals are only ever added, so a query result stays valid until the next commit.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    busy: BTreeMap<Time, BusyInterval>,
}

impl Timeline {
    pub fn new() -> Self {
        Self { busy: BTreeMap::new() }
    }

    /// Earliest `start >= ready_time` such that `[start, start + duration)` fits between committed intervals.
    ///
    /// Abutting intervals do not conflict. Gaps before already committed intervals are considered too.
    /// Returns `None` if no such interval ends within the range of [`Time`].
    pub fn earliest_gap(&self, ready_time: Time, duration: Time) -> Option<Time> {
        let mut start = ready_time;
        // only the last interval starting at or before ready_time can cover it
        if let Some((_, prev)) = self.busy.range((Unbounded, Included(ready_time))).next_back() {
            start = start.max(prev.finish);
        }
        for (_, next) in self.busy.range((Excluded(ready_time), Unbounded)) {
            if start.checked_add(duration)? <= next.start {
                break;
            }
            start = start.max(next.finish);
        }
        start.checked_add(duration).map(|_| start)
    }

    /// Records the interval, which must not overlap committed ones.
    pub fn commit(&mut self, interval: BusyInterval) {
        assert!(interval.start < interval.finish, "empty interval {:?}", interval);
        assert!(
            self.is_free(interval.start, interval.finish),
            "interval {:?} overlaps committed intervals",
            interval
        );
        self.busy.insert(interval.start, interval);
    }

    /// Checks that `[start, finish)` does not intersect any committed interval.
    pub fn is_free(&self, start: Time, finish: Time) -> bool {
        let prev_ok = self
            .busy
            .range((Unbounded, Included(start)))
            .next_back()
            .map_or(true, |(_, prev)| prev.finish <= start);
        let next_ok = self
            .busy
            .range((Excluded(start), Unbounded))
            .next()
            .map_or(true, |(_, next)| finish <= next.start);
        prev_ok && next_ok
    }

    /// Committed intervals ordered by start time.
    pub fn intervals(&self) -> impl Iterator<Item = &BusyInterval> {
        self.busy.values()
    }

    /// Finish time of the last interval, 0 for an idle processor.
    pub fn last_finish(&self) -> Time {
        self.busy.values().next_back().map_or(0, |interval| interval.finish)
    }

    pub fn len(&self) -> usize {
        self.busy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.busy.is_empty()
    }
}
