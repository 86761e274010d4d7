//! Placement results.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::Time;

/// Committed placement of one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    pub task: usize,
    pub processor: usize,
    pub start: Time,
    pub finish: Time,
}

impl ScheduledTask {
    pub fn new(task: usize, processor: usize, start: Time, finish: Time) -> Self {
        Self {
            task,
            processor,
            start,
            finish,
        }
    }

    pub fn duration(&self) -> Time {
        self.finish - self.start
    }

    pub fn overlaps(&self, other: &ScheduledTask) -> bool {
        self.processor == other.processor && self.start < other.finish && other.start < self.finish
    }
}

/// Placements of all tasks of one DAG keyed by task id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    tasks: BTreeMap<usize, ScheduledTask>,
}

impl Schedule {
    pub fn new() -> Self {
        Self { tasks: BTreeMap::new() }
    }

    pub fn insert(&mut self, scheduled_task: ScheduledTask) {
        self.tasks.insert(scheduled_task.task, scheduled_task);
    }

    pub fn get(&self, task: usize) -> Option<&ScheduledTask> {
        self.tasks.get(&task)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Latest finish time, 0 for an empty schedule.
    pub fn makespan(&self) -> Time {
        self.finish()
    }

    /// Earliest start time, 0 for an empty schedule.
    pub fn start(&self) -> Time {
        self.tasks.values().map(|t| t.start).min().unwrap_or(0)
    }

    pub fn finish(&self) -> Time {
        self.tasks.values().map(|t| t.finish).max().unwrap_or(0)
    }

    /// Copy of this schedule with every interval moved `offset` time units later.
    pub fn shifted(&self, offset: Time) -> Result<Self> {
        if self.finish().checked_add(offset).is_none() {
            return Err(Error::TimeOverflow { context: "of shifted schedule" });
        }
        Ok(self
            .tasks
            .values()
            .map(|t| ScheduledTask::new(t.task, t.processor, t.start + offset, t.finish + offset))
            .collect())
    }

    /// Tasks placed on `processor` ordered by start time.
    pub fn processor_tasks(&self, processor: usize) -> Vec<ScheduledTask> {
        let mut result = self
            .tasks
            .values()
            .filter(|t| t.processor == processor)
            .copied()
            .collect::<Vec<_>>();
        result.sort_by_key(|t| t.start);
        result
    }
}

impl FromIterator<ScheduledTask> for Schedule {
    fn from_iter<I: IntoIterator<Item = ScheduledTask>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().map(|t| (t.task, t)).collect(),
        }
    }
}
