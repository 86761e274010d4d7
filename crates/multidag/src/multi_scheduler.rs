//! Interface of policies scheduling several workloads on one processor pool.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;
use crate::schedule::Schedule;
use crate::workload::Workload;
use crate::Time;

pub trait MultiScheduler {
    /// Schedules all `workloads` on a pool of `processors` processors.
    ///
    /// A workload that can't be scheduled is reported in [`MultiSchedule::failed`] and does not prevent
    /// scheduling of the others.
    fn schedule(&self, workloads: &[Workload], processors: usize) -> MultiSchedule;
}

/// Schedules of all workloads keyed by workload id.
#[derive(Debug, Default)]
pub struct MultiSchedule {
    pub schedules: BTreeMap<usize, Schedule>,
    pub failed: BTreeMap<usize, Error>,
}

impl MultiSchedule {
    /// Finish time of the last task over all workloads.
    pub fn makespan(&self) -> Time {
        self.schedules.values().map(|s| s.finish()).max().unwrap_or(0)
    }

    /// Per-workload figures for every successfully scheduled workload.
    pub fn workload_stats(&self, workloads: &[Workload]) -> Vec<WorkloadStats> {
        workloads
            .iter()
            .filter_map(|workload| {
                self.schedules
                    .get(&workload.id())
                    .map(|schedule| WorkloadStats::new(workload, schedule))
            })
            .collect()
    }
}

/// Achieved bounds of a workload next to its lowerbound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkloadStats {
    pub id: usize,
    pub release_time: Time,
    pub lowerbound: Time,
    /// Start of the first task.
    pub start: Time,
    /// Finish of the last task.
    pub finish: Time,
    /// `finish - start`.
    pub makespan: Time,
}

impl WorkloadStats {
    pub fn new(workload: &Workload, schedule: &Schedule) -> Self {
        Self {
            id: workload.id(),
            release_time: workload.release_time(),
            lowerbound: workload.lowerbound(),
            start: schedule.start(),
            finish: schedule.finish(),
            makespan: schedule.finish() - schedule.start(),
        }
    }
}

/// Drops workloads that can't take part in a run, recording an error for each of them.
///
/// These are workloads built for another pool size and workloads sharing an id. No workload with a duplicated
/// id is scheduled, since results are keyed by id.
pub(crate) fn matching_workloads<'a>(
    workloads: &'a [Workload],
    processors: usize,
    failed: &mut BTreeMap<usize, Error>,
) -> Vec<&'a Workload> {
    let mut occurrences = BTreeMap::<usize, usize>::new();
    for workload in workloads.iter() {
        *occurrences.entry(workload.id()).or_default() += 1;
    }

    workloads
        .iter()
        .filter(|workload| {
            if occurrences[&workload.id()] > 1 {
                log::warn!("workload id {} is used more than once", workload.id());
                failed.insert(workload.id(), Error::DuplicateWorkload { workload: workload.id() });
                false
            } else if workload.processors() != processors {
                log::warn!(
                    "workload {} is built for {} processors instead of {}",
                    workload.id(),
                    workload.processors(),
                    processors
                );
                failed.insert(
                    workload.id(),
                    Error::ProcessorCountMismatch {
                        workload: workload.id(),
                        expected: processors,
                        actual: workload.processors(),
                    },
                );
                false
            } else {
                true
            }
        })
        .collect()
}
