//! Sequential dispatch of whole workloads, smallest lowerbound first.

use crate::error::Error;
use crate::multi_scheduler::{matching_workloads, MultiSchedule, MultiScheduler};
use crate::workload::Workload;
use crate::Time;

/// Runs released workloads one at a time, each on the whole processor pool.
///
/// At every dispatch point the released workload with the smallest lowerbound (then smallest id) is taken,
/// its isolated HEFT schedule is shifted to the current clock, and the clock advances by its makespan.
/// Workloads never run concurrently under this policy.
#[derive(Clone, Debug, Default)]
pub struct MinLowerboundScheduler {}

impl MinLowerboundScheduler {
    pub fn new() -> Self {
        Self {}
    }
}

impl MultiScheduler for MinLowerboundScheduler {
    fn schedule(&self, workloads: &[Workload], processors: usize) -> MultiSchedule {
        let mut result = MultiSchedule::default();
        let mut pending = matching_workloads(workloads, processors, &mut result.failed);
        let mut clock: Time = 0;

        while !pending.is_empty() {
            let next = pending
                .iter()
                .enumerate()
                .filter(|(_, workload)| workload.release_time() <= clock)
                .min_by(|(_, a), (_, b)| {
                    a.lowerbound()
                        .cmp(&b.lowerbound())
                        .then(a.id().cmp(&b.id()))
                })
                .map(|(index, _)| index);
            let index = match next {
                Some(index) => index,
                None => {
                    // nothing released yet, idle until the nearest release
                    clock = pending.iter().map(|w| w.release_time()).min().unwrap_or(clock);
                    continue;
                }
            };

            let workload = pending.remove(index);
            let isolated = workload.isolated_schedule();
            let shifted = isolated.shifted(clock).and_then(|schedule| {
                clock
                    .checked_add(isolated.makespan())
                    .map(|next_clock| (schedule, next_clock))
                    .ok_or(Error::TimeOverflow { context: "of dispatch clock" })
            });
            match shifted {
                Ok((schedule, next_clock)) => {
                    log::info!(
                        "dispatching workload {} at {} (lowerbound {})",
                        workload.id(),
                        clock,
                        workload.lowerbound()
                    );
                    result.schedules.insert(workload.id(), schedule);
                    clock = next_clock;
                }
                Err(e) => {
                    log::warn!("abandoning workload {}: {}", workload.id(), e);
                    result.failed.insert(workload.id(), e);
                }
            }
        }

        log::info!("total makespan: {}", result.makespan());
        result
    }
}
