//! Insertion-based earliest finish time placement shared by all schedulers.

use crate::dag::DAG;
use crate::error::{Error, Result};
use crate::schedule::{Schedule, ScheduledTask};
use crate::timeline::{BusyInterval, Timeline};
use crate::Time;

/// Time at which the outputs of all predecessors of `task_id` are available on `processor`.
///
/// Every predecessor must already be placed in `schedule`. The result is never less than `not_before`.
pub fn processor_ready(
    dag: &DAG,
    task_id: usize,
    processor: usize,
    schedule: &Schedule,
    not_before: Time,
) -> Result<Time> {
    let task = dag.task(task_id)?;
    let mut ready = not_before;
    for &father in task.fathers.iter() {
        let placed = schedule.get(father).ok_or(Error::UnscheduledPredecessor {
            task: task_id,
            predecessor: father,
        })?;
        let transfer = dag
            .get_task(father)
            .communication_cost(task_id, placed.processor, processor)?;
        let arrival = placed
            .finish
            .checked_add(transfer)
            .ok_or(Error::TimeOverflow { context: "of data arrival" })?;
        ready = ready.max(arrival);
    }
    Ok(ready)
}

/// Selects the processor giving the earliest finish time for `task_id`.
///
/// Idle gaps between already committed intervals are considered. Ties go to the lowest processor id.
pub fn evaluate_placement(
    dag: &DAG,
    task_id: usize,
    schedule: &Schedule,
    timelines: &[Timeline],
    not_before: Time,
) -> Result<ScheduledTask> {
    let task = dag.task(task_id)?;
    let mut best: Option<ScheduledTask> = None;
    for (processor, timeline) in timelines.iter().enumerate() {
        let ready = processor_ready(dag, task_id, processor, schedule, not_before)?;
        let duration = *task
            .computation_times
            .get(processor)
            .ok_or(Error::ComputationTimesLength {
                task: task_id,
                expected: timelines.len(),
                actual: task.computation_times.len(),
            })?;
        let start = timeline
            .earliest_gap(ready, duration)
            .ok_or(Error::TimeOverflow { context: "of task finish" })?;
        let candidate = ScheduledTask::new(task_id, processor, start, start + duration);
        if best.map_or(true, |best| candidate.finish < best.finish) {
            best = Some(candidate);
        }
    }
    best.ok_or(Error::NoProcessors)
}

/// Places `task_id` by earliest finish time and commits it to `schedule` and the processor timeline.
pub fn place_task(
    dag: &DAG,
    workload: usize,
    task_id: usize,
    schedule: &mut Schedule,
    timelines: &mut [Timeline],
    not_before: Time,
) -> Result<ScheduledTask> {
    if schedule.get(task_id).is_some() {
        return Err(Error::AlreadyScheduled { task: task_id });
    }
    let placed = evaluate_placement(dag, task_id, schedule, timelines, not_before)?;
    timelines[placed.processor].commit(BusyInterval {
        start: placed.start,
        finish: placed.finish,
        workload,
        task: task_id,
    });
    schedule.insert(placed);
    log::debug!(
        "scheduling task {} of workload {} on processor {} on time {}-{}",
        task_id,
        workload,
        placed.processor,
        placed.start,
        placed.finish
    );
    Ok(placed)
}
