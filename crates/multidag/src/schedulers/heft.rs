//! Heterogeneous Earliest Finish Time scheduling of a single DAG.

use crate::dag::DAG;
use crate::error::Result;
use crate::rank::{ranked_tasks, RankedTask};
use crate::schedule::Schedule;
use crate::schedulers::common::place_task;
use crate::timeline::Timeline;

/// Places tasks in order of descending rank, each on the processor where it finishes earliest.
#[derive(Clone, Debug, Default)]
pub struct HeftScheduler {}

impl HeftScheduler {
    pub fn new() -> Self {
        Self {}
    }

    /// Validates the graph and schedules it on `processors` idle processors starting at time 0.
    pub fn schedule(&self, dag: &DAG, processors: usize) -> Result<Schedule> {
        dag.validate(processors)?;
        let ranks = ranked_tasks(dag)?;
        self.schedule_ranked(dag, &ranks, processors)
    }

    /// Schedules an already validated graph using precomputed rank order.
    pub fn schedule_ranked(&self, dag: &DAG, ranks: &[RankedTask], processors: usize) -> Result<Schedule> {
        let mut timelines = vec![Timeline::new(); processors];
        let mut schedule = Schedule::new();
        for ranked in ranks.iter() {
            place_task(dag, 0, ranked.task, &mut schedule, &mut timelines, 0)?;
        }
        log::info!("expected makespan: {}", schedule.makespan());
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::Time;

    fn costs(cross: Time) -> Vec<Vec<Time>> {
        vec![vec![0, cross], vec![cross, 0]]
    }

    #[test]
    fn single_task_goes_to_fastest_processor() {
        let mut dag = DAG::new();
        dag.add_task(vec![9, 4, 7]);
        let schedule = HeftScheduler::new().schedule(&dag, 3).unwrap();
        assert_eq!(schedule.get(1).unwrap().processor, 1);
        assert_eq!(schedule.makespan(), 4);
    }

    #[test]
    fn independent_tasks_spread_over_processors() {
        let mut dag = DAG::new();
        for _ in 0..4 {
            dag.add_task(vec![5, 5]);
        }
        let schedule = HeftScheduler::new().schedule(&dag, 2).unwrap();
        assert_eq!(schedule.makespan(), 10);
        assert_eq!(schedule.processor_tasks(0).len(), 2);
        assert_eq!(schedule.processor_tasks(1).len(), 2);
    }

    #[test]
    fn malformed_graph_is_rejected() {
        let mut dag = DAG::new();
        let a = dag.add_task(vec![1, 1]);
        let b = dag.add_task(vec![1, 1]);
        dag.add_dependency(a, b, costs(1)).unwrap();
        dag.add_dependency(b, a, costs(1)).unwrap();
        assert!(matches!(HeftScheduler::new().schedule(&dag, 2), Err(Error::Cycle { .. })));
        assert!(matches!(
            HeftScheduler::new().schedule(&dag, 3),
            Err(Error::ComputationTimesLength { .. })
        ));
    }

    #[test]
    fn single_processor_with_edges_fails() {
        let mut dag = DAG::new();
        let a = dag.add_task(vec![1]);
        let b = dag.add_task(vec![1]);
        dag.add_dependency(a, b, vec![vec![0]]).unwrap();
        assert!(matches!(
            HeftScheduler::new().schedule(&dag, 1),
            Err(Error::NoCrossProcessorEntries { task: 1, child: 2 })
        ));
    }
}
