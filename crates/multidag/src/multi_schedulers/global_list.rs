//! List scheduling of all workloads on shared processor timelines.
//!
//! The simulation proceeds in rounds. The round time is the maximum of the smallest release time among
//! workloads with unscheduled tasks and the latest finish time committed so far. Every workload released by
//! the round time contributes exactly one task, the next one in its rank order, tagged with its rank plus the
//! workload release time. Candidates are then placed by earliest finish time on the shared timelines in tag
//! order: descending for FDWS, ascending for the rank hybrid heuristic.
//!
//! Drawing one task per workload per round bounds how far a single workload can get ahead of the others
//! within a round, even if more of its tasks are ready. Precedence is still enforced by the placement itself,
//! which uses actual predecessor finish times and may start a task after the round time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::multi_scheduler::{matching_workloads, MultiSchedule, MultiScheduler};
use crate::schedule::Schedule;
use crate::scheduler_resolver::SchedulerParams;
use crate::schedulers::common::place_task;
use crate::timeline::Timeline;
use crate::workload::Workload;
use crate::Time;

/// Direction in which round candidates are ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    /// Highest rank first (FDWS).
    High,
    /// Lowest rank first (rank hybrid).
    Low,
}

impl std::str::FromStr for RankOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(RankOrder::High),
            "low" => Ok(RankOrder::Low),
            _ => Err(Error::InvalidSchedulerParams(format!("order={s}"))),
        }
    }
}

/// Task drawn from a workload in the current round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Task rank plus workload release time.
    pub priority: f64,
    /// Position of the workload in the simulation, not its id.
    pub workload_index: usize,
    pub task: usize,
}

pub struct GlobalListScheduler {
    order: RankOrder,
}

impl GlobalListScheduler {
    pub fn new(order: RankOrder) -> Self {
        Self { order }
    }

    /// Fairness-driven workflow scheduling: high priority candidates first.
    pub fn fdws() -> Self {
        Self::new(RankOrder::High)
    }

    /// Rank hybrid: low priority candidates first.
    pub fn rank_hybrid() -> Self {
        Self::new(RankOrder::Low)
    }

    pub fn from_params(params: &SchedulerParams) -> Result<Self> {
        let order = params.get::<RankOrder>("order")?.unwrap_or(RankOrder::High);
        Ok(Self::new(order))
    }

    pub fn order(&self) -> RankOrder {
        self.order
    }
}

impl MultiScheduler for GlobalListScheduler {
    fn schedule(&self, workloads: &[Workload], processors: usize) -> MultiSchedule {
        let mut sim = ListSimulation::new(workloads, processors, self.order);
        let mut rounds = 0;
        while sim.step() {
            rounds += 1;
        }
        let result = sim.into_result();
        log::info!("finished in {} rounds, total makespan: {}", rounds, result.makespan());
        result
    }
}

/// State of the global list simulation between rounds.
pub struct ListSimulation<'a> {
    workloads: Vec<&'a Workload>,
    order: RankOrder,
    /// Position of the next task in each workload's rank order.
    cursors: Vec<usize>,
    timelines: Vec<Timeline>,
    schedules: Vec<Schedule>,
    failed: BTreeMap<usize, Error>,
    latest_finish: Option<Time>,
}

impl<'a> ListSimulation<'a> {
    /// Starts a simulation on idle processors.
    ///
    /// Workloads built for another pool size or sharing an id are reported as failed right away.
    pub fn new(workloads: &'a [Workload], processors: usize, order: RankOrder) -> Self {
        let mut failed = BTreeMap::new();
        let workloads = matching_workloads(workloads, processors, &mut failed);
        let count = workloads.len();
        Self {
            workloads,
            order,
            cursors: vec![0; count],
            timelines: vec![Timeline::new(); processors],
            schedules: vec![Schedule::new(); count],
            failed,
            latest_finish: None,
        }
    }

    fn has_pending_tasks(&self, index: usize) -> bool {
        self.cursors[index] < self.workloads[index].ranks().len()
    }

    /// Time of the next round, `None` when every workload is exhausted.
    pub fn round_time(&self) -> Option<Time> {
        let earliest_release = (0..self.workloads.len())
            .filter(|&index| self.has_pending_tasks(index))
            .map(|index| self.workloads[index].release_time())
            .min()?;
        Some(earliest_release.max(self.latest_finish.unwrap_or(0)))
    }

    /// Pops one task from every workload released by `round_time` and orders the result.
    pub fn draw_candidates(&mut self, round_time: Time) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for index in 0..self.workloads.len() {
            let workload = self.workloads[index];
            if workload.release_time() > round_time || !self.has_pending_tasks(index) {
                continue;
            }
            let ranked = workload.ranks()[self.cursors[index]];
            self.cursors[index] += 1;
            candidates.push(Candidate {
                priority: ranked.rank + workload.release_time() as f64,
                workload_index: index,
                task: ranked.task,
            });
        }
        let order = self.order;
        let workloads = &self.workloads;
        candidates.sort_by(|a, b| {
            let by_priority = match order {
                RankOrder::High => b.priority.total_cmp(&a.priority),
                RankOrder::Low => a.priority.total_cmp(&b.priority),
            };
            by_priority.then(workloads[a.workload_index].id().cmp(&workloads[b.workload_index].id()))
        });
        candidates
    }

    /// Places candidates one by one in the given order on the shared timelines.
    pub fn place_candidates(&mut self, candidates: &[Candidate]) {
        for candidate in candidates.iter() {
            let index = candidate.workload_index;
            let workload = match self.workloads.get(index) {
                Some(&workload) => workload,
                None => {
                    log::warn!("skipping candidate of unknown workload index {}", index);
                    continue;
                }
            };
            if self.failed.contains_key(&workload.id()) {
                continue;
            }
            match place_task(
                workload.dag(),
                workload.id(),
                candidate.task,
                &mut self.schedules[index],
                &mut self.timelines,
                workload.release_time(),
            ) {
                Ok(placed) => {
                    self.latest_finish = Some(self.latest_finish.map_or(placed.finish, |t| t.max(placed.finish)));
                }
                Err(e) => {
                    log::warn!("abandoning workload {}: {}", workload.id(), e);
                    self.cursors[index] = workload.ranks().len();
                    self.schedules[index] = Schedule::new();
                    self.failed.insert(workload.id(), e);
                }
            }
        }
    }

    /// Runs one round, returns `false` when there was nothing left to schedule.
    pub fn step(&mut self) -> bool {
        let round_time = match self.round_time() {
            Some(time) => time,
            None => return false,
        };
        let candidates = self.draw_candidates(round_time);
        if candidates.is_empty() {
            return false;
        }
        log::debug!("round at {}: {} candidates", round_time, candidates.len());
        self.place_candidates(&candidates);
        true
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    /// Schedule built so far for the workload with given id.
    pub fn schedule_of(&self, workload_id: usize) -> Option<&Schedule> {
        self.workloads
            .iter()
            .position(|w| w.id() == workload_id)
            .map(|index| &self.schedules[index])
    }

    pub fn into_result(self) -> MultiSchedule {
        let failed = self.failed;
        let schedules = self
            .workloads
            .iter()
            .zip(self.schedules)
            .filter(|(workload, _)| !failed.contains_key(&workload.id()))
            .map(|(workload, schedule)| (workload.id(), schedule))
            .collect();
        MultiSchedule { schedules, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::DAG;

    fn chain(len: usize, time: Time) -> DAG {
        let mut dag = DAG::new();
        let mut prev = dag.add_task(vec![time, time]);
        for _ in 1..len {
            let next = dag.add_task(vec![time, time]);
            dag.add_dependency(prev, next, vec![vec![0, 4], vec![4, 0]]).unwrap();
            prev = next;
        }
        dag
    }

    #[test]
    fn one_task_per_workload_per_round() {
        let workloads = vec![
            Workload::new(1, chain(3, 5), 2, 0).unwrap(),
            Workload::new(2, chain(2, 5), 2, 0).unwrap(),
        ];
        let mut sim = ListSimulation::new(&workloads, 2, RankOrder::High);
        assert_eq!(sim.round_time(), Some(0));
        let candidates = sim.draw_candidates(0);
        assert_eq!(
            candidates.iter().map(|c| (c.workload_index, c.task)).collect::<Vec<_>>(),
            vec![(0, 1), (1, 1)]
        );
        sim.place_candidates(&candidates);
        assert_eq!(sim.round_time(), Some(5));
        assert!(sim.step());
        assert_eq!(sim.schedule_of(1).unwrap().len(), 2);
        assert_eq!(sim.schedule_of(2).unwrap().len(), 2);
        // only the first workload has tasks left
        let candidates = sim.draw_candidates(sim.round_time().unwrap());
        assert_eq!(candidates.len(), 1);
        sim.place_candidates(&candidates);
        assert!(!sim.step());
    }

    #[test]
    fn unreleased_workload_waits() {
        let workloads = vec![
            Workload::new(1, chain(1, 5), 2, 0).unwrap(),
            Workload::new(2, chain(1, 5), 2, 50).unwrap(),
        ];
        let mut sim = ListSimulation::new(&workloads, 2, RankOrder::High);
        assert_eq!(sim.draw_candidates(0).len(), 1);
        sim.place_candidates(&[Candidate {
            priority: 5.,
            workload_index: 0,
            task: 1,
        }]);
        // the first workload is exhausted, so the round jumps to the second release
        assert_eq!(sim.round_time(), Some(50));
        assert!(sim.step());
        assert_eq!(sim.schedule_of(2).unwrap().start(), 50);
        assert_eq!(sim.round_time(), None);
    }

    #[test]
    fn candidate_order_follows_direction() {
        let workloads = vec![
            Workload::new(1, chain(1, 5), 2, 0).unwrap(),
            Workload::new(2, chain(1, 9), 2, 0).unwrap(),
        ];
        let mut high = ListSimulation::new(&workloads, 2, RankOrder::High);
        let order = high.draw_candidates(0).iter().map(|c| c.workload_index).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 0]);
        let mut low = ListSimulation::new(&workloads, 2, RankOrder::Low);
        let order = low.draw_candidates(0).iter().map(|c| c.workload_index).collect::<Vec<_>>();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn tasks_never_start_before_release() {
        let workloads = vec![
            Workload::new(1, chain(2, 5), 2, 0).unwrap(),
            Workload::new(2, chain(2, 5), 2, 3).unwrap(),
        ];
        let result = GlobalListScheduler::fdws().schedule(&workloads, 2);
        assert!(result.failed.is_empty());
        assert!(result.schedules[&2].iter().all(|t| t.start >= 3));
    }

    #[test]
    fn failed_placement_abandons_workload() {
        let workloads = vec![
            Workload::new(1, chain(2, 5), 2, 0).unwrap(),
            Workload::new(2, chain(2, 5), 2, 0).unwrap(),
        ];
        let mut sim = ListSimulation::new(&workloads, 2, RankOrder::High);
        let mut candidates = sim.draw_candidates(0);
        assert_eq!(candidates[0].workload_index, 0);
        // second task of the first chain before its predecessor
        candidates[0].task = 2;
        sim.place_candidates(&candidates);
        assert!(sim.schedule_of(1).unwrap().is_empty());
        assert_eq!(sim.schedule_of(2).unwrap().len(), 1);

        while sim.step() {}
        assert_eq!(sim.timelines().iter().map(|t| t.len()).sum::<usize>(), 2);
        let result = sim.into_result();
        assert!(matches!(
            result.failed[&1],
            Error::UnscheduledPredecessor { task: 2, predecessor: 1 }
        ));
        assert!(!result.schedules.contains_key(&1));
        assert_eq!(result.schedules[&2].len(), 2);
    }

    #[test]
    fn duplicate_ids_and_foreign_pools_fail_upfront() {
        let mut wide = DAG::new();
        wide.add_task(vec![5, 5, 5]);
        let workloads = vec![
            Workload::new(1, chain(2, 5), 2, 0).unwrap(),
            Workload::new(1, chain(1, 5), 2, 0).unwrap(),
            Workload::new(2, chain(1, 5), 2, 0).unwrap(),
            Workload::new(3, wide, 3, 0).unwrap(),
        ];
        let mut sim = ListSimulation::new(&workloads, 2, RankOrder::Low);
        assert!(sim.schedule_of(1).is_none());
        while sim.step() {}
        let result = sim.into_result();
        assert_eq!(result.schedules.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert!(matches!(result.failed[&1], Error::DuplicateWorkload { workload: 1 }));
        assert!(matches!(
            result.failed[&3],
            Error::ProcessorCountMismatch { workload: 3, expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn foreign_candidates_do_not_panic() {
        let workloads = vec![
            Workload::new(1, chain(1, 5), 2, 0).unwrap(),
            Workload::new(2, chain(1, 5), 2, 0).unwrap(),
        ];
        let mut sim = ListSimulation::new(&workloads, 2, RankOrder::High);
        sim.place_candidates(&[
            Candidate {
                priority: 1.,
                workload_index: 9,
                task: 1,
            },
            Candidate {
                priority: 1.,
                workload_index: 0,
                task: 7,
            },
            Candidate {
                priority: 1.,
                workload_index: 1,
                task: 1,
            },
        ]);
        assert_eq!(sim.timelines().iter().map(|t| t.len()).sum::<usize>(), 1);
        let result = sim.into_result();
        assert!(matches!(result.failed[&1], Error::UnknownTask { task: 7 }));
        assert_eq!(result.schedules[&2].len(), 1);
    }

    #[test]
    fn params() {
        let params = "GlobalList[order=low]".parse::<SchedulerParams>().unwrap();
        assert_eq!(GlobalListScheduler::from_params(&params).unwrap().order(), RankOrder::Low);
        let params = "GlobalList".parse::<SchedulerParams>().unwrap();
        assert_eq!(GlobalListScheduler::from_params(&params).unwrap().order(), RankOrder::High);
        let params = "GlobalList[order=sideways]".parse::<SchedulerParams>().unwrap();
        assert!(GlobalListScheduler::from_params(&params).is_err());
    }
}
