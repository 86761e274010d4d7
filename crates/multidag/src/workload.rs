//! DAG instances competing for one processor pool.

use std::collections::BTreeMap;

use crate::dag::DAG;
use crate::error::{Error, Result};
use crate::rank::{ranked_tasks, RankedTask};
use crate::schedule::Schedule;
use crate::schedulers::heft::HeftScheduler;
use crate::Time;

/// Admitted DAG with its arrival time, rank order and isolated HEFT schedule.
///
/// Everything is derived once at admission and is read-only afterwards, so the rank order, the lowerbound and
/// the isolated schedule always describe the same graph and pool size:
///
/// ```compile_fail
/// # use multidag::dag::DAG;
/// # use multidag::workload::Workload;
/// let mut dag = DAG::new();
/// dag.add_task(vec![5, 5]);
/// let mut workload = Workload::new(1, dag, 2, 0).unwrap();
/// workload.lowerbound = 0;
/// ```
#[derive(Clone, Debug)]
pub struct Workload {
    id: usize,
    dag: DAG,
    processors: usize,
    release_time: Time,
    ranks: Vec<RankedTask>,
    lowerbound: Time,
    isolated: Schedule,
}

impl Workload {
    /// Validates and ranks the graph and computes its lowerbound.
    pub fn new(id: usize, dag: DAG, processors: usize, release_time: Time) -> Result<Self> {
        dag.validate(processors)?;
        let ranks = ranked_tasks(&dag)?;
        let isolated = HeftScheduler::new().schedule_ranked(&dag, &ranks, processors)?;
        let lowerbound = isolated.makespan();
        log::info!(
            "admitted workload {} ({} tasks) released at {} with lowerbound {}",
            id,
            dag.task_count(),
            release_time,
            lowerbound
        );
        Ok(Self {
            id,
            dag,
            processors,
            release_time,
            ranks,
            lowerbound,
            isolated,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn dag(&self) -> &DAG {
        &self.dag
    }

    /// Pool size the workload was validated and ranked for.
    pub fn processors(&self) -> usize {
        self.processors
    }

    /// Earliest time any task of this workload may start.
    pub fn release_time(&self) -> Time {
        self.release_time
    }

    /// Tasks ordered by descending rank.
    pub fn ranks(&self) -> &[RankedTask] {
        &self.ranks
    }

    /// Makespan of the workload scheduled alone on the whole pool.
    pub fn lowerbound(&self) -> Time {
        self.lowerbound
    }

    /// HEFT schedule of this workload alone on idle processors, starting at time 0.
    pub fn isolated_schedule(&self) -> &Schedule {
        &self.isolated
    }

    pub fn task_count(&self) -> usize {
        self.dag.task_count()
    }
}

/// Workload description supplied by a driver.
#[derive(Clone, Debug)]
pub struct WorkloadInput {
    pub id: usize,
    pub dag: DAG,
    pub release_time: Time,
}

/// Result of admitting a batch of workloads.
#[derive(Debug, Default)]
pub struct Admission {
    /// Admitted workloads ordered by id.
    pub workloads: Vec<Workload>,
    /// One error per rejected workload.
    pub rejected: BTreeMap<usize, Error>,
}

/// Admits every well-formed workload, malformed ones do not affect the others.
pub fn admit_workloads(inputs: Vec<WorkloadInput>, processors: usize) -> Admission {
    let mut admission = Admission::default();
    for input in inputs.into_iter() {
        if admission.workloads.iter().any(|w| w.id() == input.id) || admission.rejected.contains_key(&input.id) {
            log::warn!("workload {} is admitted twice", input.id);
            admission
                .rejected
                .insert(input.id, Error::DuplicateWorkload { workload: input.id });
            continue;
        }
        match Workload::new(input.id, input.dag, processors, input.release_time) {
            Ok(workload) => admission.workloads.push(workload),
            Err(e) => {
                log::warn!("workload {} is rejected: {}", input.id, e);
                admission.rejected.insert(input.id, e);
            }
        }
    }
    admission.workloads.sort_by_key(|w| w.id());
    admission
}
