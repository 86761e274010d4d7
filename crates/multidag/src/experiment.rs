//! Tool for running several multi-workload policies over the same set of workloads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;

use crate::dag::DAG;
use crate::error::Result;
use crate::multi_scheduler::WorkloadStats;
use crate::schedule::Schedule;
use crate::scheduler_resolver::{SchedulerParams, SchedulerResolver};
use crate::workload::{admit_workloads, Admission, Workload, WorkloadInput};
use crate::Time;

/// Contains result of one policy run.
#[derive(Serialize, Debug)]
pub struct RunResult {
    pub scheduler: String,
    /// Finish time of the last task over all workloads.
    pub makespan: Time,
    pub workloads: Vec<WorkloadStats>,
    /// Workloads rejected at admission or abandoned during scheduling.
    pub failed: BTreeMap<usize, String>,
    pub schedules: BTreeMap<usize, Schedule>,
}

#[derive(Deserialize)]
struct WorkloadConfig {
    dag: PathBuf,
    #[serde(default)]
    release_time: Option<Time>,
}

/// Random release times for workloads which don't specify one.
#[derive(Deserialize)]
struct ReleaseTimesConfig {
    #[serde(default = "default_seed")]
    seed: u64,
    max: Time,
}

fn default_seed() -> u64 {
    123
}

#[derive(Deserialize)]
struct ExperimentConfig {
    processors: usize,
    workloads: Vec<WorkloadConfig>,
    release_times: Option<ReleaseTimesConfig>,
    schedulers: Vec<String>,
}

pub struct Experiment {
    processors: usize,
    workloads: Arc<Vec<Workload>>,
    rejected: BTreeMap<usize, String>,
    schedulers: Vec<SchedulerParams>,
    scheduler_resolver: SchedulerResolver,
}

impl Experiment {
    /// Creates experiment over admitted workloads.
    pub fn new(
        processors: usize,
        admission: Admission,
        schedulers: &[&str],
        scheduler_resolver: SchedulerResolver,
    ) -> Result<Self> {
        let schedulers = schedulers
            .iter()
            .map(|s| -> Result<SchedulerParams> {
                let params = s.parse::<SchedulerParams>()?;
                scheduler_resolver(&params)?;
                Ok(params)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            processors,
            workloads: Arc::new(admission.workloads),
            rejected: admission
                .rejected
                .into_iter()
                .map(|(id, e)| (id, e.to_string()))
                .collect(),
            schedulers,
            scheduler_resolver,
        })
    }

    /// Loads config from a YAML file, DAG paths are relative to the config location.
    ///
    /// Workloads get ids in the order they are listed, starting from 0.
    pub fn load<P: AsRef<Path>>(config_path: P, scheduler_resolver: SchedulerResolver) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config: ExperimentConfig = serde_yaml::from_str(&std::fs::read_to_string(config_path)?)?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

        let mut rng = config
            .release_times
            .as_ref()
            .map(|release_times| (Pcg64::seed_from_u64(release_times.seed), release_times.max));
        let mut inputs = Vec::new();
        let mut unreadable = BTreeMap::new();
        for (id, workload) in config.workloads.into_iter().enumerate() {
            let release_time = match (workload.release_time, rng.as_mut()) {
                (Some(release_time), _) => release_time,
                (None, Some((rng, max))) => rng.gen_range(0..=*max),
                (None, None) => 0,
            };
            match DAG::from_file(base_dir.join(&workload.dag)) {
                Ok(dag) => inputs.push(WorkloadInput { id, dag, release_time }),
                Err(e) => {
                    log::warn!("can't load DAG {}: {}", workload.dag.display(), e);
                    unreadable.insert(id, e);
                }
            }
        }

        let mut admission = admit_workloads(inputs, config.processors);
        admission.rejected.extend(unreadable);
        let schedulers = config.schedulers.iter().map(|s| s.as_str()).collect::<Vec<_>>();
        Self::new(config.processors, admission, &schedulers, scheduler_resolver)
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    /// Runs every configured scheduler, results are sorted by scheduler name.
    pub fn run(self, num_threads: usize) -> Vec<RunResult> {
        let total_runs = self.schedulers.len();
        let finished_runs = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = mpsc::channel();

        let pool = ThreadPool::new(num_threads.max(1));
        let start_time = Instant::now();
        for params in self.schedulers.into_iter() {
            let finished_runs = finished_runs.clone();
            let sender = sender.clone();
            let workloads = self.workloads.clone();
            let rejected = self.rejected.clone();
            let processors = self.processors;
            let resolver = self.scheduler_resolver;
            pool.execute(move || {
                let scheduler = match resolver(&params) {
                    Ok(scheduler) => scheduler,
                    Err(e) => {
                        log::error!("can't resolve scheduler {}: {}", params, e);
                        return;
                    }
                };
                let schedule = scheduler.schedule(&workloads, processors);

                let mut failed = rejected;
                failed.extend(schedule.failed.iter().map(|(&id, e)| (id, e.to_string())));
                let run = RunResult {
                    scheduler: params.to_string(),
                    makespan: schedule.makespan(),
                    workloads: schedule.workload_stats(&workloads),
                    failed,
                    schedules: schedule.schedules,
                };
                if sender.send(run).is_err() {
                    log::error!("results receiver is gone");
                }

                let finished = finished_runs.fetch_add(1, Ordering::SeqCst) + 1;
                log::info!(
                    "finished {}/{} runs in {:.2?}",
                    finished,
                    total_runs,
                    start_time.elapsed()
                );
            });
        }

        pool.join();
        drop(sender);

        let mut result = receiver.iter().collect::<Vec<RunResult>>();
        result.sort_by(|a, b| a.scheduler.cmp(&b.scheduler));
        result
    }
}
