//! Errors reported by graph validation, loading and scheduling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("task graph contains a cycle through task {task}")]
    Cycle { task: usize },

    #[error("edge {parent} -> {child} is not declared on both sides")]
    AsymmetricEdge { parent: usize, child: usize },

    #[error("task {task} has {actual} computation times, expected {expected}")]
    ComputationTimesLength { task: usize, expected: usize, actual: usize },

    #[error("task {task} has zero computation time on processor {processor}")]
    NonPositiveComputationTime { task: usize, processor: usize },

    #[error("no communication costs given for edge {parent} -> {child}")]
    MissingCommunicationCost { parent: usize, child: usize },

    #[error("communication costs for edge {parent} -> {child} must be a {expected}x{expected} matrix")]
    CommunicationMatrixShape {
        parent: usize,
        child: usize,
        expected: usize,
    },

    #[error("unknown task {task}")]
    UnknownTask { task: usize },

    #[error("task ids must be 1..={expected}, found {actual}")]
    NonDenseIds { expected: usize, actual: usize },

    #[error("processor pool is empty")]
    NoProcessors,

    #[error("workload {workload} was built for {actual} processors, pool has {expected}")]
    ProcessorCountMismatch {
        workload: usize,
        expected: usize,
        actual: usize,
    },

    #[error("workload {workload} is admitted twice")]
    DuplicateWorkload { workload: usize },

    #[error("task {task} is placed before its predecessor {predecessor}")]
    UnscheduledPredecessor { task: usize, predecessor: usize },

    #[error("task {task} is already scheduled")]
    AlreadyScheduled { task: usize },

    #[error("average communication {task} -> {child} is undefined without cross-processor costs")]
    NoCrossProcessorEntries { task: usize, child: usize },

    #[error("time {context} exceeds the representable range")]
    TimeOverflow { context: &'static str },

    #[error("can't read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("can't parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("can't resolve scheduler from {0}")]
    InvalidSchedulerParams(String),
}

pub type Result<T> = std::result::Result<T, Error>;
