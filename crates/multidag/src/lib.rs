#![doc = include_str!("../README.md")]

pub mod dag;
pub mod error;
pub mod experiment;
pub mod multi_scheduler;
pub mod multi_schedulers;
pub mod parsers;
pub mod rank;
pub mod schedule;
pub mod scheduler_resolver;
pub mod schedulers;
pub mod task;
pub mod timeline;
pub mod workload;

pub use error::{Error, Result};

/// Integer point in time or duration.
pub type Time = u64;
