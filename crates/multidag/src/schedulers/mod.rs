//! Single-DAG scheduler implementations.

pub mod common;
pub mod heft;
