//! Multi-workload scheduling policies.

pub mod global_list;
pub mod min_lowerbound;
