//! DAG file parsers.

pub mod json_parser;
mod schema;
pub mod yaml_parser;
