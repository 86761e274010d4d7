use std::path::Path;

use crate::dag::DAG;
use crate::error::Result;
use crate::parsers::schema::DagFile;

impl DAG {
    /// Reads DAG from a JSON file with the same layout as the YAML one.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(file)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: DagFile = serde_json::from_str(json)?;
        file.into_dag()
    }
}
