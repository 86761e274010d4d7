use std::path::Path;

use crate::dag::DAG;
use crate::error::Result;
use crate::parsers::schema::DagFile;

impl DAG {
    /// Reads DAG from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(file)?)
    }

    /// Parses DAG from YAML text, see the crate docs for the format.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: DagFile = serde_yaml::from_str(yaml)?;
        file.into_dag()
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::DAG;
    use crate::error::Error;

    const DIAMOND: &str = r#"
tasks:
  - id: 1
    computation_times: [4, 6]
    children:
      - id: 2
        communication_costs: [[0, 2], [2, 0]]
      - id: 3
        communication_costs: [[0, 3], [3, 0]]
  - id: 2
    computation_times: [5, 5]
    children:
      - id: 4
        communication_costs: [[0, 1], [1, 0]]
  - id: 3
    computation_times: [7, 3]
    children:
      - id: 4
        communication_costs: [[0, 1], [1, 0]]
  - id: 4
    computation_times: [2, 2]
"#;

    #[test]
    fn diamond() {
        let dag = DAG::from_yaml_str(DIAMOND).unwrap();
        assert_eq!(dag.task_count(), 4);
        assert!(dag.validate(2).is_ok());
        assert_eq!(dag.get_task(4).fathers.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(dag.get_task(1).communication_cost(3, 0, 1).unwrap(), 3);
    }

    #[test]
    fn unknown_child() {
        let yaml = r#"
tasks:
  - id: 1
    computation_times: [1]
    children:
      - id: 5
        communication_costs: [[0]]
"#;
        assert!(matches!(DAG::from_yaml_str(yaml), Err(Error::UnknownTask { task: 5 })));
    }

    #[test]
    fn broken_yaml() {
        assert!(matches!(DAG::from_yaml_str("tasks: [{ id: x }]"), Err(Error::Yaml(_))));
    }
}
