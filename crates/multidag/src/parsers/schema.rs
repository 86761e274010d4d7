use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dag::DAG;
use crate::error::{Error, Result};
use crate::task::Task;
use crate::Time;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Edge {
    pub id: usize,
    pub communication_costs: Vec<Vec<Time>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TaskEntry {
    pub id: usize,
    pub computation_times: Vec<Time>,
    #[serde(default = "Vec::new")]
    pub children: Vec<Edge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DagFile {
    pub tasks: Vec<TaskEntry>,
}

impl DagFile {
    /// Fathers are derived from the declared children.
    pub fn into_dag(self) -> Result<DAG> {
        let mut tasks = Vec::with_capacity(self.tasks.len());
        let mut edges = Vec::new();
        for entry in self.tasks.into_iter() {
            for edge in entry.children.into_iter() {
                edges.push((entry.id, edge.id, edge.communication_costs));
            }
            tasks.push(Task::new(entry.id, entry.computation_times));
        }
        let index: HashMap<usize, usize> = tasks.iter().enumerate().map(|(i, task)| (task.id, i)).collect();
        for (parent, child, costs) in edges.into_iter() {
            let &child_index = index.get(&child).ok_or(Error::UnknownTask { task: child })?;
            tasks[index[&parent]].add_child(child, costs);
            tasks[child_index].add_father(parent);
        }
        DAG::from_tasks(tasks)
    }
}
