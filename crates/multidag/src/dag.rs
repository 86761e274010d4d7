//! Task graph.

use std::collections::VecDeque;
use std::path::Path;

use crate::error::{Error, Result};
use crate::task::Task;
use crate::Time;

/// Immutable-by-convention task graph with ids numbered densely from 1.
#[derive(Clone, Debug, Default)]
pub struct DAG {
    tasks: Vec<Task>,
}

impl DAG {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Builds a graph from already linked task records.
    ///
    /// Checks that ids are exactly `1..=N` and that every edge is declared on both ends.
    pub fn from_tasks(mut tasks: Vec<Task>) -> Result<Self> {
        tasks.sort_by_key(|task| task.id);
        for (index, task) in tasks.iter().enumerate() {
            if task.id != index + 1 {
                return Err(Error::NonDenseIds {
                    expected: tasks.len(),
                    actual: task.id,
                });
            }
        }
        let dag = Self { tasks };
        dag.check_symmetry()?;
        Ok(dag)
    }

    /// Reads graph from a YAML or JSON file depending on its extension.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        match file.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(file),
            Some("json") => Self::from_json(file),
            _ => Err(Error::UnsupportedFormat(file.display().to_string())),
        }
    }

    /// Adds task and returns its id.
    pub fn add_task(&mut self, computation_times: Vec<Time>) -> usize {
        let id = self.tasks.len() + 1;
        self.tasks.push(Task::new(id, computation_times));
        id
    }

    /// Adds edge `parent -> child` on both of its ends.
    pub fn add_dependency(&mut self, parent: usize, child: usize, communication_costs: Vec<Vec<Time>>) -> Result<()> {
        self.task(child)?;
        self.task_mut(parent)?.add_child(child, communication_costs);
        self.task_mut(child)?.add_father(parent);
        Ok(())
    }

    /// Returns task by id, panics on unknown id.
    pub fn get_task(&self, task_id: usize) -> &Task {
        &self.tasks[task_id - 1]
    }

    pub fn task(&self, task_id: usize) -> Result<&Task> {
        task_id
            .checked_sub(1)
            .and_then(|index| self.tasks.get(index))
            .ok_or(Error::UnknownTask { task: task_id })
    }

    fn task_mut(&mut self, task_id: usize) -> Result<&mut Task> {
        task_id
            .checked_sub(1)
            .and_then(|index| self.tasks.get_mut(index))
            .ok_or(Error::UnknownTask { task: task_id })
    }

    pub fn get_tasks(&self) -> &Vec<Task> {
        &self.tasks
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Checks that the graph can be scheduled on `processors` processors.
    pub fn validate(&self, processors: usize) -> Result<()> {
        if processors == 0 {
            return Err(Error::NoProcessors);
        }
        self.check_symmetry()?;
        for task in self.tasks.iter() {
            if task.computation_times.len() != processors {
                return Err(Error::ComputationTimesLength {
                    task: task.id,
                    expected: processors,
                    actual: task.computation_times.len(),
                });
            }
            if let Some(processor) = task.computation_times.iter().position(|&time| time == 0) {
                return Err(Error::NonPositiveComputationTime {
                    task: task.id,
                    processor,
                });
            }
            for &child in task.children.iter() {
                let costs = task
                    .communication_costs
                    .get(&child)
                    .ok_or(Error::MissingCommunicationCost { parent: task.id, child })?;
                if costs.len() != processors || costs.iter().any(|row| row.len() != processors) {
                    return Err(Error::CommunicationMatrixShape {
                        parent: task.id,
                        child,
                        expected: processors,
                    });
                }
            }
        }
        self.topsort().map(|_| ())
    }

    /// Returns task ids in topological order (Kahn's algorithm, smaller ids first among ready tasks).
    pub fn topsort(&self) -> Result<Vec<usize>> {
        let mut in_degree = self.tasks.iter().map(|task| task.fathers.len()).collect::<Vec<_>>();
        let mut queue = self
            .tasks
            .iter()
            .filter(|task| task.fathers.is_empty())
            .map(|task| task.id)
            .collect::<VecDeque<_>>();
        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(task_id) = queue.pop_front() {
            order.push(task_id);
            for &child in self.get_task(task_id).children.iter() {
                in_degree[child - 1] -= 1;
                if in_degree[child - 1] == 0 {
                    queue.push_back(child);
                }
            }
        }
        if order.len() != self.tasks.len() {
            let task = in_degree.iter().position(|&d| d > 0).map_or(0, |index| index + 1);
            return Err(Error::Cycle { task });
        }
        Ok(order)
    }

    fn check_symmetry(&self) -> Result<()> {
        for task in self.tasks.iter() {
            for &child in task.children.iter() {
                if !self.task(child)?.fathers.contains(&task.id) {
                    return Err(Error::AsymmetricEdge { parent: task.id, child });
                }
            }
            for &father in task.fathers.iter() {
                if !self.task(father)?.children.contains(&task.id) {
                    return Err(Error::AsymmetricEdge {
                        parent: father,
                        child: task.id,
                    });
                }
            }
        }
        Ok(())
    }
}
