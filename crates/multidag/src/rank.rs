//! Upward ranks of DAG tasks.
//!
//! The rank of a task is its average computation time plus the most expensive path to any exit task, where
//! every edge on the path costs its average cross-processor communication time. Sorting tasks by descending
//! rank gives a topological order since a parent's rank always exceeds the rank of each of its children.

use std::collections::btree_set;

use serde::Serialize;

use crate::dag::DAG;
use crate::error::{Error, Result};

/// Task together with its rank.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RankedTask {
    pub rank: f64,
    pub task: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Computes ranks of all tasks, `ranks[id - 1]` being the rank of task `id`.
///
/// Uses an explicit post-order traversal, so deep graphs do not grow the call stack. Each rank is computed
/// exactly once, reaching a task that is still in progress means the graph has a cycle.
pub fn calc_ranks(dag: &DAG) -> Result<Vec<f64>> {
    let total_tasks = dag.task_count();
    let mut marks = vec![Mark::Unvisited; total_tasks];
    let mut ranks = vec![0.; total_tasks];
    let mut stack: Vec<(usize, btree_set::Iter<usize>)> = Vec::new();

    for root in 1..=total_tasks {
        if marks[root - 1] != Mark::Unvisited {
            continue;
        }
        marks[root - 1] = Mark::InProgress;
        stack.push((root, dag.get_task(root).children.iter()));

        while let Some((task_id, children)) = stack.last_mut() {
            let task_id = *task_id;
            match children.next().copied() {
                Some(child) => {
                    let child_task = dag.task(child)?;
                    match marks[child - 1] {
                        Mark::Done => {}
                        Mark::InProgress => return Err(Error::Cycle { task: child }),
                        Mark::Unvisited => {
                            marks[child - 1] = Mark::InProgress;
                            stack.push((child, child_task.children.iter()));
                        }
                    }
                }
                None => {
                    stack.pop();
                    ranks[task_id - 1] = rank_from_children(dag, task_id, &ranks)?;
                    marks[task_id - 1] = Mark::Done;
                    log::trace!("rank of task {} is {:.3}", task_id, ranks[task_id - 1]);
                }
            }
        }
    }

    Ok(ranks)
}

fn rank_from_children(dag: &DAG, task_id: usize, ranks: &[f64]) -> Result<f64> {
    let task = dag.get_task(task_id);
    let mut tail: f64 = 0.;
    for &child in task.children.iter() {
        tail = tail.max(task.average_communication(child)? + ranks[child - 1]);
    }
    Ok(task.average_computation() + tail)
}

/// Returns tasks ordered by descending rank, ties broken by smaller id.
pub fn ranked_tasks(dag: &DAG) -> Result<Vec<RankedTask>> {
    let ranks = calc_ranks(dag)?;
    let mut result = ranks
        .into_iter()
        .enumerate()
        .map(|(index, rank)| RankedTask { rank, task: index + 1 })
        .collect::<Vec<_>>();
    result.sort_by(|a, b| b.rank.total_cmp(&a.rank).then(a.task.cmp(&b.task)));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Time;

    fn costs(cross: Time) -> Vec<Vec<Time>> {
        vec![vec![0, cross], vec![cross, 0]]
    }

    #[test]
    fn chain() {
        let mut dag = DAG::new();
        let a = dag.add_task(vec![10, 10]);
        let b = dag.add_task(vec![10, 10]);
        let c = dag.add_task(vec![10, 10]);
        dag.add_dependency(a, b, costs(5)).unwrap();
        dag.add_dependency(b, c, costs(5)).unwrap();
        assert_eq!(calc_ranks(&dag).unwrap(), vec![40., 25., 10.]);
        let order = ranked_tasks(&dag).unwrap().iter().map(|r| r.task).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn takes_most_expensive_child() {
        let mut dag = DAG::new();
        let entry = dag.add_task(vec![2, 4]);
        let cheap = dag.add_task(vec![1, 1]);
        let heavy = dag.add_task(vec![8, 12]);
        dag.add_dependency(entry, cheap, costs(20)).unwrap();
        dag.add_dependency(entry, heavy, costs(1)).unwrap();
        // max(20 + 1, 1 + 10) = 21
        assert_eq!(calc_ranks(&dag).unwrap()[entry - 1], 3. + 21.);
    }

    #[test]
    fn equal_ranks_are_ordered_by_id() {
        let mut dag = DAG::new();
        dag.add_task(vec![3, 3]);
        dag.add_task(vec![3, 3]);
        let order = ranked_tasks(&dag).unwrap().iter().map(|r| r.task).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn cycle_is_reported() {
        let mut dag = DAG::new();
        let a = dag.add_task(vec![1, 1]);
        let b = dag.add_task(vec![1, 1]);
        dag.add_dependency(a, b, costs(1)).unwrap();
        dag.add_dependency(b, a, costs(1)).unwrap();
        assert!(matches!(calc_ranks(&dag), Err(Error::Cycle { .. })));
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut dag = DAG::new();
        let mut prev = dag.add_task(vec![1, 1]);
        for _ in 0..200_000 {
            let next = dag.add_task(vec![1, 1]);
            dag.add_dependency(prev, next, costs(0)).unwrap();
            prev = next;
        }
        let ranks = calc_ranks(&dag).unwrap();
        assert_eq!(ranks[0], 200_001.);
    }
}
