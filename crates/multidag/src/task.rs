//! DAG task.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::Time;

/// Represents a DAG task.
///
/// Described by its computation time on every processor of the pool. Each outgoing edge carries a square
/// matrix of communication costs where entry `[p][q]` is the cost of moving this task's output from
/// processor `p` to the child running on processor `q`. Transfers within one processor are free regardless
/// of the diagonal entries.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: usize,
    /// Predecessor ids.
    pub fathers: BTreeSet<usize>,
    /// Successor ids.
    pub children: BTreeSet<usize>,
    /// Computation time indexed by processor id.
    pub computation_times: Vec<Time>,
    /// Communication cost matrix for every child.
    pub communication_costs: BTreeMap<usize, Vec<Vec<Time>>>,
}

impl Task {
    /// Creates new task without dependencies.
    pub fn new(id: usize, computation_times: Vec<Time>) -> Self {
        Self {
            id,
            fathers: BTreeSet::new(),
            children: BTreeSet::new(),
            computation_times,
            communication_costs: BTreeMap::new(),
        }
    }

    /// Adds outgoing edge to `child` with given cost matrix.
    pub fn add_child(&mut self, child: usize, communication_costs: Vec<Vec<Time>>) {
        self.children.insert(child);
        self.communication_costs.insert(child, communication_costs);
    }

    /// Adds incoming edge from `father`.
    pub fn add_father(&mut self, father: usize) {
        self.fathers.insert(father);
    }

    pub fn computation_time(&self, processor: usize) -> Time {
        self.computation_times[processor]
    }

    /// Mean computation time over all processors.
    pub fn average_computation(&self) -> f64 {
        if self.computation_times.is_empty() {
            return 0.;
        }
        self.computation_times.iter().map(|&time| time as f64).sum::<f64>() / self.computation_times.len() as f64
    }

    /// Mean cost of sending the output to `child` between two different processors.
    pub fn average_communication(&self, child: usize) -> Result<f64> {
        let costs = self.costs_to(child)?;
        let (sum, count) = costs
            .iter()
            .enumerate()
            .flat_map(|(from, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |&(to, _)| to != from)
                    .map(|(_, &cost)| cost as f64)
            })
            .fold((0., 0usize), |(sum, count), cost| (sum + cost, count + 1));
        if count == 0 {
            return Err(Error::NoCrossProcessorEntries { task: self.id, child });
        }
        Ok(sum / count as f64)
    }

    /// Cost of sending the output to `child` when this task runs on `from` and the child runs on `to`.
    pub fn communication_cost(&self, child: usize, from: usize, to: usize) -> Result<Time> {
        if from == to {
            return Ok(0);
        }
        self.costs_to(child)?
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .ok_or(Error::MissingCommunicationCost {
                parent: self.id,
                child,
            })
    }

    fn costs_to(&self, child: usize) -> Result<&Vec<Vec<Time>>> {
        self.communication_costs
            .get(&child)
            .ok_or(Error::MissingCommunicationCost {
                parent: self.id,
                child,
            })
    }
}
