use crate::error::{Result, SequencingError};
use fxhash::FxHashMap as HashMap;
use indexmap::IndexSet;
use itertools::Itertools;
use std::iter::once;

/// Task identifier. `0` is reserved for the idle machine.
pub type Task = u32;

/// Setup cost. `f64::INFINITY` stands for an undefined transition.
pub type Cost = f64;

/// The virtual state before any task has been scheduled.
pub const START: Task = 0;

/// Sequence-dependent setup costs between tasks.
///
/// A cost is recorded for ordered pairs `(from, to)` where `from` is either
/// [`START`] or a task, and `to` is a task different from `from`.
#[derive(Debug, Clone, Default)]
pub struct SetupMatrix {
    tasks: IndexSet<Task>,
    costs: HashMap<(Task, Task), Cost>,
}

impl SetupMatrix {
    pub fn new<T, C>(tasks: T, costs: C) -> Result<Self>
    where
        T: IntoIterator<Item = Task>,
        C: IntoIterator<Item = ((Task, Task), Cost)>,
    {
        let tasks: IndexSet<Task> = tasks.into_iter().collect();
        let mut table = HashMap::default();
        for ((from, to), cost) in costs {
            if cost.is_nan() || cost < 0.0 {
                return Err(SequencingError::InvalidCost { from, to, cost });
            }
            table.insert((from, to), cost);
        }
        Ok(SetupMatrix {
            tasks,
            costs: table,
        })
    }

    /// Build the matrix from `"(i,j)" -> cost` entries.
    pub fn from_wire<T, K, C>(tasks: T, entries: C) -> Result<Self>
    where
        T: IntoIterator<Item = Task>,
        K: AsRef<str>,
        C: IntoIterator<Item = (K, Cost)>,
    {
        let costs = entries
            .into_iter()
            .map(|(key, cost)| parse_cost_key(key.as_ref()).map(|pair| (pair, cost)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(tasks, costs)
    }

    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        self.tasks.iter().copied()
    }

    /// Recorded cost of moving from `from` to `to`, infinite when undefined.
    pub fn get_setup_cost(&self, from: Task, to: Task) -> Cost {
        self.costs
            .get(&(from, to))
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// Whether every required transition has a recorded cost.
    pub fn validate_matrix(&self) -> bool {
        self.required_pairs()
            .all(|pair| self.costs.contains_key(&pair))
    }

    pub fn missing_pairs(&self) -> Vec<(Task, Task)> {
        self.required_pairs()
            .filter(|pair| !self.costs.contains_key(pair))
            .collect()
    }

    /// Same check as [`validate_matrix`](Self::validate_matrix), reported as an error.
    pub fn ensure_complete(&self) -> Result<()> {
        let missing = self.missing_pairs();
        match missing.first() {
            None => Ok(()),
            Some(&(from, to)) => Err(SequencingError::IncompleteMatrix {
                missing: missing.len(),
                from,
                to,
            }),
        }
    }

    /// Total setup cost of running `sequence` from the idle machine.
    pub fn sequence_cost(&self, sequence: &[Task]) -> Cost {
        once(START)
            .chain(sequence.iter().copied())
            .tuple_windows()
            .map(|(from, to)| self.get_setup_cost(from, to))
            .sum()
    }

    /// Recorded entries in wire form, ordered by `(from, to)`.
    pub fn wire_entries(&self) -> Vec<(String, Cost)> {
        self.costs
            .iter()
            .sorted_by_key(|(pair, _)| **pair)
            .map(|(&(from, to), &cost)| (wire_key(from, to), cost))
            .collect()
    }

    /// Dense view of the costs between `tasks`, addressed by slot.
    pub fn slot_table(&self, tasks: &[Task]) -> CostTable {
        let size = tasks.len() + 1;
        let slots = once(START).chain(tasks.iter().copied()).collect_vec();
        let costs = slots
            .iter()
            .cartesian_product(slots.iter())
            .map(|(&from, &to)| {
                if from == to {
                    f64::INFINITY
                } else {
                    self.get_setup_cost(from, to)
                }
            })
            .collect();
        CostTable { size, costs }
    }

    fn required_pairs(&self) -> impl Iterator<Item = (Task, Task)> + '_ {
        once(START)
            .chain(self.tasks())
            .cartesian_product(self.tasks().collect_vec())
            .filter(|(from, to)| from != to)
    }
}

/// Setup costs indexed by slot: slot `0` is the idle machine, slot `i + 1` is
/// the `i`-th task of the problem.
#[derive(Debug, Clone)]
pub struct CostTable {
    size: usize,
    costs: Vec<Cost>,
}

impl CostTable {
    #[inline]
    pub fn get(&self, from_slot: usize, to_slot: usize) -> Cost {
        self.costs[from_slot * self.size + to_slot]
    }

    /// Cost between the `i`-th and `j`-th task.
    #[inline]
    pub fn between(&self, i: usize, j: usize) -> Cost {
        self.get(i + 1, j + 1)
    }
}

pub fn wire_key(from: Task, to: Task) -> String {
    format!("({},{})", from, to)
}

/// Parse a `"(i,j)"` cost key.
pub fn parse_cost_key(key: &str) -> Result<(Task, Task)> {
    let malformed = || SequencingError::MalformedCostKey(key.to_string());
    let inner = key
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let (from, to) = inner.split_once(',').ok_or_else(malformed)?;
    let from = from.trim().parse::<Task>().map_err(|_| malformed())?;
    let to = to.trim().parse::<Task>().map_err(|_| malformed())?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_task_matrix() -> SetupMatrix {
        SetupMatrix::from_wire(
            [1, 2],
            [("(0,1)", 3.0), ("(0,2)", 7.0), ("(1,2)", 4.0), ("(2,1)", 6.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_get_setup_cost() {
        let matrix = two_task_matrix();
        assert_eq!(matrix.get_setup_cost(0, 1), 3.0);
        assert_eq!(matrix.get_setup_cost(2, 1), 6.0);
        assert_eq!(matrix.get_setup_cost(1, 0), f64::INFINITY);
        assert_eq!(matrix.get_setup_cost(1, 1), f64::INFINITY);
        assert_eq!(matrix.get_setup_cost(5, 1), f64::INFINITY);
    }

    #[test]
    fn test_validate_matrix() {
        let matrix = two_task_matrix();
        assert!(matrix.validate_matrix());
        assert!(matrix.ensure_complete().is_ok());

        let matrix =
            SetupMatrix::from_wire([1, 2], [("(0,1)", 3.0), ("(1,2)", 4.0), ("(2,1)", 6.0)])
                .unwrap();
        assert!(!matrix.validate_matrix());
        assert_eq!(matrix.missing_pairs(), vec![(0, 2)]);
        assert_eq!(
            matrix.ensure_complete(),
            Err(SequencingError::IncompleteMatrix {
                missing: 1,
                from: 0,
                to: 2
            })
        );
    }

    #[test]
    fn test_validate_ignores_extra_entries() {
        let mut entries = vec![("(0,1)", 1.0), ("(3,1)", 9.0), ("(1,0)", 2.0)];
        let matrix = SetupMatrix::from_wire([1], entries.clone()).unwrap();
        assert!(matrix.validate_matrix());
        entries.remove(0);
        let matrix = SetupMatrix::from_wire([1], entries).unwrap();
        assert!(!matrix.validate_matrix());
    }

    #[test]
    fn test_parse_cost_key() {
        assert_eq!(parse_cost_key("(0,1)"), Ok((0, 1)));
        assert_eq!(parse_cost_key(" ( 12 , 7 ) "), Ok((12, 7)));
        for bad in ["0,1", "(0;1)", "(a,1)", "(1,)", "(-1,2)", "(1,2"] {
            assert_eq!(
                parse_cost_key(bad),
                Err(SequencingError::MalformedCostKey(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_rejects_invalid_cost() {
        let matrix = SetupMatrix::from_wire([1], [("(0,1)", -1.0)]);
        assert!(matches!(
            matrix,
            Err(SequencingError::InvalidCost { from: 0, to: 1, .. })
        ));
        let matrix = SetupMatrix::from_wire([1], [("(0,1)", f64::NAN)]);
        assert!(matrix.is_err());
    }

    #[test]
    fn test_sequence_cost() {
        let matrix = two_task_matrix();
        assert_eq!(matrix.sequence_cost(&[1, 2]), 7.0);
        assert_eq!(matrix.sequence_cost(&[2, 1]), 13.0);
        assert_eq!(matrix.sequence_cost(&[]), 0.0);
    }

    #[test]
    fn test_slot_table() {
        let matrix = two_task_matrix();
        let table = matrix.slot_table(&[2, 1]);
        assert_eq!(table.get(0, 1), 7.0);
        assert_eq!(table.get(0, 2), 3.0);
        assert_eq!(table.between(0, 1), 6.0);
        assert_eq!(table.between(1, 0), 4.0);
        assert_eq!(table.get(1, 1), f64::INFINITY);
        assert_eq!(table.get(1, 0), f64::INFINITY);
    }

    #[test]
    fn test_wire_entries_are_sorted() {
        let matrix = two_task_matrix();
        let keys = matrix
            .wire_entries()
            .into_iter()
            .map(|(k, _)| k)
            .collect_vec();
        assert_eq!(keys, vec!["(0,1)", "(0,2)", "(1,2)", "(2,1)"]);
    }
}
