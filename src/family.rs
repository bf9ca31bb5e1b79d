use crate::matrix::{Cost, SetupMatrix, Task};
use indexmap::IndexMap;
use itertools::Itertools;

/// Grouping of tasks into product families.
///
/// The mapping may be partial: tasks without a recorded family never share a
/// family with anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFamily {
    families: IndexMap<Task, String>,
}

impl TaskFamily {
    pub fn new<I, S>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (Task, S)>,
        S: Into<String>,
    {
        TaskFamily {
            families: assignments
                .into_iter()
                .map(|(task, family)| (task, family.into()))
                .collect(),
        }
    }

    pub fn family_of(&self, task: Task) -> Option<&str> {
        self.families.get(&task).map(String::as_str)
    }

    pub fn same_family(&self, a: Task, b: Task) -> bool {
        match (self.family_of(a), self.family_of(b)) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => false,
        }
    }

    /// Cheapest transition between two tasks of the matrix that do not share a
    /// family, or zero when there is no such transition.
    pub fn min_interfamily_cost(&self, matrix: &SetupMatrix) -> Cost {
        self.min_interfamily_cost_among(&matrix.tasks().collect_vec(), matrix)
    }

    /// Same as [`min_interfamily_cost`](Self::min_interfamily_cost), with only
    /// the transitions between `tasks` considered.
    pub fn min_interfamily_cost_among(&self, tasks: &[Task], matrix: &SetupMatrix) -> Cost {
        if self.families.is_empty() {
            return 0.0;
        }
        let min_cost = tasks
            .iter()
            .cartesian_product(tasks.iter())
            .filter(|&(&i, &j)| i != j && !self.same_family(i, j))
            .map(|(&i, &j)| matrix.get_setup_cost(i, j))
            .fold(f64::INFINITY, f64::min);
        if min_cost.is_finite() {
            min_cost
        } else {
            0.0
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Task, &str)> {
        self.families
            .iter()
            .map(|(&task, family)| (task, family.as_str()))
    }
}
