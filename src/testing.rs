//! Fixtures shared by the unit tests.

use crate::family::TaskFamily;
use crate::matrix::{Cost, SetupMatrix, Task, START};
use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::iter::once;

/// C(0,1)=3, C(0,2)=7, C(1,2)=4, C(2,1)=6
pub fn two_task_matrix() -> SetupMatrix {
    SetupMatrix::new(
        [1, 2],
        [((0, 1), 3.0), ((0, 2), 7.0), ((1, 2), 4.0), ((2, 1), 6.0)],
    )
    .unwrap()
}

/// Paint shop with four colors, costs in minutes of cleaning.
pub fn paint_line() -> (Vec<Task>, SetupMatrix) {
    let tasks = vec![1, 2, 3, 4];
    let matrix = SetupMatrix::from_wire(
        tasks.clone(),
        [
            ("(0,1)", 15.0),
            ("(0,2)", 18.0),
            ("(0,3)", 12.0),
            ("(0,4)", 20.0),
            ("(1,2)", 25.0),
            ("(1,3)", 8.0),
            ("(1,4)", 12.0),
            ("(2,1)", 22.0),
            ("(2,3)", 30.0),
            ("(2,4)", 28.0),
            ("(3,1)", 10.0),
            ("(3,2)", 35.0),
            ("(3,4)", 6.0),
            ("(4,1)", 14.0),
            ("(4,2)", 32.0),
            ("(4,3)", 5.0),
        ],
    )
    .unwrap();
    (tasks, matrix)
}

/// Complete matrix over tasks `1..=num_tasks` with integral costs in `1..=50`.
pub fn random_matrix(num_tasks: usize, seed: u64) -> (Vec<Task>, SetupMatrix) {
    let mut rng = StdRng::seed_from_u64(seed);
    let tasks = (1..=num_tasks as Task).collect_vec();
    let costs = once(START)
        .chain(tasks.iter().copied())
        .cartesian_product(tasks.clone())
        .filter(|(from, to)| from != to)
        .map(|pair| (pair, rng.random_range(1..=50u32) as Cost))
        .collect_vec();
    let matrix = SetupMatrix::new(tasks.clone(), costs).unwrap();
    (tasks, matrix)
}

/// Families `a`, `b`, ... assigned round-robin.
pub fn round_robin_families(tasks: &[Task], num_families: usize) -> TaskFamily {
    TaskFamily::new(tasks.iter().enumerate().map(|(i, &task)| {
        let label = char::from(b'a' + (i % num_families) as u8).to_string();
        (task, label)
    }))
}

/// Cheapest way to run every task of `remaining` after `last`, by enumeration.
pub fn optimal_completion(matrix: &SetupMatrix, last: Task, remaining: &[Task]) -> Cost {
    if remaining.is_empty() {
        return 0.0;
    }
    remaining
        .iter()
        .copied()
        .permutations(remaining.len())
        .map(|order| {
            once(last)
                .chain(order)
                .tuple_windows()
                .map(|(from, to)| matrix.get_setup_cost(from, to))
                .sum::<Cost>()
        })
        .fold(f64::INFINITY, f64::min)
}
