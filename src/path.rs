use crate::matrix::Task;
use crate::state::{StateArena, StateId};

/// Task order leading from the idle machine to `goal`.
pub fn reconstruct_sequence(arena: &StateArena, goal: StateId) -> Vec<Task> {
    let mut sequence: Vec<Task> = arena
        .ancestors(goal)
        .filter(|state| state.parent.is_some())
        .map(|state| state.last)
        .collect();
    sequence.reverse();
    sequence
}

/// Tasks still to run after `meeting` in a backward search tree, in run order.
///
/// Backward parents point towards the completed schedule, so the order is
/// already forward and `meeting`'s own task is not part of it.
pub fn backward_suffix(arena: &StateArena, meeting: StateId) -> Vec<Task> {
    arena.ancestors(meeting).skip(1).map(|state| state.last).collect()
}
