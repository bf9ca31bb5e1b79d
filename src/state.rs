use crate::matrix::{Cost, Task, START};
use fixedbitset::FixedBitSet;
use std::ops::Index;

/// Handle of a state inside a [`StateArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

/// Identity used for duplicate detection: two states with the same key are
/// interchangeable apart from their accumulated cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub remaining: FixedBitSet,
    pub last_slot: usize,
}

/// Node of the sequencing search tree.
///
/// Bit `i` of `remaining` is set while the `i`-th task of the problem is still
/// unscheduled. `last_slot` is `0` for the idle machine and `i + 1` for the
/// `i`-th task.
#[derive(Debug, Clone)]
pub struct SchedulingState {
    pub remaining: FixedBitSet,
    pub last: Task,
    pub last_slot: usize,
    pub g: Cost,
    pub h: Cost,
    pub depth: usize,
    pub parent: Option<StateId>,
}

impl SchedulingState {
    /// The idle machine with every one of `num_tasks` tasks still to run.
    pub fn root(num_tasks: usize, h: Cost) -> Self {
        let mut remaining = FixedBitSet::with_capacity(num_tasks);
        remaining.insert_range(..);
        SchedulingState {
            remaining,
            last: START,
            last_slot: 0,
            g: 0.0,
            h,
            depth: 0,
            parent: None,
        }
    }

    /// The state reached from `self` (stored at `id`) by running the task at
    /// `index` next.
    pub fn schedule(&self, id: StateId, index: usize, task: Task, setup: Cost, h: Cost) -> Self {
        debug_assert!(self.remaining.contains(index));
        let mut remaining = self.remaining.clone();
        remaining.set(index, false);
        SchedulingState {
            remaining,
            last: task,
            last_slot: index + 1,
            g: self.g + setup,
            h,
            depth: self.depth + 1,
            parent: Some(id),
        }
    }

    /// A completed schedule ending with the task at `index`, as seen from the
    /// end of the line.
    pub fn finished(num_tasks: usize, index: usize, task: Task) -> Self {
        SchedulingState {
            remaining: FixedBitSet::with_capacity(num_tasks),
            last: task,
            last_slot: index + 1,
            g: 0.0,
            h: 0.0,
            depth: num_tasks,
            parent: None,
        }
    }

    /// The state leading into `self` (stored at `id`) when the task in `slot`
    /// runs right before `self.last`. `g` then counts the cost to finish.
    pub fn preceded_by(&self, id: StateId, slot: usize, task: Task, setup: Cost) -> Self {
        debug_assert!(self.last_slot > 0 && self.depth > 0);
        let mut remaining = self.remaining.clone();
        remaining.insert(self.last_slot - 1);
        SchedulingState {
            remaining,
            last: task,
            last_slot: slot,
            g: self.g + setup,
            h: 0.0,
            depth: self.depth - 1,
            parent: Some(id),
        }
    }

    pub fn is_goal(&self) -> bool {
        self.remaining.ones().next().is_none()
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.count_ones(..)
    }

    pub fn f(&self) -> Cost {
        self.g + self.h
    }

    pub fn key(&self) -> StateKey {
        StateKey {
            remaining: self.remaining.clone(),
            last_slot: self.last_slot,
        }
    }
}

/// Owner of every state created during one search run.
#[derive(Debug, Default)]
pub struct StateArena {
    states: Vec<SchedulingState>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: SchedulingState) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub fn get(&self, id: StateId) -> &SchedulingState {
        &self.states[id.0]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drop every state created after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.states.truncate(len);
    }

    /// States from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: StateId) -> impl Iterator<Item = &SchedulingState> + '_ {
        std::iter::successors(Some(self.get(id)), move |state| {
            state.parent.map(|parent| self.get(parent))
        })
    }
}

impl Index<StateId> for StateArena {
    type Output = SchedulingState;

    fn index(&self, id: StateId) -> &Self::Output {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_state() {
        let root = SchedulingState::root(3, 1.5);
        assert_eq!(root.remaining_count(), 3);
        assert_eq!(root.last, START);
        assert_eq!(root.f(), 1.5);
        assert!(!root.is_goal());
        assert!(root.parent.is_none());
    }

    #[test]
    fn test_schedule_removes_one_task() {
        let mut arena = StateArena::new();
        let root = arena.push(SchedulingState::root(2, 0.0));
        let child = arena[root].schedule(root, 1, 20, 4.0, 0.0);
        assert!(!child.remaining.contains(1));
        assert!(child.remaining.contains(0));
        assert_eq!(child.last, 20);
        assert_eq!(child.last_slot, 2);
        assert_eq!(child.g, 4.0);
        assert_eq!(child.depth, 1);
        let child = arena.push(child);
        let leaf = arena[child].schedule(child, 0, 10, 2.5, 0.0);
        assert!(leaf.is_goal());
        assert_eq!(leaf.g, 6.5);
        let leaf = arena.push(leaf);
        let lasts: Vec<_> = arena.ancestors(leaf).map(|s| s.last).collect();
        assert_eq!(lasts, vec![10, 20, START]);
    }

    #[test]
    fn test_state_key_identity() {
        let mut arena = StateArena::new();
        let root = arena.push(SchedulingState::root(3, 0.0));
        let a = arena[root].schedule(root, 0, 1, 1.0, 0.0);
        let b = arena[root].schedule(root, 0, 1, 9.0, 3.0);
        let c = arena[root].schedule(root, 1, 2, 1.0, 0.0);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_preceded_by_adds_last_task_back() {
        let mut arena = StateArena::new();
        let end = arena.push(SchedulingState::finished(3, 2, 30));
        let before = arena[end].preceded_by(end, 1, 10, 5.0);
        assert!(before.remaining.contains(2));
        assert_eq!(before.remaining_count(), 1);
        assert_eq!(before.last, 10);
        assert_eq!(before.depth, 2);
        assert_eq!(before.g, 5.0);
        assert_eq!(before.parent, Some(end));
    }

    #[test]
    fn test_truncate_arena() {
        let mut arena = StateArena::new();
        let root = arena.push(SchedulingState::root(2, 0.0));
        let child = arena[root].schedule(root, 0, 1, 1.0, 0.0);
        arena.push(child);
        assert_eq!(arena.len(), 2);
        arena.truncate(1);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_wide_task_sets() {
        let root = SchedulingState::root(130, 0.0);
        assert_eq!(root.remaining_count(), 130);
        assert!(root.remaining.contains(129));
    }
}
