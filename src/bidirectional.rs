//! Search from both ends of the line at once.
//!
//! The forward side schedules tasks from the idle machine, the backward side
//! unschedules them from every possible final task. Both sides advance one
//! full depth layer at a time, smaller layer first, and each layer keeps only
//! the cheapest instance of every state. Since a state's depth is fixed by how
//! many tasks it still owes, every kept cost is exact and the cheapest join of
//! the two sides is an optimal sequence.

use crate::heuristic::Estimator;
use crate::matrix::{Cost, START};
use crate::path::{backward_suffix, reconstruct_sequence};
use crate::search::{Schedule, SearchEngine, SearchStats};
use crate::state::{SchedulingState, StateArena, StateId, StateKey};
use fxhash::FxHashMap as HashMap;
use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::{smallvec, SmallVec};
use tracing::debug;

/// Relative gap below which two costs of one state count as the same.
const TIE_TOLERANCE: Cost = 1e-9;

fn ties(cost: Cost, best: Cost) -> bool {
    cost - best <= TIE_TOLERANCE * best.abs().max(1.0)
}

#[derive(Debug, Default)]
struct Side {
    arena: StateArena,
    visited: HashMap<StateKey, SmallVec<[StateId; 1]>>,
    layer: Vec<StateId>,
    /// Scheduled tasks of the states in `layer`.
    depth: usize,
}

impl Side {
    fn new<I>(depth: usize, states: I) -> Self
    where
        I: IntoIterator<Item = SchedulingState>,
    {
        let mut side = Side {
            depth,
            ..Default::default()
        };
        for state in states {
            let key = state.key();
            let id = side.arena.push(state);
            side.visited.insert(key, smallvec![id]);
            side.layer.push(id);
        }
        side
    }

    /// Replace the current layer by its neighbors, keeping the cheapest
    /// instances of each.
    ///
    /// Instances whose costs differ only by rounding are all kept: the
    /// backward side adds costs end first, so the one it would pick is not
    /// necessarily the cheapest once summed in run order.
    fn advance<F>(&mut self, stats: &mut SearchStats, mut neighbors: F)
    where
        F: FnMut(&StateArena, StateId) -> SmallVec<[SchedulingState; 8]>,
    {
        let mut next: IndexMap<StateKey, SmallVec<[StateId; 1]>> = IndexMap::new();
        for &id in &self.layer {
            stats.expanded += 1;
            for state in neighbors(&self.arena, id) {
                stats.generated += 1;
                let key = state.key();
                let kept = next.entry(key).or_default();
                let g = state.g;
                let best = kept
                    .iter()
                    .map(|&id| self.arena[id].g)
                    .fold(f64::INFINITY, f64::min);
                if (g > best && !ties(g, best)) || kept.iter().any(|&id| self.arena[id].g == g) {
                    continue;
                }
                kept.push(self.arena.push(state));
                if g < best {
                    kept.retain(|id| ties(self.arena[*id].g, g));
                }
            }
        }
        self.layer = next.values().flatten().copied().collect();
        self.visited.extend(next);
    }
}

impl SearchEngine {
    /// Bidirectional uniform-cost search.
    ///
    /// Returns the same cost as [`SearchEngine::uniform_cost`], possibly with a
    /// different sequence of equal cost.
    pub fn bidirectional(&self) -> Schedule {
        let n = self.num_tasks();
        let mut stats = SearchStats::default();
        let mut forward = Side::new(0, [self.root(&Estimator::Zero)]);
        let mut backward = Side::new(
            n,
            self.tasks()
                .iter()
                .enumerate()
                .map(|(index, &task)| SchedulingState::finished(n, index, task)),
        );

        while forward.depth < backward.depth {
            stats.iterations += 1;
            if forward.layer.len() <= backward.layer.len() {
                forward.advance(&mut stats, |arena, id| {
                    self.successors(arena, id, &Estimator::Zero)
                });
                forward.depth += 1;
            } else {
                backward.advance(&mut stats, |arena, id| self.predecessors(arena, id));
                backward.depth -= 1;
            }
            debug!(
                forward_depth = forward.depth,
                forward_layer = forward.layer.len(),
                backward_depth = backward.depth,
                backward_layer = backward.layer.len(),
                "bidirectional layer"
            );
            if forward.layer.is_empty() || backward.layer.is_empty() {
                return Schedule::no_solution(stats);
            }
        }

        let meeting = forward
            .layer
            .iter()
            .filter_map(|&f| {
                let instances = backward.visited.get(&forward.arena[f].key())?;
                Some(instances.iter().map(move |&b| (f, b)))
            })
            .flatten()
            .map(|(f, b)| (f, b, self.joined_cost(forward.arena[f].g, &backward.arena, b)))
            .filter(|&(_, _, cost)| cost.is_finite())
            .min_by(|a, b| a.2.total_cmp(&b.2));
        let Some((f, b, total_cost)) = meeting else {
            return Schedule::no_solution(stats);
        };
        let mut sequence = reconstruct_sequence(&forward.arena, f);
        sequence.extend(backward_suffix(&backward.arena, b));
        Schedule {
            sequence,
            total_cost,
            stats,
        }
    }

    /// Cost of a full sequence whose prefix costs `prefix` and whose remainder
    /// is the backward path from `meeting`.
    ///
    /// Summed in run order so the total matches the forward cost of the same
    /// sequence bit for bit; the backward `g` adds the same terms end first.
    fn joined_cost(&self, prefix: Cost, backward: &StateArena, meeting: StateId) -> Cost {
        let table = self.library().table();
        backward
            .ancestors(meeting)
            .map(|state| state.last_slot)
            .tuple_windows()
            .fold(prefix, |cost, (from, to)| cost + table.get(from, to))
    }

    /// Every state that leads into `id` by one step, with `g` counting the
    /// cost from that state to the end of the line.
    fn predecessors(&self, arena: &StateArena, id: StateId) -> SmallVec<[SchedulingState; 8]> {
        let state = &arena[id];
        if state.last_slot == 0 {
            return SmallVec::new();
        }
        let table = self.library().table();
        let unscheduled = state.last_slot - 1;
        let previous: SmallVec<[usize; 8]> = if state.depth == 1 {
            smallvec![0]
        } else {
            (0..self.num_tasks())
                .filter(|&index| index != unscheduled && !state.remaining.contains(index))
                .map(|index| index + 1)
                .collect()
        };
        previous
            .into_iter()
            .filter_map(|slot| {
                let setup = table.get(slot, state.last_slot);
                if setup.is_infinite() {
                    return None;
                }
                let task = slot.checked_sub(1).map_or(START, |i| self.tasks()[i]);
                Some(state.preceded_by(id, slot, task, setup))
            })
            .collect()
    }
}
