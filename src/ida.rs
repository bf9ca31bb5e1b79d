use crate::error::Result;
use crate::heuristic::{Estimator, Heuristic};
use crate::matrix::Cost;
use crate::search::{Schedule, SearchEngine, SearchStats};
use crate::state::{StateArena, StateId};
use tracing::debug;

enum Probe {
    Found(StateId),
    /// Smallest `f` seen beyond the bound, infinite when nothing was cut.
    Exceeded(Cost),
}

impl SearchEngine {
    /// Iterative-deepening A*: depth-first probes bounded by `f = g + h`, the
    /// bound raised each round to the smallest `f` that exceeded it.
    ///
    /// Only the current path lives in memory. The arena is used as a stack and
    /// shrunk back whenever a branch is abandoned.
    pub fn ida_star(&self, heuristic: Option<Heuristic>) -> Result<Schedule> {
        let estimator = self.library().estimator(heuristic)?;
        let mut arena = StateArena::new();
        let root = arena.push(self.root(&estimator));
        let mut bound = arena[root].f();
        let mut stats = SearchStats::default();
        loop {
            stats.iterations += 1;
            debug!(bound, iteration = stats.iterations, "ida-star probe");
            match self.probe(&mut arena, root, bound, &estimator, &mut stats) {
                Probe::Found(goal) => return Ok(self.finish(&arena, goal, stats)),
                Probe::Exceeded(next) if next.is_finite() => {
                    arena.truncate(1);
                    bound = next;
                }
                Probe::Exceeded(_) => return Ok(Schedule::no_solution(stats)),
            }
        }
    }

    fn probe(
        &self,
        arena: &mut StateArena,
        id: StateId,
        bound: Cost,
        estimator: &Estimator,
        stats: &mut SearchStats,
    ) -> Probe {
        let state = &arena[id];
        let f = state.f();
        if f > bound {
            return Probe::Exceeded(f);
        }
        if state.is_goal() {
            return Probe::Found(id);
        }
        stats.expanded += 1;
        // every step removes a task, so a path never revisits a state
        let children = self.successors(arena, id, estimator);
        let mark = arena.len();
        let mut next = f64::INFINITY;
        for child in children {
            stats.generated += 1;
            let child = arena.push(child);
            match self.probe(arena, child, bound, estimator, stats) {
                Probe::Found(goal) => return Probe::Found(goal),
                Probe::Exceeded(f) => next = next.min(f),
            }
            arena.truncate(mark);
        }
        Probe::Exceeded(next)
    }
}
