//! One search driver for every frontier-based algorithm.
//!
//! Breadth-first, depth-first, depth-limited, uniform-cost, greedy and A* only
//! differ in the [`Strategy`] they hand to the driver. Iterative deepening
//! repeats depth-limited runs; IDA* and bidirectional search have their own
//! drivers (see `ida.rs` and `bidirectional.rs`) built on the same successor rule.

use crate::config::{Algorithm, SearchConfig};
use crate::error::{Result, SequencingError};
use crate::family::TaskFamily;
use crate::frontier::{Frontier, FrontierOrder};
use crate::heuristic::{Estimator, FamilySlots, Heuristic, HeuristicLibrary};
use crate::matrix::{Cost, SetupMatrix, Task};
use crate::path::reconstruct_sequence;
use crate::state::{SchedulingState, StateArena, StateId};
use fxhash::FxHashMap as HashMap;
use fxhash::FxHashSet as HashSet;
use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, info};

/// How much work a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// States whose successors were generated.
    pub expanded: usize,
    /// Successor states created.
    pub generated: usize,
    /// Restarts of the iterative variants, layers for bidirectional search.
    pub iterations: usize,
}

impl SearchStats {
    fn absorb(&mut self, other: SearchStats) {
        self.expanded += other.expanded;
        self.generated += other.generated;
    }
}

/// Best sequence a run found.
///
/// An empty sequence with an infinite cost means no feasible sequence exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub sequence: Vec<Task>,
    pub total_cost: Cost,
    pub stats: SearchStats,
}

impl Schedule {
    pub fn no_solution(stats: SearchStats) -> Self {
        Schedule {
            sequence: Vec::new(),
            total_cost: f64::INFINITY,
            stats,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.total_cost.is_finite()
    }
}

/// Which states a frontier prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingKey {
    Fifo,
    Lifo,
    /// Accumulated cost `g`.
    Cost,
    /// Heuristic estimate `h`.
    Estimate,
    /// `g + h`.
    Total,
}

impl OrderingKey {
    fn frontier_order(self) -> FrontierOrder {
        match self {
            OrderingKey::Fifo => FrontierOrder::Fifo,
            OrderingKey::Lifo => FrontierOrder::Lifo,
            OrderingKey::Cost | OrderingKey::Estimate | OrderingKey::Total => {
                FrontierOrder::Priority
            }
        }
    }

    fn key(self, state: &SchedulingState) -> Cost {
        match self {
            OrderingKey::Fifo | OrderingKey::Lifo => 0.0,
            OrderingKey::Cost => state.g,
            OrderingKey::Estimate => state.h,
            OrderingKey::Total => state.f(),
        }
    }
}

/// What happens when a state identity is reached more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// The first instance wins.
    FirstSeen,
    /// The instance with the lower accumulated cost wins; a state reached
    /// again more cheaply after its expansion is expanded again.
    KeepLowerCost,
}

/// Parameters of the shared search driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub name: &'static str,
    pub ordering: OrderingKey,
    pub dedup: DedupPolicy,
    pub informed: bool,
    /// States at this depth or deeper are not expanded.
    pub depth_limit: Option<usize>,
}

impl Strategy {
    pub fn breadth_first() -> Self {
        Strategy {
            name: "breadth-first",
            ordering: OrderingKey::Fifo,
            dedup: DedupPolicy::FirstSeen,
            informed: false,
            depth_limit: None,
        }
    }

    pub fn depth_first() -> Self {
        Strategy {
            name: "depth-first",
            ordering: OrderingKey::Lifo,
            ..Self::breadth_first()
        }
    }

    pub fn depth_limited(limit: usize) -> Self {
        Strategy {
            name: "depth-limited",
            depth_limit: Some(limit),
            ..Self::depth_first()
        }
    }

    pub fn uniform_cost() -> Self {
        Strategy {
            name: "uniform-cost",
            ordering: OrderingKey::Cost,
            dedup: DedupPolicy::KeepLowerCost,
            informed: false,
            depth_limit: None,
        }
    }

    pub fn greedy() -> Self {
        Strategy {
            name: "greedy",
            ordering: OrderingKey::Estimate,
            informed: true,
            ..Self::uniform_cost()
        }
    }

    pub fn a_star() -> Self {
        Strategy {
            name: "a-star",
            ordering: OrderingKey::Total,
            informed: true,
            ..Self::uniform_cost()
        }
    }
}

/// Sequencing search over one problem instance.
///
/// The engine is immutable once built; every run owns its own frontier,
/// closed set and state arena.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    tasks: Vec<Task>,
    library: HeuristicLibrary,
}

impl SearchEngine {
    /// The matrix is expected to pass [`SetupMatrix::validate_matrix`]; it is
    /// not checked again here.
    pub fn new(tasks: &[Task], matrix: &SetupMatrix, families: Option<&TaskFamily>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(SequencingError::EmptyTaskList);
        }
        if tasks.contains(&0) {
            return Err(SequencingError::InvalidTask);
        }
        if let Some(&task) = tasks.iter().duplicates().next() {
            return Err(SequencingError::DuplicateTask(task));
        }
        let table = matrix.slot_table(tasks);
        let families = families.map(|families| FamilySlots::new(tasks, families, matrix));
        Ok(SearchEngine {
            tasks: tasks.to_vec(),
            library: HeuristicLibrary::new(table, families),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn library(&self) -> &HeuristicLibrary {
        &self.library
    }

    /// Run the algorithm selected by `config`.
    pub fn run(&self, config: &SearchConfig) -> Result<Schedule> {
        // fail on an unavailable heuristic even if the algorithm ignores it
        self.library.estimator(config.heuristic)?;
        let schedule = match config.algorithm {
            Algorithm::BreadthFirst => self.breadth_first(),
            Algorithm::DepthFirst => self.depth_first(),
            Algorithm::DepthLimited => {
                self.depth_limited(config.depth_limit.unwrap_or(self.num_tasks()))
            }
            Algorithm::IterativeDeepening => self.iterative_deepening(),
            Algorithm::Bidirectional => self.bidirectional(),
            Algorithm::UniformCost => self.uniform_cost(),
            Algorithm::Greedy => self.greedy(config.heuristic)?,
            Algorithm::AStar => self.a_star(config.heuristic)?,
            Algorithm::IdaStar => self.ida_star(config.heuristic)?,
        };
        info!(
            algorithm = %config.algorithm,
            cost = schedule.total_cost,
            expanded = schedule.stats.expanded,
            generated = schedule.stats.generated,
            "search finished"
        );
        Ok(schedule)
    }

    pub fn breadth_first(&self) -> Schedule {
        self.explore(&Strategy::breadth_first(), Estimator::Zero)
    }

    pub fn depth_first(&self) -> Schedule {
        self.explore(&Strategy::depth_first(), Estimator::Zero)
    }

    /// Depth-first search that does not expand states `limit` steps from the start.
    pub fn depth_limited(&self, limit: usize) -> Schedule {
        self.explore(&Strategy::depth_limited(limit), Estimator::Zero)
    }

    /// Depth-limited runs with the cutoff raised from 1 to the number of tasks.
    pub fn iterative_deepening(&self) -> Schedule {
        let mut stats = SearchStats::default();
        for limit in 1..=self.num_tasks() {
            debug!(limit, "iterative deepening");
            let schedule = self.depth_limited(limit);
            stats.absorb(schedule.stats);
            stats.iterations += 1;
            if schedule.is_feasible() {
                return Schedule { stats, ..schedule };
            }
        }
        Schedule::no_solution(stats)
    }

    pub fn uniform_cost(&self) -> Schedule {
        self.explore(&Strategy::uniform_cost(), Estimator::Zero)
    }

    pub fn greedy(&self, heuristic: Option<Heuristic>) -> Result<Schedule> {
        self.search_with(&Strategy::greedy(), heuristic)
    }

    pub fn a_star(&self, heuristic: Option<Heuristic>) -> Result<Schedule> {
        self.search_with(&Strategy::a_star(), heuristic)
    }

    /// Run the shared driver with an arbitrary strategy.
    pub fn search_with(&self, strategy: &Strategy, heuristic: Option<Heuristic>) -> Result<Schedule> {
        let estimator = self.library.estimator(heuristic)?;
        let estimator = if strategy.informed {
            estimator
        } else {
            Estimator::Zero
        };
        Ok(self.explore(strategy, estimator))
    }

    pub(crate) fn root(&self, estimator: &Estimator) -> SchedulingState {
        let mut root = SchedulingState::root(self.num_tasks(), 0.0);
        root.h = estimator.estimate(&root.remaining, root.last_slot);
        root
    }

    /// Every state reachable from `id` by running one more task, in task order.
    /// Transitions without a recorded cost are skipped.
    pub(crate) fn successors(
        &self,
        arena: &StateArena,
        id: StateId,
        estimator: &Estimator,
    ) -> SmallVec<[SchedulingState; 8]> {
        let state = &arena[id];
        let table = self.library.table();
        state
            .remaining
            .ones()
            .filter_map(|index| {
                let setup = table.get(state.last_slot, index + 1);
                if setup.is_infinite() {
                    return None;
                }
                let mut child = state.schedule(id, index, self.tasks[index], setup, 0.0);
                child.h = estimator.estimate(&child.remaining, child.last_slot);
                Some(child)
            })
            .collect()
    }

    pub(crate) fn finish(&self, arena: &StateArena, goal: StateId, stats: SearchStats) -> Schedule {
        Schedule {
            sequence: reconstruct_sequence(arena, goal),
            total_cost: arena[goal].g,
            stats,
        }
    }

    fn explore(&self, strategy: &Strategy, estimator: Estimator) -> Schedule {
        debug!(strategy = strategy.name, tasks = self.num_tasks(), "search start");
        let mut arena = StateArena::new();
        let mut frontier = Frontier::new(strategy.ordering.frontier_order());
        let mut closed = HashSet::default();
        let mut best_cost = HashMap::default();
        let mut stats = SearchStats::default();

        let root = self.root(&estimator);
        if strategy.dedup == DedupPolicy::KeepLowerCost {
            best_cost.insert(root.key(), root.g);
        }
        let key = strategy.ordering.key(&root);
        frontier.push(arena.push(root), key);

        while let Some(id) = frontier.pop() {
            let state = &arena[id];
            if state.is_goal() {
                return self.finish(&arena, id, stats);
            }
            if strategy.depth_limit.is_some_and(|limit| state.depth >= limit) {
                continue;
            }
            let state_key = state.key();
            match strategy.dedup {
                DedupPolicy::FirstSeen => {
                    if !closed.insert(state_key) {
                        continue;
                    }
                }
                DedupPolicy::KeepLowerCost => {
                    if best_cost.get(&state_key).is_some_and(|&g| state.g > g) {
                        // a cheaper instance of this state is queued
                        continue;
                    }
                }
            }
            stats.expanded += 1;

            let mut children = self.successors(&arena, id, &estimator);
            if strategy.ordering == OrderingKey::Lifo {
                // first task on top of the stack
                children.reverse();
            }
            for child in children {
                let child_key = child.key();
                match strategy.dedup {
                    DedupPolicy::FirstSeen => {
                        if closed.contains(&child_key) {
                            continue;
                        }
                    }
                    DedupPolicy::KeepLowerCost => {
                        if best_cost.get(&child_key).is_some_and(|&g| g <= child.g) {
                            continue;
                        }
                        best_cost.insert(child_key, child.g);
                    }
                }
                let key = strategy.ordering.key(&child);
                frontier.push(arena.push(child), key);
                stats.generated += 1;
            }
        }
        debug!(strategy = strategy.name, "frontier exhausted");
        Schedule::no_solution(stats)
    }
}

/// Build an engine for `tasks` and run `algorithm` once.
pub fn search(
    algorithm: Algorithm,
    tasks: &[Task],
    costs: &SetupMatrix,
    heuristic: Option<Heuristic>,
    families: Option<&TaskFamily>,
) -> Result<Schedule> {
    let config = SearchConfig {
        algorithm,
        heuristic,
        depth_limit: None,
    };
    SearchEngine::new(tasks, costs, families)?.run(&config)
}
