//! Cost-to-go estimates for sequencing states.
//!
//! `h1` and `h2` never overestimate the cheapest completion and keep A* and
//! IDA* optimal. `h3` counts the family changeovers still owed and can
//! overestimate, e.g. when the first task is cheap to start from idle.

use crate::error::{Result, SequencingError};
use crate::family::TaskFamily;
use crate::matrix::{Cost, CostTable, SetupMatrix, Task};
use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    /// Cheapest outgoing transition of every remaining task.
    H1,
    /// Minimum spanning tree over the remaining tasks.
    H2,
    /// Family changeovers still owed.
    H3,
}

impl Heuristic {
    pub fn all_possibles() -> impl Iterator<Item = Heuristic> {
        [Heuristic::H1, Heuristic::H2, Heuristic::H3].into_iter()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Heuristic::H1 => "h1",
            Heuristic::H2 => "h2",
            Heuristic::H3 => "h3",
        }
    }
}

impl Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Heuristic {
    type Err = SequencingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h1" => Ok(Heuristic::H1),
            "h2" => Ok(Heuristic::H2),
            "h3" => Ok(Heuristic::H3),
            _ => Err(SequencingError::UnknownHeuristic(s.to_string())),
        }
    }
}

/// Parse a heuristic selector where `none` (or an empty string) means no heuristic.
pub fn parse_heuristic(s: &str) -> Result<Option<Heuristic>> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "none" => Ok(None),
        _ => s.parse().map(Some),
    }
}

/// Task families translated to the slot layout of a [`CostTable`].
#[derive(Debug, Clone)]
pub struct FamilySlots {
    /// Family id of each task index, `None` when unassigned.
    labels: Vec<Option<usize>>,
    num_families: usize,
    min_interfamily_cost: Cost,
}

impl FamilySlots {
    pub fn new(tasks: &[Task], families: &TaskFamily, matrix: &SetupMatrix) -> Self {
        let mut names = IndexSet::new();
        let labels = tasks
            .iter()
            .map(|&task| {
                families
                    .family_of(task)
                    .map(|family| names.insert_full(family).0)
            })
            .collect();
        FamilySlots {
            labels,
            num_families: names.len(),
            min_interfamily_cost: families.min_interfamily_cost_among(tasks, matrix),
        }
    }

    pub fn min_interfamily_cost(&self) -> Cost {
        self.min_interfamily_cost
    }

    fn family_of_slot(&self, slot: usize) -> Option<usize> {
        slot.checked_sub(1).and_then(|index| self.labels[index])
    }
}

/// The estimators available for one problem instance.
#[derive(Debug, Clone)]
pub struct HeuristicLibrary {
    table: CostTable,
    families: Option<FamilySlots>,
}

impl HeuristicLibrary {
    pub fn new(table: CostTable, families: Option<FamilySlots>) -> Self {
        HeuristicLibrary { table, families }
    }

    pub fn table(&self) -> &CostTable {
        &self.table
    }

    /// Select an estimator. `h3` is unavailable without families.
    pub fn estimator(&self, heuristic: Option<Heuristic>) -> Result<Estimator<'_>> {
        match heuristic {
            None => Ok(Estimator::Zero),
            Some(Heuristic::H1) => Ok(Estimator::MinOutgoing(&self.table)),
            Some(Heuristic::H2) => Ok(Estimator::SpanningTree(&self.table)),
            Some(Heuristic::H3) => self
                .families
                .as_ref()
                .map(Estimator::FamilySwitch)
                .ok_or(SequencingError::MissingFamilies),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Estimator<'a> {
    Zero,
    MinOutgoing(&'a CostTable),
    SpanningTree(&'a CostTable),
    FamilySwitch(&'a FamilySlots),
}

impl Estimator<'_> {
    pub fn estimate(&self, remaining: &FixedBitSet, last_slot: usize) -> Cost {
        if remaining.ones().next().is_none() {
            return 0.0;
        }
        match self {
            Estimator::Zero => 0.0,
            Estimator::MinOutgoing(table) => min_outgoing(table, remaining, last_slot),
            Estimator::SpanningTree(table) => spanning_tree(table, remaining, last_slot),
            Estimator::FamilySwitch(families) => family_switch(families, remaining, last_slot),
        }
    }
}

fn cheapest_entry(table: &CostTable, remaining: &FixedBitSet, last_slot: usize) -> Cost {
    remaining
        .ones()
        .map(|j| table.get(last_slot, j + 1))
        .fold(f64::INFINITY, f64::min)
}

/// h1: entry into the remaining tasks plus the cheapest exit of each of them,
/// except for the one that will run last.
pub fn min_outgoing(table: &CostTable, remaining: &FixedBitSet, last_slot: usize) -> Cost {
    let entry = cheapest_entry(table, remaining, last_slot);
    let exits: SmallVec<[Cost; 16]> = remaining
        .ones()
        .map(|i| {
            remaining
                .ones()
                .filter(|&j| j != i)
                .map(|j| table.between(i, j))
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    if exits.len() < 2 {
        return entry;
    }
    // Skip the largest exit by position so an infinite one never meets `inf - inf`.
    let skip = exits
        .iter()
        .position_max_by(|a, b| a.total_cmp(b))
        .unwrap_or(0);
    let exits: Cost = exits
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != skip)
        .map(|(_, &c)| c)
        .sum();
    entry + exits
}

/// h2: entry into the remaining tasks plus a spanning tree over them, with each
/// pair weighted by its cheaper direction.
pub fn spanning_tree(table: &CostTable, remaining: &FixedBitSet, last_slot: usize) -> Cost {
    let entry = cheapest_entry(table, remaining, last_slot);
    let nodes: SmallVec<[usize; 16]> = remaining.ones().collect();
    entry + prim(table, &nodes)
}

fn prim(table: &CostTable, nodes: &[usize]) -> Cost {
    let n = nodes.len();
    if n <= 1 {
        return 0.0;
    }
    let weight = |a: usize, b: usize| {
        table
            .between(nodes[a], nodes[b])
            .min(table.between(nodes[b], nodes[a]))
    };
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    best[0] = 0.0;
    let mut total = 0.0;
    for _ in 0..n {
        let Some(next) = (0..n)
            .filter(|&k| !in_tree[k])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]))
        else {
            break;
        };
        if best[next].is_infinite() {
            return f64::INFINITY;
        }
        in_tree[next] = true;
        total += best[next];
        for k in 0..n {
            if !in_tree[k] {
                best[k] = best[k].min(weight(next, k));
            }
        }
    }
    total
}

/// h3: families still owed (not counting the one currently on the machine)
/// times the cheapest changeover between families.
pub fn family_switch(families: &FamilySlots, remaining: &FixedBitSet, last_slot: usize) -> Cost {
    let mut owed = FixedBitSet::with_capacity(families.num_families);
    remaining
        .ones()
        .filter_map(|i| families.labels[i])
        .for_each(|family| owed.insert(family));
    if let Some(current) = families.family_of_slot(last_slot) {
        owed.set(current, false);
    }
    let switches = owed.count_ones(..);
    if switches == 0 {
        return 0.0;
    }
    switches as Cost * families.min_interfamily_cost
}
