//! Single-machine task sequencing with sequence-dependent setup costs.
//!
//! A [`SearchEngine`](search::SearchEngine) explores schedules task by task
//! with any of the classic uninformed or informed search algorithms and
//! returns the cheapest (or, for the non-optimal strategies, the first) full
//! sequence it finds.

pub mod bidirectional;
pub mod config;
pub mod error;
pub mod family;
pub mod frontier;
pub mod heuristic;
pub mod ida;
pub mod matrix;
pub mod path;
pub mod problem;
pub mod search;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{Algorithm, SearchConfig};
pub use error::{Result, SequencingError};
pub use family::TaskFamily;
pub use heuristic::Heuristic;
pub use matrix::{Cost, SetupMatrix, Task, START};
pub use search::{search, Schedule, SearchEngine, SearchStats};
