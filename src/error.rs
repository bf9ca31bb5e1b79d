use crate::matrix::Task;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SequencingError>;

#[derive(Debug, Error, PartialEq)]
pub enum SequencingError {
    #[error("setup matrix is incomplete: {missing} required pair(s) missing, first is ({from},{to})")]
    IncompleteMatrix { missing: usize, from: Task, to: Task },

    #[error("unknown heuristic `{0}`, expected one of h1, h2, h3, none")]
    UnknownHeuristic(String),

    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("heuristic h3 needs task families")]
    MissingFamilies,

    #[error("task list is empty")]
    EmptyTaskList,

    #[error("task {0} appears more than once")]
    DuplicateTask(Task),

    #[error("task id 0 is reserved for the idle machine state")]
    InvalidTask,

    #[error("malformed cost key `{0}`, expected `(i,j)`")]
    MalformedCostKey(String),

    #[error("setup cost {cost} for ({from},{to}) must be a non-negative number")]
    InvalidCost { from: Task, to: Task, cost: f64 },
}
