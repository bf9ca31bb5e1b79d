use crate::error::{Result, SequencingError};
use crate::heuristic::Heuristic;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    BreadthFirst,
    DepthFirst,
    DepthLimited,
    IterativeDeepening,
    Bidirectional,
    UniformCost,
    Greedy,
    AStar,
    IdaStar,
}

impl Algorithm {
    pub fn all_possibles() -> impl Iterator<Item = Algorithm> {
        [
            Algorithm::BreadthFirst,
            Algorithm::DepthFirst,
            Algorithm::DepthLimited,
            Algorithm::IterativeDeepening,
            Algorithm::Bidirectional,
            Algorithm::UniformCost,
            Algorithm::Greedy,
            Algorithm::AStar,
            Algorithm::IdaStar,
        ]
        .into_iter()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::BreadthFirst => "breadth-first",
            Algorithm::DepthFirst => "depth-first",
            Algorithm::DepthLimited => "depth-limited",
            Algorithm::IterativeDeepening => "iterative-deepening",
            Algorithm::Bidirectional => "bidirectional",
            Algorithm::UniformCost => "uniform-cost",
            Algorithm::Greedy => "greedy",
            Algorithm::AStar => "a-star",
            Algorithm::IdaStar => "ida-star",
        }
    }

    /// Whether the algorithm orders its search by a heuristic estimate.
    pub fn is_informed(&self) -> bool {
        matches!(
            self,
            Algorithm::Greedy | Algorithm::AStar | Algorithm::IdaStar
        )
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SequencingError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let alias = match normalized.as_str() {
            "bfs" => "breadth-first",
            "dfs" => "depth-first",
            "dls" => "depth-limited",
            "iddfs" => "iterative-deepening",
            "ucs" => "uniform-cost",
            "astar" | "a*" => "a-star",
            "idastar" | "ida*" => "ida-star",
            other => other,
        };
        Algorithm::all_possibles()
            .find(|algorithm| algorithm.as_str() == alias)
            .ok_or_else(|| SequencingError::UnknownAlgorithm(s.to_string()))
    }
}

/// What to run against a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    /// Ignored by the uninformed algorithms.
    pub heuristic: Option<Heuristic>,
    /// Cutoff for depth-limited search, defaults to the number of tasks.
    pub depth_limit: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            algorithm: Algorithm::AStar,
            heuristic: Some(Heuristic::H1),
            depth_limit: None,
        }
    }
}

/// Shape of a randomly generated problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_tasks: usize,
    /// `0` generates a problem without families.
    pub num_families: usize,
    /// Inclusive cost range out of the idle machine.
    pub start_cost: (u32, u32),
    /// Inclusive cost range between tasks of the same family.
    pub intra_family_cost: (u32, u32),
    /// Inclusive cost range between tasks of different families.
    pub inter_family_cost: (u32, u32),
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            num_tasks: 6,
            num_families: 2,
            start_cost: (5, 20),
            intra_family_cost: (1, 5),
            inter_family_cost: (10, 40),
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names() {
        for algorithm in Algorithm::all_possibles() {
            assert_eq!(algorithm.as_str().parse::<Algorithm>(), Ok(algorithm));
        }
        assert_eq!("A*".parse::<Algorithm>(), Ok(Algorithm::AStar));
        assert_eq!("uniform_cost".parse::<Algorithm>(), Ok(Algorithm::UniformCost));
        assert_eq!(
            "simulated-annealing".parse::<Algorithm>(),
            Err(SequencingError::UnknownAlgorithm(
                "simulated-annealing".to_string()
            ))
        );
        assert_eq!(Algorithm::all_possibles().count(), 9);
    }

    #[test]
    fn test_informed_algorithms() {
        let informed = Algorithm::all_possibles()
            .filter(Algorithm::is_informed)
            .collect::<Vec<_>>();
        assert_eq!(
            informed,
            vec![Algorithm::Greedy, Algorithm::AStar, Algorithm::IdaStar]
        );
    }

    #[test]
    fn test_search_config_builder() {
        let config = SearchConfigBuilder::default()
            .algorithm(Algorithm::DepthLimited)
            .depth_limit(Some(3))
            .build()
            .unwrap();
        assert_eq!(config.algorithm, Algorithm::DepthLimited);
        assert_eq!(config.heuristic, Some(Heuristic::H1));
        assert_eq!(config.depth_limit, Some(3));
    }

    #[test]
    fn test_search_config_serde() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"algorithm": "ida-star", "heuristic": "h2"}"#).unwrap();
        assert_eq!(config.algorithm, Algorithm::IdaStar);
        assert_eq!(config.heuristic, Some(Heuristic::H2));
        assert_eq!(config.depth_limit, None);
        let config: SearchConfig = serde_json::from_str(r#"{"heuristic": null}"#).unwrap();
        assert_eq!(config.algorithm, Algorithm::AStar);
        assert_eq!(config.heuristic, None);
    }
}
