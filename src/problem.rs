//! Problem files: tasks, setup costs and optional family and display names,
//! stored as JSON with `"(i,j)"` cost keys.

use crate::config::GeneratorConfig;
use crate::family::TaskFamily;
use crate::matrix::{Cost, SetupMatrix, Task, START};
use crate::search::SearchEngine;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    pub tasks: Vec<Task>,
    pub setup_costs: IndexMap<String, Cost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub families: Option<IndexMap<Task, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<IndexMap<Task, String>>,
}

impl ProblemFile {
    /// Wire form of a problem, cost keys ordered by `(from, to)`.
    pub fn new(tasks: &[Task], matrix: &SetupMatrix, families: Option<&TaskFamily>) -> Self {
        ProblemFile {
            tasks: tasks.to_vec(),
            setup_costs: matrix.wire_entries().into_iter().collect(),
            families: families.map(|families| {
                families
                    .iter()
                    .map(|(task, family)| (task, family.to_string()))
                    .collect()
            }),
            names: None,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read problem file {}", path.display()))?;
        let problem: ProblemFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse problem file {}", path.display()))?;
        debug!(path = %path.display(), tasks = problem.tasks.len(), "problem loaded");
        Ok(problem)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write problem file {}", path.display()))
    }

    /// Parse the cost keys and check the matrix is complete.
    pub fn into_problem(self) -> Result<Problem> {
        if self.tasks.is_empty() {
            bail!("problem has no tasks");
        }
        let matrix = SetupMatrix::from_wire(self.tasks.iter().copied(), self.setup_costs)
            .context("invalid setup costs")?;
        matrix.ensure_complete().context("invalid setup costs")?;
        let families = self.families.map(TaskFamily::new);
        Ok(Problem {
            tasks: self.tasks,
            matrix,
            families,
            names: self.names.unwrap_or_default(),
        })
    }
}

/// A loaded and validated problem instance.
#[derive(Debug, Clone)]
pub struct Problem {
    pub tasks: Vec<Task>,
    pub matrix: SetupMatrix,
    pub families: Option<TaskFamily>,
    pub names: IndexMap<Task, String>,
}

impl Problem {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        ProblemFile::load(path)?.into_problem()
    }

    pub fn engine(&self) -> crate::error::Result<SearchEngine> {
        SearchEngine::new(&self.tasks, &self.matrix, self.families.as_ref())
    }

    /// Display name of `task`, its id when it has none.
    pub fn name_of(&self, task: Task) -> String {
        match self.names.get(&task) {
            Some(name) => name.clone(),
            None if task == START => "idle".to_string(),
            None => task.to_string(),
        }
    }
}

/// Random complete problem shaped by `config`. The same seed always gives the
/// same problem.
pub fn generate(config: &GeneratorConfig) -> Result<ProblemFile> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut sample = |(lo, hi): (u32, u32)| rng.random_range(lo.min(hi)..=lo.max(hi)) as Cost;
    let tasks = (1..=config.num_tasks as Task).collect_vec();
    let families = (config.num_families > 0).then(|| {
        TaskFamily::new(tasks.iter().map(|&task| {
            let family = (task as usize - 1) % config.num_families;
            (task, format!("F{}", family + 1))
        }))
    });
    let same_family = |a: Task, b: Task| families.as_ref().is_some_and(|f| f.same_family(a, b));
    let costs = std::iter::once(START)
        .chain(tasks.iter().copied())
        .cartesian_product(tasks.iter().copied())
        .filter(|(from, to)| from != to)
        .map(|(from, to)| {
            let range = if from == START {
                config.start_cost
            } else if same_family(from, to) {
                config.intra_family_cost
            } else {
                config.inter_family_cost
            };
            ((from, to), sample(range))
        })
        .collect_vec();
    let matrix = SetupMatrix::new(tasks.iter().copied(), costs)?;
    Ok(ProblemFile::new(&tasks, &matrix, families.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfigBuilder;
    use crate::heuristic::Heuristic;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PAINT_LINE: &str = r#"{
        "tasks": [1, 2, 3, 4],
        "setup_costs": {
            "(0,1)": 15, "(0,2)": 18, "(0,3)": 12, "(0,4)": 20,
            "(1,2)": 25, "(1,3)": 8, "(1,4)": 12,
            "(2,1)": 22, "(2,3)": 30, "(2,4)": 28,
            "(3,1)": 10, "(3,2)": 35, "(3,4)": 6,
            "(4,1)": 14, "(4,2)": 32, "(4,3)": 5
        },
        "families": {"1": "warm", "2": "cool", "3": "cool", "4": "warm"},
        "names": {"1": "Red", "2": "Blue", "3": "Green", "4": "Yellow"}
    }"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_paint_line() {
        let file = write_temp(PAINT_LINE);
        let problem = Problem::load(file.path()).unwrap();
        assert_eq!(problem.tasks, vec![1, 2, 3, 4]);
        assert!(problem.matrix.validate_matrix());
        assert_eq!(problem.matrix.get_setup_cost(4, 3), 5.0);
        assert_eq!(problem.name_of(3), "Green");
        assert_eq!(problem.name_of(START), "idle");
        let families = problem.families.as_ref().unwrap();
        assert!(families.same_family(2, 3));
        let schedule = problem.engine().unwrap().a_star(Some(Heuristic::H3)).unwrap();
        assert_eq!(schedule.total_cost, 54.0);
    }

    #[test]
    fn test_save_and_load() {
        let problem = generate(&GeneratorConfig::default()).unwrap();
        let file = NamedTempFile::new().unwrap();
        problem.save(file.path()).unwrap();
        assert_eq!(ProblemFile::load(file.path()).unwrap(), problem);
    }

    #[test]
    fn test_problem_file_from_parts() {
        let file = write_temp(PAINT_LINE);
        let problem = Problem::load(file.path()).unwrap();
        let wire = ProblemFile::new(&problem.tasks, &problem.matrix, problem.families.as_ref());
        assert_eq!(wire.setup_costs.len(), 16);
        assert_eq!(wire.setup_costs.get_index(0), Some((&"(0,1)".to_string(), &15.0)));
        assert_eq!(wire.families.as_ref().unwrap().get(&3).unwrap(), "cool");
        let reloaded = wire.into_problem().unwrap();
        assert_eq!(reloaded.matrix.get_setup_cost(4, 3), 5.0);
        assert_eq!(reloaded.families, problem.families);
    }

    #[test]
    fn test_rejects_malformed_key() {
        let file = write_temp(r#"{"tasks": [1], "setup_costs": {"0->1": 3}}"#);
        let err = Problem::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("0->1"));
    }

    #[test]
    fn test_rejects_incomplete_matrix() {
        let file = write_temp(r#"{"tasks": [1, 2], "setup_costs": {"(0,1)": 3, "(1,2)": 4}}"#);
        let err = Problem::load(file.path()).unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.to_string().contains("incomplete")));
    }

    #[test]
    fn test_rejects_missing_file_and_empty_tasks() {
        assert!(ProblemFile::load("/nonexistent/problem.json").is_err());
        let file = write_temp(r#"{"tasks": [], "setup_costs": {}}"#);
        assert!(Problem::load(file.path()).is_err());
    }

    #[test]
    fn test_generated_problems_validate() {
        for seed in 0..5 {
            let config = GeneratorConfigBuilder::default()
                .num_tasks(5)
                .num_families(seed as usize % 3)
                .seed(seed)
                .build()
                .unwrap();
            let file = generate(&config).unwrap();
            assert_eq!(file.families.is_some(), config.num_families > 0);
            let problem = file.into_problem().unwrap();
            assert_eq!(problem.tasks.len(), 5);
            assert!(problem.matrix.validate_matrix());
        }
    }

    #[test]
    fn test_generator_cost_ranges() {
        let config = GeneratorConfigBuilder::default()
            .num_tasks(4)
            .num_families(2)
            .start_cost((7, 7))
            .intra_family_cost((1, 1))
            .inter_family_cost((30, 30))
            .build()
            .unwrap();
        let problem = generate(&config).unwrap().into_problem().unwrap();
        assert_eq!(problem.matrix.get_setup_cost(START, 2), 7.0);
        // tasks 1 and 3 share family F1
        assert_eq!(problem.matrix.get_setup_cost(1, 3), 1.0);
        assert_eq!(problem.matrix.get_setup_cost(1, 2), 30.0);
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());
    }
}
