use anyhow::{Context, Result};
use changeover_search::config::{Algorithm, GeneratorConfigBuilder, SearchConfig};
use changeover_search::heuristic::parse_heuristic;
use changeover_search::matrix::START;
use changeover_search::problem::{generate, Problem};
use changeover_search::search::Schedule;
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "changeover-search")]
#[command(about = "Order tasks on one machine to minimize sequence-dependent setup costs", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file with one algorithm
    Solve {
        /// Path to the problem JSON file
        problem: PathBuf,

        /// Search algorithm, e.g. a-star, ida-star, bfs, uniform-cost
        #[arg(short, long, default_value = "a-star")]
        algorithm: String,

        /// Heuristic for the informed algorithms: h1, h2, h3 or none
        #[arg(long, default_value = "h1")]
        heuristic: String,

        /// Cutoff for depth-limited search
        #[arg(long)]
        depth_limit: Option<usize>,
    },

    /// Run every algorithm on a problem file and compare the results
    Compare {
        /// Path to the problem JSON file
        problem: PathBuf,

        /// Heuristic for the informed algorithms: h1, h2, h3 or none
        #[arg(long, default_value = "h1")]
        heuristic: String,
    },

    /// Write a random problem file
    Generate {
        #[arg(short, long, default_value_t = 6)]
        tasks: usize,

        /// Number of task families, 0 for none
        #[arg(short, long, default_value_t = 2)]
        families: usize,

        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Print to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            problem,
            algorithm,
            heuristic,
            depth_limit,
        } => {
            let problem = Problem::load(&problem)?;
            let config = SearchConfig {
                algorithm: algorithm.parse()?,
                heuristic: parse_heuristic(&heuristic)?,
                depth_limit,
            };
            solve(&problem, &config)
        }
        Commands::Compare { problem, heuristic } => {
            let problem = Problem::load(&problem)?;
            compare(&problem, &heuristic)
        }
        Commands::Generate {
            tasks,
            families,
            seed,
            output,
        } => {
            let config = GeneratorConfigBuilder::default()
                .num_tasks(tasks)
                .num_families(families)
                .seed(seed)
                .build()?;
            let problem = generate(&config)?;
            match output {
                Some(path) => problem.save(&path),
                None => {
                    println!("{}", serde_json::to_string_pretty(&problem)?);
                    Ok(())
                }
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn solve(problem: &Problem, config: &SearchConfig) -> Result<()> {
    let engine = problem.engine()?;
    let start = Instant::now();
    let schedule = engine
        .run(config)
        .with_context(|| format!("{} failed", config.algorithm))?;
    let elapsed = start.elapsed();
    if !schedule.is_feasible() {
        println!("{}: no feasible sequence", config.algorithm);
        return Ok(());
    }
    println!(
        "{}: {}",
        config.algorithm,
        schedule.sequence.iter().map(|&task| problem.name_of(task)).join(" -> ")
    );
    std::iter::once(START)
        .chain(schedule.sequence.iter().copied())
        .tuple_windows()
        .for_each(|(from, to)| {
            println!(
                "  {:>12} -> {:<12} {:>10}",
                problem.name_of(from),
                problem.name_of(to),
                problem.matrix.get_setup_cost(from, to)
            )
        });
    println!("total setup cost: {}", schedule.total_cost);
    print_stats(&schedule, elapsed);
    Ok(())
}

fn print_stats(schedule: &Schedule, elapsed: Duration) {
    println!(
        "expanded {} / generated {} / iterations {} in {:.3?}",
        schedule.stats.expanded, schedule.stats.generated, schedule.stats.iterations, elapsed
    );
}

fn compare(problem: &Problem, heuristic: &str) -> Result<()> {
    let heuristic = parse_heuristic(heuristic)?;
    let engine = problem.engine()?;
    let algorithms = Algorithm::all_possibles().collect_vec();
    let bar = ProgressBar::new(algorithms.len() as u64).with_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")?,
    );
    let results: Vec<_> = algorithms
        .par_iter()
        .progress_with(bar.clone())
        .map(|&algorithm| {
            let config = SearchConfig {
                algorithm,
                heuristic,
                depth_limit: None,
            };
            let start = Instant::now();
            let schedule = engine.run(&config);
            (algorithm, schedule, start.elapsed())
        })
        .collect();
    bar.finish_and_clear();

    println!(
        "{:<20} {:>9} {:>12} {:>10} {:>10} {:>10} {:>12}",
        "algorithm", "heuristic", "cost", "expanded", "generated", "iterations", "time"
    );
    for (algorithm, schedule, elapsed) in results {
        let schedule = schedule.with_context(|| format!("{algorithm} failed"))?;
        let used = match heuristic {
            Some(heuristic) if algorithm.is_informed() => heuristic.as_str(),
            _ => "-",
        };
        println!(
            "{:<20} {:>9} {:>12} {:>10} {:>10} {:>10} {:>12.3?}",
            algorithm.as_str(),
            used,
            schedule.total_cost,
            schedule.stats.expanded,
            schedule.stats.generated,
            schedule.stats.iterations,
            elapsed
        );
    }
    Ok(())
}
