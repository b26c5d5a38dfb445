//! Exact solver binary.
//!
//! Usage:
//!   cargo run --release --bin solve -- [OPTIONS]
//!
//! Solves every board of the configured game, prints the expected optimal
//! score and the best play for each opening roll, and optionally exports
//! the value table and a resumable snapshot.

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use shut_the_box_solver::exact::{
    Board, Decision, ExactSolver, SolutionOutput, SolverConfig, SolverState,
};

#[derive(Parser)]
#[command(name = "solve")]
#[command(about = "Exact expected-score solver for shut the box")]
struct Cli {
    /// Number of tiles, numbered 1..=N
    #[arg(short = 'n', long, default_value_t = 9)]
    board_size: u8,
    /// Number of dice rolled each turn
    #[arg(short, long, default_value_t = 2)]
    dice: u8,
    /// Sides per die
    #[arg(short, long, default_value_t = 6)]
    sides: u8,
    /// Configuration JSON file (overrides the three options above)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Solve each cardinality level in parallel
    #[arg(short, long)]
    parallel: bool,
    /// Worker threads for the parallel solve (default: auto)
    #[arg(short, long)]
    threads: Option<usize>,
    /// Write the value table to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Include the optimal decision for every board and roll in the output
    #[arg(long)]
    policy: bool,
    /// Write a resumable solver snapshot to this JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Load a snapshot before solving
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Standing tiles to query, comma separated (e.g. 1,4,9)
    #[arg(long, value_delimiter = ',')]
    query: Vec<u8>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    println!("=================================================");
    println!("  Shut the Box Exact Solver");
    println!("=================================================");
    println!();

    let mut config = match &cli.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            SolverConfig::from_json_file(path)?
        }
        None => SolverConfig::new()
            .with_board_size(cli.board_size)
            .with_dice(cli.dice)
            .with_sides(cli.sides),
    };
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }

    println!("Tiles: 1..={}", config.board_size);
    println!("Dice: {}d{}", config.num_dice, config.num_sides);
    println!("States: {}", config.num_states());
    println!(
        "Threads: {}",
        config
            .num_threads
            .map_or("auto".to_string(), |t| t.to_string())
    );
    println!();

    let mut solver = ExactSolver::new(config)?;

    if let Some(path) = &cli.resume {
        println!("Resuming from snapshot: {}", path.display());
        solver.import_state(SolverState::from_json_file(path)?)?;
        println!("Loaded {} memoized states", solver.num_states());
        println!();
    }

    println!("Solving...");
    let start_time = Instant::now();
    let stats = if cli.parallel {
        solver.solve_parallel()?.clone()
    } else {
        solver.solve().clone()
    };

    println!();
    println!("Solve complete!");
    println!("Expected score: {:.6}", stats.root_value);
    println!("States: {} over {} levels", stats.states, stats.levels);
    println!("Total time: {:.3}s", start_time.elapsed().as_secs_f64());
    println!("Speed: {:.0} states/second", stats.states_per_second);
    println!();

    println!("=== Opening Rolls ===");
    println!();
    let full = solver.full_board();
    for roll in solver.distribution().support() {
        let decision = solver.decide(full, roll)?;
        let value = match decision {
            Decision::Flip(flip) => solver.expected_value(full.without(flip))?,
            Decision::Stop => solver.stop_value(full),
        };
        println!(
            "Roll {:>3} ({:>5.2}%): {:<16} -> {:.4}",
            roll,
            solver.distribution().probability(roll) * 100.0,
            decision.to_string(),
            value
        );
    }
    println!();

    if !cli.query.is_empty() {
        let board = Board::from_values(&cli.query, solver.config().board_size)?;
        println!("=== Board {} ===", board);
        println!("Expected score: {:.6}", solver.expected_value(board)?);
        println!("Stop value: {:.0}", solver.stop_value(board));
        for roll in solver.distribution().support() {
            let ranked = solver.ranked_flips(board, roll)?;
            let choices: Vec<String> = ranked
                .iter()
                .take(3)
                .map(|(flip, value)| format!("{} {:.4}", flip, value))
                .collect();
            println!(
                "  Roll {:>3}: {} | {}",
                roll,
                solver.decide(board, roll)?,
                if choices.is_empty() {
                    "no legal flip".to_string()
                } else {
                    choices.join(", ")
                }
            );
        }
        println!();
    }

    if let Some(path) = &cli.output {
        println!("Exporting results to {}...", path.display());
        let output = SolutionOutput::from_solver(&solver, cli.policy)?;
        output.save_json(path)?;
        println!(
            "Saved {} states ({} dead)",
            output.states.len(),
            output.dead_states().len()
        );
    }

    if let Some(path) = &cli.snapshot {
        println!("Writing snapshot to {}...", path.display());
        solver.export_state().save_json(path)?;
    }

    println!("Done!");
    Ok(())
}
