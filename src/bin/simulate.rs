//! Policy evaluation binary.
//!
//! Plays many seeded games with each selected policy and compares the
//! observed mean score with the exact expected value.
//!
//! Usage:
//!   cargo run --release --bin simulate -- --games 100000 --policy exact,largest

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use shut_the_box_solver::exact::{ExactSolver, SolverConfig};
use shut_the_box_solver::play::{simulate_with_callback, PolicyKind, SimulationSummary};

#[derive(Parser)]
#[command(name = "simulate")]
#[command(about = "Monte Carlo comparison of shut-the-box policies")]
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
    /// Games per policy
    #[arg(short, long, default_value_t = 100_000)]
    games: u64,
    /// Base random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Policies to evaluate, comma separated (default: all)
    #[arg(short, long, value_delimiter = ',')]
    policy: Vec<PolicyKind>,
    /// Worker threads (default: auto)
    #[arg(short, long)]
    threads: Option<usize>,
    /// Write the summaries to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SolverConfig::from_json_file(path)?,
        None => SolverConfig::new()
            .with_board_size(cli.board_size)
            .with_dice(cli.dice)
            .with_sides(cli.sides),
    };
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }
    let policies = if cli.policy.is_empty() {
        PolicyKind::ALL.to_vec()
    } else {
        cli.policy.clone()
    };

    println!("=== Shut the Box Policy Evaluation ===");
    println!(
        "Tiles: 1..={}, Dice: {}d{}, Games: {}, Seed: {}",
        config.board_size, config.num_dice, config.num_sides, cli.games, cli.seed
    );
    println!();

    let solve_start = Instant::now();
    let mut solver = ExactSolver::new(config.clone())?;
    let root_value = solver.solve_parallel()?.root_value;
    println!(
        "Exact expected score: {:.6} (solved in {:.2}s)",
        root_value,
        solve_start.elapsed().as_secs_f64()
    );
    println!();
    let solver = Arc::new(solver);

    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
        .progress_chars("#>-");

    let mut summaries: Vec<SimulationSummary> = Vec::with_capacity(policies.len());
    for kind in policies {
        let pb = ProgressBar::new(cli.games);
        pb.set_style(style.clone());
        pb.set_message(kind.to_string());

        let summary = simulate_with_callback(
            &config,
            cli.games,
            cli.seed,
            |seed| kind.build(seed, &solver),
            |_| pb.inc(1),
        )?;
        pb.finish_and_clear();
        summaries.push(summary);
    }

    println!(
        "{:<9} {:>10} {:>8} {:>8} {:>5} {:>5} {:>8} {:>7}",
        "policy", "mean", "stderr", "std", "min", "max", "shut %", "flips"
    );
    for s in &summaries {
        println!(
            "{:<9} {:>10.4} {:>8.4} {:>8.3} {:>5} {:>5} {:>7.2}% {:>7.2}",
            s.policy,
            s.mean_score,
            s.std_error(),
            s.std_dev,
            s.min_score,
            s.max_score,
            s.shut_rate * 100.0,
            s.mean_flips
        );
    }
    println!();
    println!("Exact value: {:.4}", root_value);

    if let Some(path) = &cli.output {
        let json = serde_json::to_string_pretty(&summaries)?;
        File::create(path)?.write_all(json.as_bytes())?;
        println!("Summaries saved to {}", path.display());
    }

    Ok(())
}
