use super::CheckpointLogger;
use crate::reports;
use chordforge::config::Config;
use chordforge::corpus::char_counts;
use chordforge::error::CfResult;
use chordforge::optimizer::{run_colony, AntColony, Evaluator, GenerationOptions, PheromoneOptions};
use chordforge::oracle::KeyerSimulator;
use chordforge::profile::KeyerProfile;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct ColonyArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short, long, default_value = "best_layout.txt")]
    pub output: PathBuf,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    /// Print the pheromone heat map before and after the run.
    #[arg(long, default_value_t = false)]
    pub show_pheromones: bool,
}

pub fn run(args: &ColonyArgs, config: &Config, profile: &KeyerProfile, keys: &str) -> CfResult<()> {
    let counts = char_counts(keys);
    let space = profile.colony_space()?;

    info!(
        "Characters needed: {}, chords available: {}",
        counts.len(),
        space.len()
    );
    if space.len() < counts.len() {
        warn!("Not enough chords for every character; layouts will be partial");
    }
    for f in &profile.forced {
        info!("Forced: {:?} -> {}", f.character, f.chord);
    }

    let mut colony = AntColony::new(
        counts.keys().copied(),
        &space,
        profile.forced.clone(),
        profile.shared_alias.clone(),
        PheromoneOptions::from(config),
    )
    .with_constraints(profile.constraints());
    if args.show_pheromones {
        reports::print_pheromones(colony.matrix(), colony.forced());
    }

    let evaluator = Evaluator::new(Arc::new(KeyerSimulator::new()), keys, config.eval.workers)?;
    let options = GenerationOptions {
        seed: args.seed,
        ..GenerationOptions::from(config)
    };

    let mut logger = CheckpointLogger::new(args.output.clone(), evaluator.key_count(), "Generation");
    let outcome = run_colony(&mut colony, &evaluator, &options, &mut logger)?;

    if args.show_pheromones {
        reports::print_pheromones(colony.matrix(), colony.forced());
    }

    info!("\n=== 🏆 FINAL RESULT ===");
    match &outcome.best {
        Some(best) => {
            info!(
                "Cost: {:.1}ms after {} generations ({})",
                best.cost, outcome.generations, outcome.stop_reason
            );
            reports::print_layout("ANT COLONY", &best.layout);
        }
        None => warn!("No generation produced a usable layout"),
    }

    match logger.save_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
