use super::CheckpointLogger;
use crate::reports;
use chordforge::config::Config;
use chordforge::error::{CfResult, ChordError};
use chordforge::layout_file::load_layout;
use chordforge::optimizer::{BeamOptions, BeamSearch, Evaluator};
use chordforge::oracle::KeyerSimulator;
use chordforge::profile::KeyerProfile;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct BeamArgs {
    #[command(flatten)]
    pub config: Config,

    /// Seed layout to start from.
    #[arg(short, long, default_value = "best_layout.txt")]
    pub layout: PathBuf,

    #[arg(short, long, default_value = "best_layout_beam.txt")]
    pub output: PathBuf,
}

pub fn run(args: &BeamArgs, config: &Config, profile: &KeyerProfile, keys: &str) -> CfResult<()> {
    info!("📂 Loading seed layout: {}", args.layout.display());
    let loaded = load_layout(&args.layout)?;
    if loaded.layout.is_empty() {
        return Err(ChordError::Validation(format!(
            "{} has no chord assignments",
            args.layout.display()
        )));
    }
    if loaded.dropped > 0 {
        warn!("{} malformed entries were skipped", loaded.dropped);
    }

    let space = profile.search_space()?;
    let constraints = profile.constraints();

    // Layouts built by the colony carry no thumb variants; derive them here.
    let mut seed = loaded.layout;
    let before = seed.clone();
    constraints.apply_thumb_variants(&mut seed);
    for (base, variant) in constraints.thumb_pairs() {
        if seed.primary(variant) != before.primary(variant) {
            if let Some(chord) = seed.primary(variant) {
                info!("Thumb variant {:?} of {:?} set to {}", variant, base, chord);
            }
        }
    }
    info!(
        "Search universe: {} chords [{}], {} characters",
        space.len(),
        space.profile().describe(),
        seed.len()
    );

    let evaluator = Evaluator::new(Arc::new(KeyerSimulator::new()), keys, config.eval.workers)?;
    let options = BeamOptions::from(config);
    info!(
        "Beam width {}, at most {} iterations, {} workers",
        options.beam_width,
        options.max_iterations,
        evaluator.workers()
    );

    let mut search = BeamSearch::new(&evaluator, &space, &constraints, options, seed)?;
    if let Some(stored) = loaded.cost_ms {
        info!(
            "Stored cost {:.1}ms, re-evaluated {:.1}ms",
            stored,
            search.best().cost
        );
    }

    let mut logger = CheckpointLogger::new(args.output.clone(), evaluator.key_count(), "Iteration");
    let outcome = search.run(&mut logger);

    info!("\n=== 🏆 FINAL RESULT ===");
    info!(
        "Cost: {:.1}ms after {} iterations ({}), {} layouts visited",
        outcome.best.cost, outcome.iterations, outcome.stop_reason, outcome.visited
    );
    reports::print_layout("BEAM SEARCH", &outcome.best.layout);

    match logger.save_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
