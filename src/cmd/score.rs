use crate::reports;
use chordforge::error::{CfResult, ChordError};
use chordforge::layout_file::load_layout;
use chordforge::oracle::{CostOracle, KeyerSimulator};
use chordforge::profile::KeyerProfile;
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(short, long, default_value = "best_layout.txt")]
    pub layout: PathBuf,
}

pub fn run(args: &ScoreArgs, profile: &KeyerProfile, keys: &str) -> CfResult<()> {
    info!("📂 Loading layout: {}", args.layout.display());
    let loaded = load_layout(&args.layout)?;

    for v in profile.constraints().violations(&loaded.layout) {
        warn!("{}", v);
    }

    let cost = KeyerSimulator::new()
        .score(&loaded.layout, keys)
        .map_err(|e| ChordError::Validation(e.to_string()))?;

    reports::print_layout("SCORED", &loaded.layout);
    reports::print_score(&reports::ScoreSummary {
        characters: loaded.layout.len(),
        dropped: loaded.dropped,
        generation: loaded.generation,
        stored_ms: loaded.cost_ms,
        computed_ms: cost,
        key_count: keys.chars().count(),
    });
    Ok(())
}
