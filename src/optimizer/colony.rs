use super::evaluation::Evaluator;
use super::pheromone::AntColony;
use super::{Candidate, RoundReport, SearchObserver, StopReason};
use crate::config::Config;
use crate::error::{CfResult, ChordError};
use crate::layout::Layout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub generations: usize,
    pub population: usize,
    pub seed: Option<u64>,
}

impl From<&Config> for GenerationOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            generations: cfg.colony.generations,
            population: cfg.colony.population,
            seed: None,
        }
    }
}

pub struct ColonyOutcome {
    /// `None` only when no generation produced a finite cost.
    pub best: Option<Candidate>,
    pub generations: usize,
    pub stop_reason: StopReason,
}

/// Construct, evaluate, learn from the generation winner, repeat.
///
/// Construction and pheromone updates run here on the calling thread; only
/// evaluation fans out to the pool.
pub fn run_colony<O: SearchObserver>(
    colony: &mut AntColony,
    evaluator: &Evaluator,
    options: &GenerationOptions,
    observer: &mut O,
) -> CfResult<ColonyOutcome> {
    if options.population == 0 {
        return Err(ChordError::Config("population must be at least 1".into()));
    }
    let mut rng = match options.seed {
        Some(s) => fastrand::Rng::with_seed(s),
        None => fastrand::Rng::new(),
    };

    info!(
        "Colony: {} generations x {} ants, {} pheromone cells, {} workers",
        options.generations,
        options.population,
        colony.matrix().len(),
        evaluator.workers()
    );

    let mut best: Option<Candidate> = None;
    let mut completed = 0;
    let mut stop_reason = StopReason::RoundLimit;

    for generation in 1..=options.generations {
        let mut partial = 0usize;
        let layouts: Vec<Layout> = (0..options.population)
            .map(|_| {
                let built = colony.construct_layout(&mut rng);
                if built.exhausted {
                    partial += 1;
                }
                built.layout
            })
            .collect();
        if partial > 0 {
            debug!("Generation {}: {} ants ran out of chords", generation, partial);
        }

        let batch = evaluator.evaluate_all(layouts);
        let evaluated = batch.candidates.len();
        let winner = batch
            .candidates
            .into_iter()
            .filter(Candidate::is_scored)
            .min_by(|a, b| a.cost.total_cmp(&b.cost));
        completed = generation;

        let round_best = winner.as_ref().map_or(f64::INFINITY, |w| w.cost);
        let improved = match (&winner, &best) {
            (Some(w), Some(b)) => w.cost < b.cost,
            (Some(_), None) => true,
            (None, _) => false,
        };

        match &winner {
            Some(w) => colony.update_pheromones(&w.layout),
            None => warn!("Generation {}: every layout failed evaluation", generation),
        }
        if improved {
            best = winner;
            if let Some(b) = &best {
                observer.on_new_best(generation, b);
            }
        }

        let report = RoundReport {
            round: generation,
            evaluated,
            failed: batch.failed,
            round_best,
            global_best: best.as_ref().map_or(f64::INFINITY, |b| b.cost),
            improved,
        };
        if !observer.on_round(&report) {
            stop_reason = StopReason::Interrupted;
            break;
        }
    }

    info!(
        "Colony finished after {} generations ({})",
        completed, stop_reason
    );
    Ok(ColonyOutcome {
        best,
        generations: completed,
        stop_reason,
    })
}
