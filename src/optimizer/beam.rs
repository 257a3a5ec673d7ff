use super::evaluation::Evaluator;
use super::mutation::mutate;
use super::{sort_by_cost, Candidate, RoundReport, SearchObserver, StopReason};
use crate::chord::ChordSpace;
use crate::config::Config;
use crate::constraints::LayoutConstraints;
use crate::error::{CfResult, ChordError};
use crate::layout::{Layout, VisitedSet};
use itertools::Itertools;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BeamOptions {
    pub beam_width: usize,
    pub max_iterations: usize,
}

impl From<&Config> for BeamOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            beam_width: cfg.beam.beam_width,
            max_iterations: cfg.beam.max_iterations,
        }
    }
}

pub struct BeamOutcome {
    pub best: Candidate,
    pub iterations: usize,
    pub visited: usize,
    pub stop_reason: StopReason,
}

pub enum Step {
    Advanced(RoundReport),
    /// Every neighbor of the current seed has been seen before.
    Exhausted,
}

/// Bounded-frontier local search over single-swap neighborhoods.
///
/// Each iteration expands only the best member of the beam. The visited set
/// and the beam are the only state carried between iterations.
pub struct BeamSearch<'a> {
    evaluator: &'a Evaluator,
    space: &'a ChordSpace,
    constraints: &'a LayoutConstraints,
    options: BeamOptions,
    beam: Vec<Candidate>,
    best: Candidate,
    visited: VisitedSet,
    iterations: usize,
}

impl<'a> BeamSearch<'a> {
    /// Scores the seed and marks it visited. A seed that breaks the layout
    /// constraints is rejected, since mutation only preserves what it is given.
    pub fn new(
        evaluator: &'a Evaluator,
        space: &'a ChordSpace,
        constraints: &'a LayoutConstraints,
        options: BeamOptions,
        seed: Layout,
    ) -> CfResult<Self> {
        if options.beam_width == 0 {
            return Err(ChordError::Config("beam_width must be at least 1".into()));
        }
        let violations = constraints.violations(&seed);
        if !violations.is_empty() {
            return Err(ChordError::Validation(violations.iter().join("; ")));
        }

        let mut visited = VisitedSet::new();
        visited.insert(seed.fingerprint());
        let cost = evaluator.evaluate(&seed);
        info!("Seed layout: {} characters, cost {:.1}ms", seed.len(), cost);

        let start = Candidate { layout: seed, cost };
        Ok(Self {
            evaluator,
            space,
            constraints,
            options,
            beam: vec![start.clone()],
            best: start,
            visited,
            iterations: 0,
        })
    }

    pub fn best(&self) -> &Candidate {
        &self.best
    }

    pub fn beam(&self) -> &[Candidate] {
        &self.beam
    }

    pub fn visited(&self) -> usize {
        self.visited.len()
    }

    pub fn step(&mut self) -> Step {
        let seed = &self.beam[0].layout;
        let visited = &mut self.visited;
        let mut generated = 0usize;

        let fresh: Vec<Layout> = mutate(seed, self.space, self.constraints)
            .inspect(|_| generated += 1)
            .filter(|next| visited.insert(next.fingerprint()))
            .collect();

        if fresh.is_empty() {
            return Step::Exhausted;
        }
        self.iterations += 1;
        debug!(
            "Iteration {}: {} neighbors, {} novel",
            self.iterations,
            generated,
            fresh.len()
        );

        let batch = self.evaluator.evaluate_all(fresh);
        let evaluated = batch.candidates.len();

        let mut ranked: Vec<Candidate> = batch
            .candidates
            .into_iter()
            .filter(Candidate::is_scored)
            .collect();
        sort_by_cost(&mut ranked);
        ranked.truncate(self.options.beam_width);

        let round_best = ranked.first().map_or(f64::INFINITY, |c| c.cost);
        // An all-failed round keeps the old beam so there is still a seed.
        if !ranked.is_empty() {
            self.beam = ranked;
        }

        let improved = round_best < self.best.cost;
        if improved {
            self.best = self.beam[0].clone();
        }

        Step::Advanced(RoundReport {
            round: self.iterations,
            evaluated,
            failed: batch.failed,
            round_best,
            global_best: self.best.cost,
            improved,
        })
    }

    pub fn run<O: SearchObserver>(&mut self, observer: &mut O) -> BeamOutcome {
        let stop_reason = loop {
            if self.iterations >= self.options.max_iterations {
                break StopReason::RoundLimit;
            }
            match self.step() {
                Step::Exhausted => break StopReason::Exhausted,
                Step::Advanced(report) => {
                    if report.improved {
                        observer.on_new_best(report.round, &self.best);
                    }
                    if !observer.on_round(&report) {
                        break StopReason::Interrupted;
                    }
                }
            }
        };

        info!(
            "Beam search finished after {} iterations ({}), best {:.1}ms",
            self.iterations, stop_reason, self.best.cost
        );
        BeamOutcome {
            best: self.best.clone(),
            iterations: self.iterations,
            visited: self.visited.len(),
            stop_reason,
        }
    }
}
