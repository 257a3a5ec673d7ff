pub mod beam;
pub mod colony;
pub mod evaluation;
pub mod mutation;
pub mod pheromone;

pub use self::beam::{BeamOptions, BeamSearch};
pub use self::colony::{run_colony, GenerationOptions};
pub use self::evaluation::Evaluator;
pub use self::pheromone::{AntColony, PheromoneOptions};

use crate::layout::Layout;
use strum_macros::Display;

/// A layout with its oracle cost. Failed evaluations carry `f64::INFINITY`.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub layout: Layout,
    pub cost: f64,
}

impl Candidate {
    pub fn is_scored(&self) -> bool {
        self.cost.is_finite()
    }
}

/// Ascending by cost; infinities sort last.
pub(crate) fn sort_by_cost(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

/// Why a search loop returned. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StopReason {
    #[strum(to_string = "round limit reached")]
    RoundLimit,
    #[strum(to_string = "no novel neighbors left")]
    Exhausted,
    #[strum(to_string = "stopped by observer")]
    Interrupted,
}

/// Summary of one beam iteration or one colony generation.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: usize,
    /// Layouts sent to the oracle this round.
    pub evaluated: usize,
    /// Of those, how many came back without a usable cost.
    pub failed: usize,
    pub round_best: f64,
    pub global_best: f64,
    pub improved: bool,
}

/// Hooks the driving loops call between parallel phases.
///
/// `on_new_best` fires before `on_round` for the same round, so a checkpoint is
/// always written before the observer gets a chance to stop the run.
pub trait SearchObserver {
    fn on_new_best(&mut self, _round: usize, _best: &Candidate) {}

    /// Return `false` to stop after this round.
    fn on_round(&mut self, _report: &RoundReport) -> bool {
        true
    }
}

pub struct SilentObserver;

impl SearchObserver for SilentObserver {}
