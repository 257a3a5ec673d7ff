pub mod keyer;

pub use self::keyer::KeyerSimulator;

use crate::chord::Chord;
use crate::layout::Layout;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("{character:?} is bound to {chord}, which the keyer cannot press")]
    UnreachableChord { character: char, chord: Chord },

    #[error("oracle failure: {0}")]
    Failed(String),
}

/// Estimates how long typing `keys` takes on `layout`, in milliseconds.
///
/// Implementations must be pure: the same inputs always give the same cost.
/// Evaluation runs on a worker pool, hence `Send + Sync`.
pub trait CostOracle: Send + Sync {
    fn score(&self, layout: &Layout, keys: &str) -> Result<f64, OracleError>;
}
