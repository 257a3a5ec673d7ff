//! Parallel fan-out of layouts to the cost oracle.

use super::Candidate;
use crate::error::{CfResult, ChordError};
use crate::layout::Layout;
use crate::oracle::CostOracle;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Results of one batch, in input order.
pub struct Batch {
    pub candidates: Vec<Candidate>,
    pub failed: usize,
}

/// Owns the worker pool and the immutable inputs every job shares.
pub struct Evaluator {
    oracle: Arc<dyn CostOracle>,
    keys: Arc<str>,
    key_count: usize,
    pool: rayon::ThreadPool,
}

impl Evaluator {
    /// `workers == 0` sizes the pool to the machine.
    pub fn new(oracle: Arc<dyn CostOracle>, keys: &str, workers: usize) -> CfResult<Self> {
        let threads = if workers == 0 {
            default_workers()
        } else {
            workers
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ChordError::Config(format!("cannot start worker pool: {}", e)))?;

        let key_count = keys.chars().count();
        debug!("Evaluator: {} workers, {} keys", threads, key_count);
        Ok(Self {
            oracle,
            keys: Arc::from(keys),
            key_count,
            pool,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of characters in the key sequence.
    pub fn key_count(&self) -> usize {
        self.key_count
    }

    /// Scores one layout on the calling thread.
    pub fn evaluate(&self, layout: &Layout) -> f64 {
        try_score(self.oracle.as_ref(), layout, &self.keys).unwrap_or(f64::INFINITY)
    }

    /// Scores every layout on the pool. A failed evaluation never aborts the
    /// batch: its candidate is kept with an infinite cost and counted.
    pub fn evaluate_all(&self, layouts: Vec<Layout>) -> Batch {
        let failed = AtomicUsize::new(0);
        let oracle = self.oracle.as_ref();
        let keys: &str = &self.keys;

        let candidates = self.pool.install(|| {
            layouts
                .into_par_iter()
                .map(|layout| {
                    let cost = try_score(oracle, &layout, keys).unwrap_or_else(|| {
                        failed.fetch_add(1, Ordering::Relaxed);
                        f64::INFINITY
                    });
                    Candidate { layout, cost }
                })
                .collect()
        });

        Batch {
            candidates,
            failed: failed.into_inner(),
        }
    }
}

/// `None` when the oracle errors or returns something that is not a finite cost.
fn try_score(oracle: &dyn CostOracle, layout: &Layout, keys: &str) -> Option<f64> {
    match oracle.score(layout, keys) {
        Ok(cost) if cost.is_finite() => Some(cost),
        Ok(cost) => {
            warn!("Oracle returned {} for {}", cost, layout.canonical_form());
            None
        }
        Err(e) => {
            warn!("Evaluation failed: {}", e);
            None
        }
    }
}
