pub mod beam;
pub mod chords;
pub mod colony;
pub mod score;

use chordforge::error::ChordError;
use chordforge::layout_file::{save_layout, LayoutHeader};
use chordforge::optimizer::{Candidate, RoundReport, SearchObserver};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Logs every round and rewrites the output file on each new best, so an
/// interrupted run still leaves its best layout on disk.
pub struct CheckpointLogger {
    path: PathBuf,
    key_count: usize,
    label: &'static str,
    started: Instant,
    pub save_error: Option<ChordError>,
}

impl CheckpointLogger {
    pub fn new(path: PathBuf, key_count: usize, label: &'static str) -> Self {
        Self {
            path,
            key_count,
            label,
            started: Instant::now(),
            save_error: None,
        }
    }
}

impl SearchObserver for CheckpointLogger {
    fn on_new_best(&mut self, round: usize, best: &Candidate) {
        info!(
            "{} {}: new best {:.1}ms *** saved to {}",
            self.label,
            round,
            best.cost,
            self.path.display()
        );
        let header = LayoutHeader {
            generation: round,
            cost_ms: best.cost,
            key_count: self.key_count,
        };
        if let Err(e) = save_layout(&self.path, &best.layout, &header) {
            error!("Could not save {}: {}", self.path.display(), e);
            self.save_error.get_or_insert(e);
        }
    }

    fn on_round(&mut self, report: &RoundReport) -> bool {
        info!(
            "{} {:5} | evaluated {:6} ({} failed) | round best {:.1}ms | best {:.1}ms | {:.0}s",
            self.label,
            report.round,
            report.evaluated,
            report.failed,
            report.round_best,
            report.global_best,
            self.started.elapsed().as_secs_f32()
        );
        true
    }
}
