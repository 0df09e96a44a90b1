//! Structured run logging.
//!
//! Every lifecycle event carries the input and output paths so that runs
//! can be told apart in aggregated JSON logs.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use stab_models::StabilizationReport;
use stab_media::StabilizeProgress;
use tracing::{info, warn, Span};

/// Progress is logged each time the overall percentage crosses a multiple of this.
const PROGRESS_STEP: f64 = 10.0;

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    input: String,
    output: String,
    last_step: Arc<AtomicU64>,
}

impl RunLogger {
    pub fn new(input: &Path, output: &Path) -> Self {
        Self {
            input: input.display().to_string(),
            output: output.display().to_string(),
            last_step: Arc::new(AtomicU64::new(u64::MAX)),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(
            input = %self.input,
            output = %self.output,
            "Run started: {}", message
        );
    }

    /// Log a progress update, at most once per step.
    ///
    /// Returns whether anything was logged.
    pub fn log_progress(&self, progress: &StabilizeProgress) -> bool {
        let step = (progress.overall_percentage() / PROGRESS_STEP).floor() as u64;
        if self.last_step.swap(step, Ordering::Relaxed) == step {
            return false;
        }
        info!(
            input = %self.input,
            pass = %progress.pass,
            frame = progress.frame,
            total_frames = progress.total_frames,
            average_tracked = progress.average_tracked_points,
            "Run progress: {:.0}%", progress.overall_percentage()
        );
        true
    }

    /// Log a warning during the run.
    pub fn log_warning(&self, message: &str) {
        warn!(
            input = %self.input,
            output = %self.output,
            "Run warning: {}", message
        );
    }

    /// Log the completion of a run.
    pub fn log_completion(&self, report: &StabilizationReport) {
        info!(
            input = %self.input,
            output = %self.output,
            frames_read = report.frames_read,
            frames_written = report.frames_written,
            failures = report.estimation_failures,
            average_tracked = report.average_tracked_points,
            "Run completed"
        );
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", input = %self.input, output = %self.output)
    }
}
