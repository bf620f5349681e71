//! Upload workflow glue
//!
//! Ties the synchronous file validator to the staged notifier. The
//! boundary is strict: only a non-empty accepted batch ever starts a
//! simulated run, so the number of started runs equals the number of
//! accepted batches, not the number of raw drop events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::NotifierError;
use crate::notifier::{ProgressStep, RunHandle, RunOptions, StagedProgressNotifier, StepKind};
use crate::validate::{FileCandidate, RejectedFile, ValidationPolicy};

/// What a single drop event produced
#[derive(Debug)]
pub struct DropOutcome {
    /// Handle of the started run, if any files were accepted
    pub run: Option<RunHandle>,
    /// Files that failed validation, for the modal-alert path
    pub rejected: Vec<RejectedFile>,
}

/// Drop handler for the statement-upload surface
pub struct UploadController {
    notifier: Arc<StagedProgressNotifier>,
    policy: ValidationPolicy,
    runs_started: AtomicUsize,
}

impl UploadController {
    pub fn new(notifier: Arc<StagedProgressNotifier>, policy: ValidationPolicy) -> Self {
        Self {
            notifier,
            policy,
            runs_started: AtomicUsize::new(0),
        }
    }

    /// Validate a dropped batch and start a staged run for the
    /// accepted files. Rejects are returned to the caller and never
    /// reach the notifier.
    pub async fn handle_drop(
        &self,
        files: &[FileCandidate],
        options: RunOptions,
    ) -> Result<DropOutcome, NotifierError> {
        let outcome = self.policy.validate(files);
        for rejected in &outcome.rejected {
            warn!(file = %rejected.file.name, reason = %rejected.reason, "rejected upload candidate");
        }

        if outcome.accepted.is_empty() {
            return Ok(DropOutcome {
                run: None,
                rejected: outcome.rejected,
            });
        }

        let steps = upload_steps(outcome.accepted.len());
        let handle = self.notifier.start(steps, options).await?;
        self.runs_started.fetch_add(1, Ordering::SeqCst);
        info!(
            run_id = %handle.id,
            accepted = outcome.accepted.len(),
            "started simulated upload"
        );

        Ok(DropOutcome {
            run: Some(handle),
            rejected: outcome.rejected,
        })
    }

    /// How many simulated runs this controller has started
    pub fn runs_started(&self) -> usize {
        self.runs_started.load(Ordering::SeqCst)
    }

    pub fn notifier(&self) -> &Arc<StagedProgressNotifier> {
        &self.notifier
    }
}

/// The canonical upload sequence shown for an accepted batch
pub fn upload_steps(file_count: usize) -> Vec<ProgressStep> {
    let plural = if file_count == 1 { "file" } else { "files" };
    vec![
        ProgressStep::new(format!("Uploading {} {}...", file_count, plural), 25),
        ProgressStep::new("Validating file contents...", 55),
        ProgressStep::new("Reconciling records...", 85),
        ProgressStep::with_kind("Upload complete", 100, StepKind::Success),
    ]
}

/// The dashboard refresh sequence behind the "Refresh" button
pub fn refresh_steps() -> Vec<ProgressStep> {
    vec![
        ProgressStep::new("Fetching latest activity...", 40),
        ProgressStep::new("Updating market overview...", 80),
        ProgressStep::with_kind("Dashboard up to date", 100, StepKind::Success),
    ]
}
