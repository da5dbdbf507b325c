//! Batch captioning: one API call per image, caption files written in place.

use super::dispatcher::{BatchReport, Dispatcher, JobResult};
use super::quarantine::Quarantine;
use crate::caption::{caption_path_for, write_caption, HandlingMode};
use crate::discovery::DiscoveredFile;
use crate::error::ApiError;
use crate::llm::CaptionClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What happened to one image.
#[derive(Debug)]
pub enum CaptionOutcome {
    /// Caption written (or merged) at this path
    Written { caption_path: PathBuf },
    /// Caption file already existed in skip mode; no API call was made
    Skipped,
    /// The API call failed and the image was moved aside
    Quarantined { error: ApiError, moved_to: PathBuf },
    /// The API call failed and moving the image aside failed too
    QuarantineFailed { error: ApiError, reason: String },
    /// The caption could not be written, or the job panicked
    Failed { reason: String },
}

impl CaptionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaptionOutcome::Written { .. } | CaptionOutcome::Skipped)
    }
}

impl std::fmt::Display for CaptionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionOutcome::Written { caption_path } => write!(f, "{}", caption_path.display()),
            CaptionOutcome::Skipped => write!(f, "Skipped because caption file already exists."),
            CaptionOutcome::Quarantined { error, moved_to } => write!(
                f,
                "{error}; image and caption moved to {}",
                moved_to.display()
            ),
            CaptionOutcome::QuarantineFailed { error, reason } => write!(
                f,
                "{error}; an unexpected error occurred while moving the image: {reason}"
            ),
            CaptionOutcome::Failed { reason } => write!(f, "An exception occurred: {reason}"),
        }
    }
}

struct CaptionJobContext {
    client: CaptionClient,
    prompt: String,
    mode: HandlingMode,
    quarantine: Quarantine,
}

/// Captions every discovered image through a [`Dispatcher`].
pub struct CaptionBatch {
    context: Arc<CaptionJobContext>,
    dispatcher: Dispatcher,
}

impl CaptionBatch {
    pub fn new(
        client: CaptionClient,
        prompt: impl Into<String>,
        mode: HandlingMode,
        quarantine: Quarantine,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            context: Arc::new(CaptionJobContext {
                client,
                prompt: prompt.into(),
                mode,
                quarantine,
            }),
            dispatcher,
        }
    }

    pub fn quarantine(&self) -> &Quarantine {
        &self.context.quarantine
    }

    /// Caption all `files`, calling `on_result` as each one completes.
    pub async fn run<R>(
        &self,
        files: Vec<DiscoveredFile>,
        cancel: &CancellationToken,
        on_result: R,
    ) -> BatchReport<JobResult<CaptionOutcome>>
    where
        R: FnMut(&JobResult<CaptionOutcome>),
    {
        tracing::info!(
            "Captioning {} image(s) with {} worker(s), mode {}",
            files.len(),
            self.dispatcher.workers(),
            self.context.mode
        );
        let context = self.context.clone();
        let report = self
            .dispatcher
            .run(
                files,
                cancel,
                move |file| caption_one(context.clone(), file),
                |file: &DiscoveredFile, message| {
                    tracing::error!("An exception occurred while processing {:?}: {message}", file.path);
                    JobResult {
                        image: file.path.clone(),
                        outcome: CaptionOutcome::Failed { reason: message },
                    }
                },
                on_result,
            )
            .await;
        tracing::info!(
            "Processing complete. Total images processed: {}",
            report.processed()
        );
        report
    }
}

async fn caption_one(context: Arc<CaptionJobContext>, file: DiscoveredFile) -> JobResult<CaptionOutcome> {
    let caption_path = caption_path_for(&file.path);

    if context.mode == HandlingMode::Skip && caption_path.exists() {
        tracing::debug!("Skipping {:?}: caption exists", file.path);
        return JobResult {
            image: file.path,
            outcome: CaptionOutcome::Skipped,
        };
    }

    let outcome = match context.client.caption(&file.path, &context.prompt).await {
        Ok(caption) => match write_caption(&caption_path, &caption.text, context.mode) {
            Ok(_) => {
                tracing::debug!("Captioned {:?} in {} attempt(s)", file.path, caption.attempts);
                CaptionOutcome::Written { caption_path }
            }
            Err(e) => CaptionOutcome::Failed {
                reason: format!("failed to write {}: {e}", caption_path.display()),
            },
        },
        Err(error) => {
            tracing::warn!("Caption failed for {:?}: {error}", file.path);
            match context.quarantine.isolate(&file.path, &file.relative) {
                Ok(moved_to) => CaptionOutcome::Quarantined { error, moved_to },
                Err(e) => CaptionOutcome::QuarantineFailed {
                    error,
                    reason: e.to_string(),
                },
            }
        }
    };

    JobResult {
        image: file.path,
        outcome,
    }
}
