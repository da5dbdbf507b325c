//! Watermark detection batch.
//!
//! Each image is sent with a fixed question; images the model reports as
//! watermarked are copied or moved into a target directory.

use super::dispatcher::{BatchReport, Dispatcher, JobResult};
use super::quarantine::move_file;
use crate::discovery::DiscoveredFile;
use crate::error::ApiError;
use crate::llm::CaptionClient;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Question sent for every image.
pub const WATERMARK_PROMPT: &str = "Is image have watermark";

/// Whether a model reply means "watermarked".
pub fn is_watermarked(reply: &str) -> bool {
    reply.contains("Yes,") && !reply.contains("'EOI'")
}

/// What to do with a watermarked image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkAction {
    #[default]
    Copy,
    Move,
}

impl std::fmt::Display for WatermarkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatermarkAction::Copy => write!(f, "copy"),
            WatermarkAction::Move => write!(f, "move"),
        }
    }
}

#[derive(Debug)]
pub enum WatermarkOutcome {
    Detected { destination: PathBuf },
    Clean,
    Error(ApiError),
    Failed { reason: String },
}

impl std::fmt::Display for WatermarkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatermarkOutcome::Detected { destination } => {
                write!(f, "Watermark detected, placed at {}", destination.display())
            }
            WatermarkOutcome::Clean => write!(f, "No watermark"),
            WatermarkOutcome::Error(e) => write!(f, "{e}"),
            WatermarkOutcome::Failed { reason } => write!(f, "An exception occurred: {reason}"),
        }
    }
}

struct WatermarkContext {
    client: CaptionClient,
    target_dir: PathBuf,
    action: WatermarkAction,
}

pub struct WatermarkBatch {
    context: Arc<WatermarkContext>,
    dispatcher: Dispatcher,
}

impl WatermarkBatch {
    pub fn new(
        client: CaptionClient,
        target_dir: impl Into<PathBuf>,
        action: WatermarkAction,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            context: Arc::new(WatermarkContext {
                client,
                target_dir: target_dir.into(),
                action,
            }),
            dispatcher,
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.context.target_dir
    }

    pub async fn run<R>(
        &self,
        files: Vec<DiscoveredFile>,
        cancel: &CancellationToken,
        on_result: R,
    ) -> BatchReport<JobResult<WatermarkOutcome>>
    where
        R: FnMut(&JobResult<WatermarkOutcome>),
    {
        let context = self.context.clone();
        let report = self
            .dispatcher
            .run(
                files,
                cancel,
                move |file| check_one(context.clone(), file),
                |file: &DiscoveredFile, message| JobResult {
                    image: file.path.clone(),
                    outcome: WatermarkOutcome::Failed { reason: message },
                },
                on_result,
            )
            .await;
        tracing::info!("Total checked images: {}", report.processed());
        report
    }
}

async fn check_one(context: Arc<WatermarkContext>, file: DiscoveredFile) -> JobResult<WatermarkOutcome> {
    let outcome = match context.client.caption(&file.path, WATERMARK_PROMPT).await {
        Ok(reply) if is_watermarked(&reply.text) => {
            let destination = context.target_dir.join(&file.relative);
            match place(&file.path, &destination, context.action) {
                Ok(()) => {
                    tracing::info!("Watermark detected in {:?}", file.path);
                    WatermarkOutcome::Detected { destination }
                }
                Err(e) => WatermarkOutcome::Failed {
                    reason: format!("failed to {} to {}: {e}", context.action, destination.display()),
                },
            }
        }
        Ok(_) => WatermarkOutcome::Clean,
        Err(e) => {
            tracing::warn!("Watermark check failed for {:?}: {e}", file.path);
            WatermarkOutcome::Error(e)
        }
    };
    JobResult {
        image: file.path,
        outcome,
    }
}

fn place(from: &Path, to: &Path, action: WatermarkAction) -> std::io::Result<()> {
    match action {
        WatermarkAction::Move => move_file(from, to),
        WatermarkAction::Copy => {
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(from, to).map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::FileDiscovery;
    use crate::llm::mock::{ok, MockProvider};
    use crate::llm::{CaptionOptions, RetryPolicy};

    #[test]
    fn test_reply_classification() {
        assert!(is_watermarked("Yes, there is a logo in the corner."));
        assert!(!is_watermarked("No, the image is clean."));
        assert!(!is_watermarked("Yes, 'EOI' marker"));
        assert!(!is_watermarked("yes, lowercase does not count"));
    }

    fn client(provider: MockProvider) -> CaptionClient {
        CaptionClient::new(Box::new(provider), RetryPolicy::none(), CaptionOptions::default())
    }

    fn images(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), [0xFF, 0xD8, 0xFF]).unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_copy_keeps_original() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        images(src.path(), &["marked.jpg"]);

        let provider = MockProvider::success("Yes, bottom right.");
        let prompts = provider.prompts_handle();
        let batch = WatermarkBatch::new(
            client(provider),
            dst.path().join("found"),
            WatermarkAction::Copy,
            Dispatcher::new(2, 4),
        );
        let files = FileDiscovery::with_formats(&["jpg"]).discover(src.path());
        let report = batch.run(files, &CancellationToken::new(), |_| {}).await;

        assert_eq!(report.processed(), 1);
        assert!(matches!(report.results[0].outcome, WatermarkOutcome::Detected { .. }));
        assert!(src.path().join("marked.jpg").exists());
        assert!(dst.path().join("found/marked.jpg").exists());
        assert_eq!(prompts.lock().unwrap().as_slice(), [WATERMARK_PROMPT]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_move_and_clean_images() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        images(src.path(), &["a.jpg", "b.jpg"]);

        // Single worker: the first call is watermarked, the second is clean
        let provider = MockProvider::new(|idx, _| {
            if idx == 0 {
                ok("Yes, visible text.")
            } else {
                ok("No.")
            }
        });
        let batch = WatermarkBatch::new(client(provider), dst.path(), WatermarkAction::Move, Dispatcher::new(1, 4));
        let files = FileDiscovery::with_formats(&["jpg"]).discover(src.path());
        let report = batch.run(files, &CancellationToken::new(), |_| {}).await;

        let detected = report
            .results
            .iter()
            .filter(|r| matches!(r.outcome, WatermarkOutcome::Detected { .. }))
            .count();
        let clean = report
            .results
            .iter()
            .filter(|r| matches!(r.outcome, WatermarkOutcome::Clean))
            .count();
        assert_eq!((detected, clean), (1, 1));
        assert_eq!(std::fs::read_dir(dst.path()).unwrap().count(), 1);
        assert_eq!(std::fs::read_dir(src.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_api_error_is_reported() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        images(src.path(), &["a.jpg"]);

        let batch = WatermarkBatch::new(
            client(MockProvider::failing(500)),
            dst.path(),
            WatermarkAction::Copy,
            Dispatcher::new(1, 1),
        );
        let files = FileDiscovery::with_formats(&["jpg"]).discover(src.path());
        let report = batch.run(files, &CancellationToken::new(), |_| {}).await;

        assert!(matches!(
            report.results[0].outcome,
            WatermarkOutcome::Error(ApiError::Http { status: 500, .. })
        ));
        assert!(src.path().join("a.jpg").exists());
    }
}
