//! The `captioner batch` command: caption every image under a directory.

use captioner_core::batch::{BatchReport, JobResult};
use captioner_core::prompt::DEFAULT_PROMPT;
use captioner_core::{
    CaptionBatch, CaptionOutcome, Config, Dispatcher, FileDiscovery, HandlingMode, Quarantine,
};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{
    build_client, cancel_on_ctrl_c, create_progress_bar, print_summary, remember_endpoint,
    ApiArgs, ModeArg,
};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing images (searched recursively)
    pub dir: PathBuf,

    /// Prompt; `{dir}` is replaced by `<dir>/<image stem>.txt`
    #[arg(short, long, default_value = DEFAULT_PROMPT, hide_default_value = true)]
    pub prompt: String,

    /// If a caption file exists (defaults to the config file's handling_mode)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Concurrent API calls
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Jobs buffered ahead of the workers
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Print one line per image to stdout
    #[arg(long)]
    pub list: bool,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Counts by outcome kind.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CaptionTally {
    pub written: usize,
    pub skipped: usize,
    pub quarantined: usize,
    pub failed: usize,
}

impl CaptionTally {
    pub fn from_report(report: &BatchReport<JobResult<CaptionOutcome>>) -> Self {
        let mut tally = Self::default();
        for result in &report.results {
            match result.outcome {
                CaptionOutcome::Written { .. } => tally.written += 1,
                CaptionOutcome::Skipped => tally.skipped += 1,
                CaptionOutcome::Quarantined { .. } => tally.quarantined += 1,
                CaptionOutcome::QuarantineFailed { .. } | CaptionOutcome::Failed { .. } => {
                    tally.failed += 1
                }
            }
        }
        tally
    }
}

pub async fn execute(args: BatchArgs, config: &Config) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        anyhow::bail!(
            "Batch directory does not exist: {:?}\n\n  Hint: Check the path and try again.",
            args.dir
        );
    }

    let files = FileDiscovery::new(&config.batch).discover(&args.dir);
    if files.is_empty() {
        tracing::warn!("No supported images found under {:?}", args.dir);
        return Ok(());
    }
    tracing::info!("Found {} image(s) under {:?}", files.len(), args.dir);

    let (client, endpoint) = build_client(&args.api, config)?;
    let mode: HandlingMode = args
        .mode
        .map(Into::into)
        .unwrap_or(config.batch.handling_mode);
    let dispatcher = Dispatcher::new(
        args.workers.unwrap_or(config.batch.workers),
        args.queue_capacity.unwrap_or(config.batch.queue_capacity),
    );
    let batch = CaptionBatch::new(
        client,
        args.prompt.clone(),
        mode,
        Quarantine::for_batch(&args.dir, &config.batch.quarantine_dir),
        dispatcher,
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let progress = create_progress_bar(files.len() as u64);
    let start = Instant::now();
    let list = args.list;
    let report = batch
        .run(files, &cancel, |result| {
            progress.inc(1);
            if !result.outcome.is_success() {
                progress.println(format!("{:?}: {}", result.image, result.outcome));
            }
            if list {
                println!("{}\t{}", result.image.display(), result.outcome);
            }
        })
        .await;
    progress.finish_and_clear();

    remember_endpoint(&args.api, config, &endpoint);

    let tally = CaptionTally::from_report(&report);
    print_summary(
        "Summary",
        &[
            ("Captioned", tally.written),
            ("Skipped", tally.skipped),
            ("Quarantined", tally.quarantined),
            ("Failed", tally.failed),
        ],
        start.elapsed(),
    );
    if tally.quarantined > 0 {
        eprintln!("  Failed images moved to {:?}", batch.quarantine().dir());
    }
    if report.cancelled {
        eprintln!(
            "  Stopped early: {} of {} image(s) processed.",
            report.processed(),
            report.total
        );
    }
    Ok(())
}
