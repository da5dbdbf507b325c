//! The `captioner watermark` command: find watermarked images.

use captioner_core::{
    Config, Dispatcher, FileDiscovery, WatermarkAction, WatermarkBatch, WatermarkOutcome,
};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{
    build_client, cancel_on_ctrl_c, create_progress_bar, print_summary, remember_endpoint, ApiArgs,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ActionArg {
    /// Copy flagged images, leaving the originals
    Copy,
    /// Move flagged images out of the source directory
    Move,
}

impl From<ActionArg> for WatermarkAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Copy => WatermarkAction::Copy,
            ActionArg::Move => WatermarkAction::Move,
        }
    }
}

#[derive(Args, Debug)]
pub struct WatermarkArgs {
    /// Directory to check
    pub dir: PathBuf,

    /// Where flagged images go (created if missing)
    #[arg(short, long)]
    pub target: PathBuf,

    #[arg(short, long, value_enum, default_value = "copy")]
    pub action: ActionArg,

    /// Concurrent API calls
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub api: ApiArgs,
}

pub async fn execute(args: WatermarkArgs, config: &Config) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        anyhow::bail!("Directory does not exist: {:?}", args.dir);
    }
    let files = FileDiscovery::new(&config.batch).discover(&args.dir);
    if files.is_empty() {
        tracing::warn!("No supported images found under {:?}", args.dir);
        return Ok(());
    }

    let (client, endpoint) = build_client(&args.api, config)?;
    let batch = WatermarkBatch::new(
        client,
        &args.target,
        args.action.into(),
        Dispatcher::new(
            args.workers.unwrap_or(config.batch.workers),
            config.batch.queue_capacity,
        ),
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let progress = create_progress_bar(files.len() as u64);
    let start = Instant::now();
    let (mut detected, mut clean, mut errors) = (0usize, 0usize, 0usize);
    let report = batch
        .run(files, &cancel, |result| {
            progress.inc(1);
            match &result.outcome {
                WatermarkOutcome::Detected { .. } => detected += 1,
                WatermarkOutcome::Clean => clean += 1,
                WatermarkOutcome::Error(_) | WatermarkOutcome::Failed { .. } => {
                    errors += 1;
                    progress.println(format!("{:?}: {}", result.image, result.outcome));
                }
            }
        })
        .await;
    progress.finish_and_clear();
    remember_endpoint(&args.api, config, &endpoint);

    println!("Total checked images: {}", report.processed());
    print_summary(
        "Watermark check",
        &[("Watermarked", detected), ("Clean", clean), ("Errors", errors)],
        start.elapsed(),
    );
    if detected > 0 {
        eprintln!("  Watermarked images placed in {:?}", batch.target_dir());
    }
    Ok(())
}
