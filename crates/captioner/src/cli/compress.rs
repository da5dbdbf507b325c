//! The `captioner compress` command: shrink images before captioning.

use captioner_core::preprocess::{compress_folder, CompressOptions};
use captioner_core::{Config, FileDiscovery};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Folder of images, compressed in place
    pub folder: PathBuf,

    /// Pixel budget per image
    #[arg(long, default_value_t = 1024 * 1024)]
    pub max_pixels: u64,

    /// Both sides are rounded down to a multiple of this
    #[arg(long, default_value_t = 32)]
    pub multiple: u32,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,
}

pub async fn execute(args: CompressArgs, config: &Config) -> anyhow::Result<()> {
    if !args.folder.is_dir() {
        anyhow::bail!("Folder does not exist: {:?}", args.folder);
    }
    let options = CompressOptions {
        max_pixels: args.max_pixels,
        multiple: args.multiple,
        quality: args.quality,
    };
    let discovery = FileDiscovery::new(&config.batch);
    let folder = args.folder.clone();
    let report = tokio::task::spawn_blocking(move || compress_folder(&folder, &discovery, &options)).await?;

    for (path, w, h) in &report.compressed {
        println!("{}\t{w}x{h}", path.display());
    }
    for (path, reason) in &report.failures {
        eprintln!("Failed: {} - {reason}", path.display());
    }
    eprintln!(
        "Compressed {} image(s), {} failure(s).",
        report.compressed.len(),
        report.failures.len()
    );
    Ok(())
}
