//! The `captioner screen` command: list captions that look like failures.

use captioner_core::batch::Quarantine;
use captioner_core::tags::screening::{parse_keywords, screen_failed};
use captioner_core::{Config, FileDiscovery};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Folder of caption files
    pub folder: PathBuf,

    /// Comma-separated keywords (default: sorry,error)
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Move matching images and captions into the quarantine directory
    #[arg(long)]
    pub quarantine: bool,
}

pub async fn execute(args: ScreenArgs, config: &Config) -> anyhow::Result<()> {
    if !args.folder.is_dir() {
        anyhow::bail!("Folder does not exist: {:?}", args.folder);
    }
    let keywords = parse_keywords(args.keywords.as_deref());
    let discovery = FileDiscovery::new(&config.batch);
    let hits = screen_failed(&args.folder, &keywords, &discovery)?;

    let quarantine = Quarantine::for_batch(&args.folder, &config.batch.quarantine_dir);
    for hit in &hits {
        match (&hit.image, args.quarantine) {
            (Some(image), true) => {
                let relative = image.strip_prefix(&args.folder).unwrap_or(image.as_path());
                match quarantine.isolate(image, relative) {
                    Ok(moved) => println!(
                        "{}\t[{}]\tmoved to {}",
                        hit.caption.display(),
                        hit.keyword,
                        moved.display()
                    ),
                    Err(e) => println!(
                        "{}\t[{}]\tmove failed: {e}",
                        hit.caption.display(),
                        hit.keyword
                    ),
                }
            }
            (Some(image), false) => {
                println!("{}\t[{}]\t{}", hit.caption.display(), hit.keyword, image.display())
            }
            (None, _) => println!("{}\t[{}]", hit.caption.display(), hit.keyword),
        }
    }
    eprintln!("{} suspicious caption(s) found.", hits.len());
    Ok(())
}
