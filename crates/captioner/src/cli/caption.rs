//! The `captioner caption` command: caption one image and print the reply.

use clap::Args;
use captioner_core::caption::{caption_path_for, write_caption};
use captioner_core::prompt::DEFAULT_PROMPT;
use captioner_core::Config;
use std::path::PathBuf;

use super::{build_client, remember_endpoint, ApiArgs, ModeArg};

#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image to caption
    pub image: PathBuf,

    /// Prompt; `{dir}` is replaced by `<dir>/<image stem>.txt`
    #[arg(short, long, default_value = DEFAULT_PROMPT, hide_default_value = true)]
    pub prompt: String,

    /// Also write the caption next to the image using this mode
    #[arg(long, value_enum)]
    pub write: Option<ModeArg>,

    #[command(flatten)]
    pub api: ApiArgs,
}

pub async fn execute(args: CaptionArgs, config: &Config) -> anyhow::Result<()> {
    if !args.image.is_file() {
        anyhow::bail!("Image not found: {:?}", args.image);
    }
    let (client, endpoint) = build_client(&args.api, config)?;

    let caption = client.caption(&args.image, &args.prompt).await?;
    remember_endpoint(&args.api, config, &endpoint);
    tracing::debug!(
        "Caption from {} in {} ms ({} attempt(s))",
        caption.model,
        caption.latency_ms,
        caption.attempts
    );

    if let Some(mode) = args.write {
        let path = caption_path_for(&args.image);
        if write_caption(&path, &caption.text, mode.into())? {
            tracing::info!("Caption written to {:?}", path);
        } else {
            tracing::info!("Skipped because caption file already exists.");
        }
    }

    println!("{}", caption.text);
    Ok(())
}
