//! Captioner CLI - batch image captioning through vision-language APIs.
//!
//! Sends images to an OpenAI-compatible or DashScope endpoint and writes the
//! replies next to the images as `.txt` caption files. Also manages tags,
//! saved prompts, and API settings.
//!
//! # Usage
//!
//! ```bash
//! # Caption a single image
//! captioner caption photo.jpg
//!
//! # Caption a directory, keeping existing captions
//! captioner batch ./dataset --mode skip --workers 8
//!
//! # Count and clean tags
//! captioner tags ./dataset --remove "blurry" --replace "kitty:cat" --top-n 50
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Captioner - batch image captioning through vision-language APIs.
#[derive(Parser, Debug)]
#[command(name = "captioner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption a single image and print the reply
    Caption(cli::caption::CaptionArgs),

    /// Caption every image under a directory
    Batch(cli::batch::BatchArgs),

    /// Detect watermarked images and copy or move them aside
    Watermark(cli::watermark::WatermarkArgs),

    /// Edit, count, translate, and visualize caption tags
    Tags(cli::tags::TagsArgs),

    /// Manage saved prompts
    Prompts(cli::prompts::PromptsArgs),

    /// Manage saved API settings
    Api(cli::api::ApiCmdArgs),

    /// List captions that look like failed captioning
    Screen(cli::screen::ScreenArgs),

    /// Shrink images to a pixel budget and re-encode as JPEG
    Compress(cli::compress::CompressArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match captioner_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `captioner config path`."
            );
            captioner_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Captioner v{}", captioner_core::VERSION);

    match cli.command {
        Commands::Caption(args) => cli::caption::execute(args, &config).await,
        Commands::Batch(args) => cli::batch::execute(args, &config).await,
        Commands::Watermark(args) => cli::watermark::execute(args, &config).await,
        Commands::Tags(args) => cli::tags::execute(args, &config).await,
        Commands::Prompts(args) => cli::prompts::execute(args, &config).await,
        Commands::Api(args) => cli::api::execute(args, &config).await,
        Commands::Screen(args) => cli::screen::execute(args, &config).await,
        Commands::Compress(args) => cli::compress::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
