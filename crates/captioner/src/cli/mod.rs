//! CLI command implementations and the pieces they share.

pub mod api;
pub mod batch;
pub mod caption;
pub mod compress;
pub mod config;
pub mod prompts;
pub mod screen;
pub mod tags;
pub mod watermark;

use captioner_core::llm::provider::resolve_env_var;
use captioner_core::settings::Settings;
use captioner_core::{
    CaptionClient, CaptionOptions, Config, HandlingMode, Quality, RetryPolicy, SettingsStore,
};
use clap::{Args, ValueEnum};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Endpoint options shared by every command that calls the API.
#[derive(Args, Debug, Clone, Default)]
pub struct ApiArgs {
    /// API key (falls back to the saved settings)
    #[arg(long, env = "CAPTIONER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Endpoint URL (falls back to the saved settings, then the config file)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Model name sent to OpenAI-style endpoints
    #[arg(long)]
    pub model: Option<String>,

    /// Image detail hint
    #[arg(long, value_enum)]
    pub quality: Option<QualityArg>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum tokens per reply
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Do not remember the key and URL in the settings file
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum QualityArg {
    /// Let the API decide
    Auto,
    /// High detail, more expensive
    High,
    /// Low detail, cheaper
    Low,
}

impl From<QualityArg> for Quality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Auto => Quality::Auto,
            QualityArg::High => Quality::High,
            QualityArg::Low => Quality::Low,
        }
    }
}

/// What to do when a caption file already exists.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Overwrite,
    Prepend,
    Append,
    Skip,
}

impl From<ModeArg> for HandlingMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Overwrite => HandlingMode::Overwrite,
            ModeArg::Prepend => HandlingMode::Prepend,
            ModeArg::Append => HandlingMode::Append,
            ModeArg::Skip => HandlingMode::Skip,
        }
    }
}

/// A resolved endpoint: URL, key, and model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

fn is_local_url(url: &str) -> bool {
    url.contains("://127.0.0.1") || url.contains("://localhost")
}

/// Resolve the endpoint from CLI flags, saved settings, and config, in that order.
pub fn resolve_endpoint(args: &ApiArgs, config: &Config, saved: &Settings) -> anyhow::Result<Endpoint> {
    let api_url = args
        .api_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| Some(saved.api_url.clone()).filter(|u| !u.is_empty()))
        .unwrap_or_else(|| config.api.default_url.clone());

    let api_key = args
        .api_key
        .as_deref()
        .and_then(resolve_env_var)
        .or_else(|| resolve_env_var(&saved.api_key))
        .unwrap_or_default();

    if api_key.is_empty() && !is_local_url(&api_url) {
        anyhow::bail!(
            "No API key for {api_url}.\n\n  Hint: pass --api-key, set CAPTIONER_API_KEY, \
             or save one with `captioner api set --key <KEY>`."
        );
    }

    let model = args
        .model
        .clone()
        .or_else(|| Some(saved.model.clone()).filter(|m| m.starts_with("Cog-")))
        .unwrap_or_else(|| config.api.model.clone());

    Ok(Endpoint {
        api_url,
        api_key,
        model,
    })
}

/// Per-call options from config, overridden by CLI flags.
pub fn caption_options(args: &ApiArgs, config: &Config) -> CaptionOptions {
    let mut options = CaptionOptions::from_config(config);
    if let Some(q) = args.quality {
        options.quality = q.into();
    }
    if let Some(secs) = args.timeout {
        options.timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(tokens) = args.max_tokens {
        options.max_tokens = tokens;
    }
    options
}

/// Resolve the endpoint against the saved settings file.
pub fn load_endpoint(args: &ApiArgs, config: &Config) -> anyhow::Result<Endpoint> {
    let store = SettingsStore::new(config.settings_path());
    let saved = store.load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable settings file {:?}: {e}", store.path());
        Settings::default()
    });
    resolve_endpoint(args, config, &saved)
}

/// Resolve the endpoint and build a caption client for it.
pub fn build_client(args: &ApiArgs, config: &Config) -> anyhow::Result<(CaptionClient, Endpoint)> {
    let endpoint = load_endpoint(args, config)?;
    let client = CaptionClient::for_endpoint(
        &endpoint.api_url,
        &endpoint.api_key,
        &endpoint.model,
        RetryPolicy::from_config(&config.retry),
        caption_options(args, config),
    );
    tracing::debug!("Endpoint {} via {}", endpoint.api_url, client.provider_name());
    Ok((client, endpoint))
}

/// Remember a key/URL passed on the command line.
pub fn remember_endpoint(args: &ApiArgs, config: &Config, endpoint: &Endpoint) {
    if args.no_save || args.api_key.is_none() {
        return;
    }
    let store = SettingsStore::new(config.settings_path());
    match store.save_api_details(&endpoint.api_key, &endpoint.api_url) {
        Ok(true) => tracing::debug!("Saved API details to {:?}", store.path()),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to save API details: {e}"),
    }
}

/// Cancel `token` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Stop requested, finishing images already in flight...");
            token.cancel();
        }
    });
}

/// Progress bar for batch runs.
pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a summary box to stderr. Zero-valued rows after the first are hidden.
pub fn print_summary(title: &str, rows: &[(&str, usize)], elapsed: Duration) {
    let processed: usize = rows.iter().map(|(_, n)| n).sum();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        processed as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("  {:^34}", title);
    eprintln!("  ====================================");
    for (i, (label, count)) in rows.iter().enumerate() {
        if i > 0 && *count == 0 {
            continue;
        }
        let line = format!("    {:<14}{:>8}", format!("{label}:"), count);
        if i == 0 {
            eprintln!("{}", console::style(line).green());
        } else {
            eprintln!("{}", console::style(line).yellow());
        }
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", processed);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
