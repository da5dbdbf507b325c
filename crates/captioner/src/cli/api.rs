//! The `captioner api` command: saved endpoint settings.

use captioner_core::{Config, DefaultModel, SettingsStore};
use clap::{Args, Subcommand, ValueEnum};

#[derive(Args, Debug)]
pub struct ApiCmdArgs {
    #[command(subcommand)]
    pub command: ApiCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DefaultKind {
    /// OpenAI-style endpoint (uses --key and --url)
    Gpt,
    /// Locally served CogVLM model (uses --variant)
    Local,
}

#[derive(Subcommand, Debug)]
pub enum ApiCommand {
    /// Show the saved model, URL, and masked key
    Show,

    /// Save an API key and URL
    Set {
        #[arg(long)]
        key: String,
        #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
        url: String,
    },

    /// Choose the default model
    Default {
        #[arg(value_enum)]
        kind: DefaultKind,
        #[arg(long, default_value = "")]
        key: String,
        #[arg(long, default_value = "https://api.openai.com/v1/chat/completions")]
        url: String,
        /// Local model variant, e.g. "vqa" or "chat"
        #[arg(long, default_value = "vqa")]
        variant: String,
    },
}

/// Show only the last four characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return "(none)".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(chars.len() - 4))
}

pub async fn execute(args: ApiCmdArgs, config: &Config) -> anyhow::Result<()> {
    let store = SettingsStore::new(config.settings_path());

    match args.command {
        ApiCommand::Show => {
            let settings = store.load()?;
            println!("file:  {}", store.path().display());
            println!("model: {}", settings.model);
            println!(
                "url:   {}",
                if settings.api_url.is_empty() {
                    config.api.default_url.as_str()
                } else {
                    settings.api_url.as_str()
                }
            );
            println!("key:   {}", mask_key(&settings.api_key));
        }
        ApiCommand::Set { key, url } => {
            if store.save_api_details(&key, &url)? {
                println!("API details saved to {}", store.path().display());
            } else {
                anyhow::bail!("An empty API key is not saved.");
            }
        }
        ApiCommand::Default {
            kind,
            key,
            url,
            variant,
        } => {
            let choice = match kind {
                DefaultKind::Gpt => DefaultModel::Gpt {
                    api_key: key,
                    api_url: url,
                },
                DefaultKind::Local => DefaultModel::Local { variant },
            };
            println!("{}", store.set_default(&choice)?);
        }
    }
    Ok(())
}
