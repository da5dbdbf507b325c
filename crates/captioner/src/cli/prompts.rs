//! The `captioner prompts` command: the saved-prompt archive.

use captioner_core::{Config, PromptArchive};
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct PromptsArgs {
    #[command(subcommand)]
    pub command: PromptsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PromptsCommand {
    /// List saved prompts
    List,

    /// Save a prompt (duplicates are ignored)
    Save { prompt: String },

    /// Delete a saved prompt by its exact text
    Delete { prompt: String },

    /// Print one saved prompt by its index from `list`
    Show { index: usize },
}

pub async fn execute(args: PromptsArgs, config: &Config) -> anyhow::Result<()> {
    let archive = PromptArchive::new(config.prompts_path());

    match args.command {
        PromptsCommand::List => {
            let prompts = archive.list()?;
            if prompts.is_empty() {
                eprintln!("No saved prompts in {:?}", archive.path());
            }
            for (i, prompt) in prompts.iter().enumerate() {
                println!("{i:>3}  {prompt}");
            }
        }
        PromptsCommand::Save { prompt } => {
            if archive.save(&prompt)? {
                println!("Prompt saved.");
            } else {
                println!("Prompt already saved.");
            }
        }
        PromptsCommand::Delete { prompt } => {
            if archive.delete(&prompt)? {
                println!("Prompt deleted.");
            } else {
                anyhow::bail!("No saved prompt matches the given text.");
            }
        }
        PromptsCommand::Show { index } => {
            let prompts = archive.list()?;
            let Some(prompt) = prompts.get(index) else {
                anyhow::bail!("No saved prompt at index {index} ({} saved)", prompts.len());
            };
            println!("{prompt}");
        }
    }
    Ok(())
}
