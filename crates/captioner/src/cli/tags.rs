//! The `captioner tags` command: edit, count, and visualize caption tags.

use captioner_core::tags::{self, edit, ChatTranslator, InsertPosition, TagEdit};
use captioner_core::Config;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::{caption_options, load_endpoint, ApiArgs};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PositionArg {
    Start,
    End,
    Random,
}

impl From<PositionArg> for InsertPosition {
    fn from(p: PositionArg) -> Self {
        match p {
            PositionArg::Start => InsertPosition::Start,
            PositionArg::End => InsertPosition::End,
            PositionArg::Random => InsertPosition::Random,
        }
    }
}

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Folder of caption files (searched recursively)
    pub folder: PathBuf,

    /// Number of most frequent tags to report
    #[arg(short = 'n', long, default_value = "100")]
    pub top_n: usize,

    /// Tags to remove, comma-separated
    #[arg(long)]
    pub remove: Option<String>,

    /// Replacements as `old:new`, comma-separated
    #[arg(long)]
    pub replace: Option<String>,

    /// Tag to add to every file that lacks it
    #[arg(long)]
    pub add: Option<String>,

    /// Where the added tag goes
    #[arg(long, value_enum, default_value = "start")]
    pub position: PositionArg,

    /// Translate reported tags to Chinese with gpt-3.5-turbo
    #[arg(long)]
    pub translate: bool,

    /// Write an SVG word cloud here
    #[arg(long)]
    pub cloud: Option<PathBuf>,

    /// Write the tag co-occurrence graph (Graphviz DOT) here
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Build the edit from the command line, rejecting malformed replacements.
pub fn edit_from_args(args: &TagsArgs) -> anyhow::Result<TagEdit> {
    Ok(TagEdit {
        remove: args
            .remove
            .as_deref()
            .map(edit::parse_removals)
            .unwrap_or_default(),
        replace: edit::parse_replacements(args.replace.as_deref().unwrap_or(""))?,
        add: args.add.clone(),
        position: args.position.into(),
    })
}

pub async fn execute(args: TagsArgs, config: &Config) -> anyhow::Result<()> {
    if !args.folder.is_dir() {
        anyhow::bail!("Folder does not exist: {:?}", args.folder);
    }

    let edit = edit_from_args(&args)?;
    let changed = tags::apply_to_folder(&args.folder, &edit, &mut rand::thread_rng())?;
    if !edit.is_empty() {
        eprintln!("Updated {changed} caption file(s).");
    }

    let counts = tags::count_tags(&args.folder, args.top_n)?;

    let translations = if args.translate && !counts.is_empty() {
        let endpoint = load_endpoint(&args.api, config)?;
        let translator = ChatTranslator::new(
            &endpoint.api_url,
            &endpoint.api_key,
            caption_options(&args.api, config).timeout,
        );
        let names: Vec<String> = counts.iter().map(|c| c.tag.clone()).collect();
        match tags::translate_tags(&translator, &names).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("{e}");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    if let Some(path) = &args.cloud {
        std::fs::write(path, tags::cloud::render_svg(&counts))?;
        tracing::info!("Word cloud written to {:?}", path);
    }
    if let Some(path) = &args.graph {
        let graph = tags::co_occurrence(&args.folder, args.top_n)?;
        std::fs::write(path, tags::to_dot(&graph))?;
        tracing::info!("Tag network written to {:?}", path);
    }

    let rows = tags::report_rows(&counts, &translations);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            if row.translation.is_empty() {
                println!("{:>6}  {}", row.count, row.tag);
            } else {
                println!("{:>6}  {}  ({})", row.count, row.tag, row.translation);
            }
        }
    }
    eprintln!("Tags processed successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        tags: TagsArgs,
    }

    #[test]
    fn test_edit_from_args() {
        let h = Harness::parse_from([
            "tags",
            "dir",
            "--remove",
            "blurry, lowres",
            "--replace",
            "kitty:cat",
            "--add",
            "photo",
            "--position",
            "end",
        ]);
        let edit = edit_from_args(&h.tags).unwrap();
        assert_eq!(edit.remove, vec!["blurry", "lowres"]);
        assert_eq!(edit.replace, vec![("kitty".to_string(), "cat".to_string())]);
        assert_eq!(edit.add.as_deref(), Some("photo"));
        assert_eq!(edit.position, InsertPosition::End);
    }

    #[test]
    fn test_bad_replacement_is_rejected() {
        let h = Harness::parse_from(["tags", "dir", "--replace", "nocolon"]);
        assert!(edit_from_args(&h.tags).is_err());
    }
}
