//! Tag utilities over caption folders.
//!
//! Caption files are read as tag lists separated by commas or line breaks
//! (merged captions put each reply on its own line). These helpers count,
//! edit, visualize, translate, and screen them.

pub mod cloud;
pub mod count;
pub mod edit;
pub mod graph;
pub mod screening;
pub mod translate;

pub use count::{count_tags, TagCount};
pub use edit::{apply_to_folder, parse_replacements, InsertPosition, TagEdit};
pub use graph::{co_occurrence, to_dot, TagGraph};
pub use screening::{screen_failed, ScreenedFile, DEFAULT_KEYWORDS};
pub use translate::{translate_tags, ChatTranslator, Translator};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Longest tag shown in reports before truncation.
pub const MAX_TAG_DISPLAY: usize = 30;

/// Split caption text into trimmed, non-empty tags.
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// Every `.txt` file under `folder`, sorted.
pub fn caption_files(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::warn!("Error accessing path: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort();
    files
}

/// Read a caption file, or warn and return `None` if it is unreadable or not UTF-8.
pub fn read_caption(file: &Path) -> Option<String> {
    match std::fs::read_to_string(file) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("Skipping unreadable caption file {:?}: {e}", file);
            None
        }
    }
}

/// Shorten a tag for display: first 30 characters plus `...`.
pub fn truncate_tag(tag: &str) -> String {
    if tag.chars().count() > MAX_TAG_DISPLAY {
        let head: String = tag.chars().take(MAX_TAG_DISPLAY).collect();
        format!("{head}...")
    } else {
        tag.to_string()
    }
}

/// One row of a tag report.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TagReportRow {
    pub tag: String,
    pub count: usize,
    pub translation: String,
}

/// Build report rows, truncating tags and padding missing translations.
pub fn report_rows(counts: &[TagCount], translations: &[String]) -> Vec<TagReportRow> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| TagReportRow {
            tag: truncate_tag(&c.tag),
            count: c.count,
            translation: translations.get(i).cloned().unwrap_or_default(),
        })
        .collect()
}
