//! Bulk tag edits: remove, replace, insert.

use super::{caption_files, join_tags, read_caption, split_tags};
use crate::error::{Result, TagError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a new tag goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    #[default]
    Start,
    End,
    Random,
}

/// Edits applied to every caption file in a folder.
#[derive(Debug, Clone, Default)]
pub struct TagEdit {
    pub remove: Vec<String>,
    /// `(old, new)` pairs
    pub replace: Vec<(String, String)>,
    /// Added when not already present
    pub add: Option<String>,
    pub position: InsertPosition,
}

impl TagEdit {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty()
            && self.replace.is_empty()
            && self.add.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Apply to one tag list.
    pub fn apply<R: Rng>(&self, tags: Vec<String>, rng: &mut R) -> Vec<String> {
        let mut out: Vec<String> = tags
            .into_iter()
            .filter(|t| !self.remove.iter().any(|r| r == t))
            .map(|t| {
                self.replace
                    .iter()
                    .find(|(old, _)| *old == t)
                    .map(|(_, new)| new.clone())
                    .unwrap_or(t)
            })
            .collect();

        if let Some(new_tag) = self.add.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !out.iter().any(|t| t == new_tag) {
                let index = match self.position {
                    InsertPosition::Start => 0,
                    InsertPosition::End => out.len(),
                    InsertPosition::Random => rng.gen_range(0..=out.len()),
                };
                out.insert(index, new_tag.to_string());
            }
        }
        out
    }
}

/// Parse `old:new, old2:new2`.
pub fn parse_replacements(input: &str) -> std::result::Result<Vec<(String, String)>, TagError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(|pair| {
            let mut parts = pair.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(old), Some(new), None) => Ok((old.trim().to_string(), new.trim().to_string())),
                _ => Err(TagError::InvalidReplacement(pair.trim().to_string())),
            }
        })
        .collect()
}

/// Parse a removal list separated by commas or line breaks.
pub fn parse_removals(input: &str) -> Vec<String> {
    split_tags(input)
}

/// Rewrite every caption file under `folder`. Returns the number of files changed.
pub fn apply_to_folder<R: Rng>(folder: &Path, edit: &TagEdit, rng: &mut R) -> Result<usize> {
    if edit.is_empty() {
        return Ok(0);
    }
    let mut changed = 0;
    for file in caption_files(folder) {
        let Some(original) = read_caption(&file) else {
            continue;
        };
        let tags = split_tags(&original);
        let updated = join_tags(&edit.apply(tags, rng));
        if updated != original {
            std::fs::write(&file, updated)?;
            changed += 1;
        }
    }
    tracing::info!("Updated tags in {changed} file(s) under {:?}", folder);
    Ok(changed)
}
