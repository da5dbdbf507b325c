//! Tag frequency counting.

use super::{caption_files, read_caption, split_tags};
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Count tags across every caption file under `folder`.
///
/// Sorted by count descending, then tag name; at most `top_n` entries.
pub fn count_tags(folder: &Path, top_n: usize) -> Result<Vec<TagCount>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in caption_files(folder) {
        let Some(text) = read_caption(&file) else {
            continue;
        };
        for tag in split_tags(&text) {
            *counts.entry(tag).or_default() += 1;
        }
    }

    let mut ranked: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    ranked.truncate(top_n);
    Ok(ranked)
}
