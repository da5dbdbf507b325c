//! Find caption files that look like failed captions.

use super::{caption_files, read_caption};
use crate::error::Result;
use crate::discovery::FileDiscovery;
use std::path::{Path, PathBuf};

/// Keywords used when none are given.
pub const DEFAULT_KEYWORDS: &str = "sorry,error";

/// A caption file that matched, and its image when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenedFile {
    pub caption: PathBuf,
    pub image: Option<PathBuf>,
    pub keyword: String,
}

/// Parse a comma-separated keyword list, falling back to [`DEFAULT_KEYWORDS`].
pub fn parse_keywords(input: Option<&str>) -> Vec<String> {
    let raw = input.filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_KEYWORDS);
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// List caption files under `folder` whose text contains any keyword
/// (case-insensitive).
pub fn screen_failed(folder: &Path, keywords: &[String], images: &FileDiscovery) -> Result<Vec<ScreenedFile>> {
    let mut hits = Vec::new();
    for caption in caption_files(folder) {
        let Some(text) = read_caption(&caption).map(|t| t.to_lowercase()) else {
            continue;
        };
        let Some(keyword) = keywords.iter().find(|k| text.contains(k.as_str())) else {
            continue;
        };
        let image = sibling_image(&caption, images);
        hits.push(ScreenedFile {
            caption,
            image,
            keyword: keyword.clone(),
        });
    }
    tracing::info!("Screened {:?}: {} suspicious caption(s)", folder, hits.len());
    Ok(hits)
}

fn sibling_image(caption: &Path, images: &FileDiscovery) -> Option<PathBuf> {
    let stem = caption.file_stem()?;
    let dir = caption.parent()?;
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.file_stem() == Some(stem) && images.is_supported(p))
        .min()
}
