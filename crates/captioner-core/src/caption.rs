//! Caption files: one UTF-8 `.txt` file next to each image.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Policy for a caption file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlingMode {
    /// Replace the existing content
    #[default]
    Overwrite,
    /// Leave the existing file alone and do not call the API
    Skip,
    /// New lines first, then existing lines not already present
    Prepend,
    /// Existing lines first, then new lines not already present
    Append,
}

impl std::fmt::Display for HandlingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlingMode::Overwrite => write!(f, "overwrite"),
            HandlingMode::Skip => write!(f, "skip"),
            HandlingMode::Prepend => write!(f, "prepend"),
            HandlingMode::Append => write!(f, "append"),
        }
    }
}

/// Caption path for an image: same path with the extension replaced by `.txt`.
pub fn caption_path_for(image: &Path) -> PathBuf {
    image.with_extension("txt")
}

/// Write `content` to the caption file at `path` according to `mode`.
///
/// Returns `false` when nothing was written (skip mode with an existing file).
pub fn write_caption(path: &Path, content: &str, mode: HandlingMode) -> std::io::Result<bool> {
    let exists = path.exists();
    let text = match mode {
        HandlingMode::Skip if exists => {
            tracing::debug!("Skip writing, as the file {:?} already exists", path);
            return Ok(false);
        }
        HandlingMode::Prepend if exists => merge_unique(content, &std::fs::read_to_string(path)?),
        HandlingMode::Append if exists => merge_unique(&std::fs::read_to_string(path)?, content),
        _ => content.to_string(),
    };
    std::fs::write(path, text)?;
    Ok(true)
}

/// Union of the lines of `first` and `second`, first occurrence wins.
///
/// Lines are compared after trimming; blank lines are dropped.
pub fn merge_unique(first: &str, second: &str) -> String {
    let mut seen = HashSet::new();
    first
        .lines()
        .chain(second.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty() && seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_path_replaces_extension() {
        assert_eq!(
            caption_path_for(Path::new("/data/set/cat.PNG")),
            PathBuf::from("/data/set/cat.txt")
        );
        assert_eq!(
            caption_path_for(Path::new("dog.tar.jpg")),
            PathBuf::from("dog.tar.txt")
        );
    }

    #[test]
    fn test_merge_unique_keeps_order_bias() {
        assert_eq!(merge_unique("a\nb", "b\nc"), "a\nb\nc");
        assert_eq!(merge_unique("b\nc", "a\nb"), "b\nc\na");
    }

    #[test]
    fn test_merge_unique_drops_blank_and_duplicate_lines() {
        assert_eq!(merge_unique("a\n\na\n", " a \nb"), "a\nb");
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");
        std::fs::write(&path, "old caption").unwrap();

        assert!(write_caption(&path, "new caption", HandlingMode::Overwrite).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new caption");
    }

    #[test]
    fn test_skip_leaves_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");
        std::fs::write(&path, "keep me").unwrap();

        assert!(!write_caption(&path, "ignored", HandlingMode::Skip).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_skip_writes_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");

        assert!(write_caption(&path, "fresh", HandlingMode::Skip).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[test]
    fn test_append_and_prepend_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");

        std::fs::write(&path, "old one\nshared").unwrap();
        write_caption(&path, "shared\nnew one", HandlingMode::Append).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "old one\nshared\nnew one"
        );

        std::fs::write(&path, "old one\nshared").unwrap();
        write_caption(&path, "shared\nnew one", HandlingMode::Prepend).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "shared\nnew one\nold one"
        );
    }
}
