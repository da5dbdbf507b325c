//! Quarantine for images whose API call failed.

use crate::caption::caption_path_for;
use std::io;
use std::path::{Path, PathBuf};

/// Directory next to the batch directory that collects failed images.
#[derive(Debug, Clone)]
pub struct Quarantine {
    dir: PathBuf,
}

impl Quarantine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Quarantine placed beside `batch_root` (in its parent directory).
    ///
    /// The root is canonicalized first so `.` and relative roots resolve to
    /// their real parent rather than to a directory inside the batch.
    pub fn for_batch(batch_root: &Path, dir_name: &str) -> Self {
        let root = batch_root
            .canonicalize()
            .unwrap_or_else(|_| batch_root.to_path_buf());
        let parent = root.parent().unwrap_or(&root);
        Self::new(parent.join(dir_name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move `image` and, if present, its caption file into the quarantine.
    ///
    /// `relative` is the image path relative to the batch root and is kept
    /// under the quarantine directory. Returns the image's new path.
    pub fn isolate(&self, image: &Path, relative: &Path) -> io::Result<PathBuf> {
        let target = self.dir.join(relative);
        move_file(image, &target)?;

        let caption = caption_path_for(image);
        if caption.exists() {
            move_file(&caption, &caption_path_for(&target))?;
        }
        tracing::info!("Quarantined {:?} -> {:?}", image, target);
        Ok(target)
    }
}

/// Move a file, creating the destination's parent directory.
///
/// Falls back to copy-and-remove when a rename crosses filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !from.exists() {
                return Err(rename_err);
            }
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}
