//! Recursive discovery of image files under a batch directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::BatchConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    formats: Vec<String>,
}

/// Information about a discovered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Path relative to the discovery root
    pub relative: PathBuf,
}

impl FileDiscovery {
    /// Create a discovery instance for the configured image extensions.
    pub fn new(config: &BatchConfig) -> Self {
        Self::with_formats(&config.supported_formats)
    }

    /// Create a discovery instance for an explicit extension list.
    pub fn with_formats<S: AsRef<str>>(formats: &[S]) -> Self {
        Self {
            formats: formats
                .iter()
                .map(|f| f.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, recursively finds all supported files.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                let relative = path.file_name().map(PathBuf::from).unwrap_or_default();
                return vec![DiscoveredFile {
                    path: path.to_path_buf(),
                    relative,
                }];
            }
            return vec![];
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file() && self.is_supported(entry.path()))
            .map(|entry| {
                let relative = entry
                    .path()
                    .strip_prefix(path)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| entry.path().to_path_buf());
                DiscoveredFile {
                    path: entry.into_path(),
                    relative,
                }
            })
            .collect();

        // Sort by path for deterministic submission order
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.formats.iter().any(|fmt| *fmt == ext_lower)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_discovery() -> FileDiscovery {
        FileDiscovery::new(&BatchConfig::default())
    }

    #[test]
    fn test_is_supported() {
        let discovery = default_discovery();

        for name in [
            "a.png", "a.jpg", "a.JPEG", "a.webp", "a.bmp", "a.gif", "a.tiff", "a.TIF",
        ] {
            assert!(discovery.is_supported(Path::new(name)), "{name}");
        }
        assert!(!discovery.is_supported(Path::new("a.txt")));
        assert!(!discovery.is_supported(Path::new("a.heic")));
        assert!(!discovery.is_supported(Path::new("png")));
    }

    #[test]
    fn test_discover_recursive_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/deeper");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        std::fs::write(dir.path().join("b.JPG"), b"x").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::write(nested.join("c.webp"), b"x").unwrap();
        std::fs::write(nested.join("notes.md"), b"x").unwrap();

        let files = default_discovery().discover(dir.path());
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.JPG"),
                PathBuf::from("nested/deeper/c.webp"),
            ]
        );
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("one.gif");
        std::fs::write(&image, b"x").unwrap();

        let files = default_discovery().discover(&image);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("one.gif"));
    }

    #[test]
    fn test_custom_formats_with_leading_dot() {
        let discovery = FileDiscovery::with_formats(&[".PNG"]);
        assert!(discovery.is_supported(Path::new("x.png")));
        assert!(!discovery.is_supported(Path::new("x.jpg")));
    }
}
