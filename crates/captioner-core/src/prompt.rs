//! Prompt handling: `{directory}` expansion and the saved-prompt archive.

use crate::error::{ApiError, Result};
use std::path::{Path, PathBuf};

/// Tagging prompt used when none is given.
pub const DEFAULT_PROMPT: &str = "As an AI image tagging expert, please provide precise tags for these images to enhance CLIP model's understanding of the content. Employ succinct keywords or phrases, steering clear of elaborate sentences and extraneous conjunctions. Prioritize the tags by relevance. Your tags should capture key elements such as the main subject, setting, artistic style, composition, image quality, color tone, filter, and camera specifications, and any other tags crucial for the image. When tagging photos of people, include specific details like gender, nationality, attire, actions, pose, expressions, accessories, makeup, composition type, age, etc. For other image categories, apply appropriate and common descriptive tags as well. Recognize and tag any celebrities, well-known landmark or IPs if clearly featured in the image. Your tags should be accurate, non-duplicative, and within a 20-75 word count range. These tags will use for image re-creation, so the closer the resemblance to the original image, the better the tag quality. Tags should be comma-separated.";

/// Expand a `{directory}` token in `prompt` for a given image.
///
/// The text between the first `{` and the next `}` names a directory; the
/// file `<directory>/<image stem>.txt` is read and its content replaces every
/// occurrence of the token. Prompts without a complete token are returned
/// unchanged.
pub fn expand(prompt: &str, image_path: &Path) -> std::result::Result<String, ApiError> {
    let Some(open) = prompt.find('{') else {
        return Ok(prompt.to_string());
    };
    let Some(close) = prompt[open..].find('}').map(|i| open + i) else {
        return Ok(prompt.to_string());
    };

    let directory = &prompt[open + 1..close];
    let stem = image_path.file_stem().unwrap_or_default();
    let mut file_name = stem.to_os_string();
    file_name.push(".txt");
    let full_path = Path::new(directory).join(file_name);

    let content = std::fs::read_to_string(&full_path).map_err(|source| ApiError::FileRead {
        path: full_path.clone(),
        source,
    })?;

    tracing::debug!("Expanded prompt token {{{directory}}} from {:?}", full_path);
    Ok(prompt.replace(&prompt[open..=close], &content))
}

/// Saved prompts, one per CSV row.
pub struct PromptArchive {
    path: PathBuf,
}

impl PromptArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved prompts in file order. A missing archive is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut prompts = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(first) = record.get(0).filter(|p| !p.is_empty()) {
                prompts.push(first.to_string());
            }
        }
        Ok(prompts)
    }

    /// Append `prompt` unless it is already saved. Returns whether it was added.
    pub fn save(&self, prompt: &str) -> Result<bool> {
        let existing = self.list()?;
        if existing.iter().any(|p| p == prompt) {
            tracing::debug!("Prompt already archived");
            return Ok(false);
        }
        let mut all = existing;
        all.push(prompt.to_string());
        self.write_all(&all)?;
        tracing::info!("Saved prompt to {:?}", self.path);
        Ok(true)
    }

    /// Remove every row equal to `prompt`. Returns whether anything was removed.
    pub fn delete(&self, prompt: &str) -> Result<bool> {
        let existing = self.list()?;
        let before = existing.len();
        let remaining: Vec<String> = existing.into_iter().filter(|p| p != prompt).collect();
        if remaining.len() == before {
            return Ok(false);
        }
        self.write_all(&remaining)?;
        Ok(true)
    }

    fn write_all(&self, prompts: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        for prompt in prompts {
            writer.write_record([prompt.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_without_token_is_identity() {
        let prompt = "Describe the image.";
        assert_eq!(expand(prompt, Path::new("a.png")).unwrap(), prompt);
        assert_eq!(expand("open { only", Path::new("a.png")).unwrap(), "open { only");
    }

    #[test]
    fn test_expand_substitutes_sibling_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cat.txt"), "a tabby cat").unwrap();
        let prompt = format!("Context: {{{}}}. Tag it.", dir.path().display());

        let expanded = expand(&prompt, Path::new("/images/cat.png")).unwrap();
        assert_eq!(expanded, "Context: a tabby cat. Tag it.");
    }

    #[test]
    fn test_expand_missing_file_is_file_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = format!("{{{}}}", dir.path().display());

        let err = expand(&prompt, Path::new("ghost.jpg")).unwrap_err();
        match err {
            ApiError::FileRead { path, .. } => assert!(path.ends_with("ghost.txt")),
            other => panic!("expected FileRead, got {other:?}"),
        }
    }

    #[test]
    fn test_archive_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PromptArchive::new(dir.path().join("prompts.csv"));
        assert!(archive.list().unwrap().is_empty());
    }

    #[test]
    fn test_archive_save_dedupes_and_delete_removes() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PromptArchive::new(dir.path().join("prompts.csv"));

        assert!(archive.save("tags, please").unwrap());
        assert!(archive.save("describe \"quoted\"\nmultiline").unwrap());
        assert!(!archive.save("tags, please").unwrap());
        assert_eq!(
            archive.list().unwrap(),
            vec![
                "tags, please".to_string(),
                "describe \"quoted\"\nmultiline".to_string()
            ]
        );

        assert!(archive.delete("tags, please").unwrap());
        assert!(!archive.delete("not there").unwrap());
        assert_eq!(
            archive.list().unwrap(),
            vec!["describe \"quoted\"\nmultiline".to_string()]
        );
    }
}
