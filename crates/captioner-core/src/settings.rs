//! Persisted API settings (`{model, api_key, api_url}` as JSON).
//!
//! The file is overwritten wholesale on every save. Writes go to a temporary
//! sibling first and are renamed into place.

use crate::error::Result;
use crate::llm::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model label stored for OpenAI-style endpoints.
pub const GPT_MODEL_LABEL: &str = "GPT";

/// Endpoint of a locally served CogVLM-style model.
pub const LOCAL_MODEL_URL: &str = "http://127.0.0.1:8000/v1/chat/completions";

/// The saved API model, key, and URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: GPT_MODEL_LABEL.to_string(),
            api_key: String::new(),
            api_url: String::new(),
        }
    }
}

impl Settings {
    /// Settings for a key/URL pair, with the model label inferred from the URL.
    pub fn for_endpoint(api_key: &str, api_url: &str) -> Self {
        let model = match ProviderKind::from_url(api_url) {
            ProviderKind::DashScope => crate::llm::dashscope::DASHSCOPE_MODEL.to_string(),
            ProviderKind::OpenAi => GPT_MODEL_LABEL.to_string(),
        };
        Self {
            model,
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
        }
    }
}

/// Default model choice from the "set as default" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultModel {
    /// OpenAI-style endpoint with the given key and URL
    Gpt { api_key: String, api_url: String },
    /// A locally served CogVLM variant (e.g. "vqa", "chat")
    Local { variant: String },
}

/// Reads and writes the settings file.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved settings.
    ///
    /// A missing file yields the defaults. A legacy file with an empty model
    /// but a saved key is upgraded in place.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&content)?;

        if !settings.model.is_empty() {
            return Ok(settings);
        }
        if settings.api_key.is_empty() {
            return Ok(Settings::default());
        }

        tracing::info!("Upgrading legacy settings file {:?}", self.path);
        let upgraded = Settings::for_endpoint(&settings.api_key, &settings.api_url);
        self.write(&upgraded)?;
        Ok(upgraded)
    }

    /// Remember the key and URL used for a call. Empty keys are not recorded.
    pub fn save_api_details(&self, api_key: &str, api_url: &str) -> Result<bool> {
        if api_key.is_empty() {
            return Ok(false);
        }
        self.write(&Settings::for_endpoint(api_key, api_url))?;
        Ok(true)
    }

    /// Persist a default model choice and return a confirmation message.
    pub fn set_default(&self, choice: &DefaultModel) -> Result<String> {
        let (settings, label) = match choice {
            DefaultModel::Gpt { api_key, api_url } => (
                Settings {
                    model: GPT_MODEL_LABEL.to_string(),
                    api_key: api_key.clone(),
                    api_url: api_url.clone(),
                },
                GPT_MODEL_LABEL.to_string(),
            ),
            DefaultModel::Local { variant } => (
                Settings {
                    model: format!("Cog-{variant}"),
                    api_key: String::new(),
                    api_url: LOCAL_MODEL_URL.to_string(),
                },
                variant.clone(),
            ),
        };
        self.write(&settings)?;
        Ok(format!("Set {label} as default."))
    }

    fn write(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp, serde_json::to_string_pretty(settings)?)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!("Settings written to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHSCOPE_URL: &str =
        "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("api_settings.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_dir, store) = store();
        assert!(store
            .save_api_details("sk-1", "https://api.openai.com/v1/chat/completions")
            .unwrap());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.model, "GPT");
        assert_eq!(loaded.api_key, "sk-1");
        assert!(!store.path().with_file_name("api_settings.json.tmp").exists());
    }

    #[test]
    fn test_empty_key_is_not_saved() {
        let (_dir, store) = store();
        assert!(!store.save_api_details("", "https://x").unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_dashscope_url_infers_model() {
        let (_dir, store) = store();
        store.save_api_details("key", DASHSCOPE_URL).unwrap();
        assert_eq!(store.load().unwrap().model, "qwen-vl-plus");
    }

    #[test]
    fn test_legacy_file_is_upgraded() {
        let (_dir, store) = store();
        std::fs::write(
            store.path(),
            format!(r#"{{"api_key": "legacy", "api_url": "{DASHSCOPE_URL}"}}"#),
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.model, "qwen-vl-plus");
        let on_disk: Settings =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, loaded);
    }

    #[test]
    fn test_set_default_local_model() {
        let (_dir, store) = store();
        let message = store
            .set_default(&DefaultModel::Local {
                variant: "vqa".to_string(),
            })
            .unwrap();
        assert_eq!(message, "Set vqa as default.");

        let loaded = store.load().unwrap();
        assert_eq!(loaded.model, "Cog-vqa");
        assert_eq!(loaded.api_key, "");
        assert_eq!(loaded.api_url, LOCAL_MODEL_URL);
    }
}
