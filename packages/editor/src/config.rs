use crate::autosave::DEFAULT_AUTOSAVE_DELAY;
use crate::undo_stack::DEFAULT_HISTORY_DEPTH;
use crate::EditorResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "designer.config.json";

/// Designer configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Directory holding stored design snapshots
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Base URL of the published-design service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Trailing delay before an edit is saved
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,

    /// Number of undo snapshots kept
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

fn default_storage_dir() -> String {
    ".designer".to_string()
}

fn default_autosave_delay_ms() -> u64 {
    DEFAULT_AUTOSAVE_DELAY.as_millis() as u64
}

fn default_history_depth() -> usize {
    DEFAULT_HISTORY_DEPTH
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(cwd: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }

    /// Get absolute path to the storage directory
    pub fn storage_path(&self, cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(&self.storage_dir)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            api_url: None,
            autosave_delay_ms: default_autosave_delay_ms(),
            history_depth: default_history_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "storageDir": "designs",
            "apiUrl": "https://designs.example.com/api",
            "autosaveDelayMs": 250
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.storage_dir, "designs");
        assert_eq!(config.api_url.as_deref(), Some("https://designs.example.com/api"));
        assert_eq!(config.autosave_delay(), Duration::from_millis(250));
        assert_eq!(config.history_depth, 10);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.storage_dir, ".designer");
        assert_eq!(config.api_url, None);
        assert_eq!(config.autosave_delay_ms, 1000);
        assert_eq!(config.history_depth, 10);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), EditorConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "historyDepth": 3 }"#).unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.history_depth, 3);
        assert_eq!(config.storage_path(dir.path()), dir.path().join(".designer"));
    }

    #[test]
    fn test_unreadable_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(DEFAULT_CONFIG_NAME)).unwrap();

        let result = EditorConfig::load(dir.path());
        assert!(matches!(result, Err(crate::EditorError::Io(_))));
    }
}
