use formdraft_editor::{EditorConfig, FileStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

pub const DEFAULT_CONFIG_NAME: &str = "formdraft.config.json";

/// Formdraft configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding saved documents
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Log verbosity when no -v flag is given
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// History limit and autosave window
    #[serde(flatten)]
    pub editor: EditorConfig,
}

fn default_store_dir() -> String {
    ".formdraft".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// File store rooted at the configured directory
    pub fn store(&self, cwd: &str) -> FileStore {
        FileStore::new(Path::new(cwd).join(&self.store_dir))
    }

    pub fn level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::WARN)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            log_level: default_log_level(),
            editor: EditorConfig::default(),
        }
    }
}
