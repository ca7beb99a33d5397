use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::undo_stack::DEFAULT_HISTORY_LIMIT;

/// Default debounce window for autosave
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Editing session tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept, clamped to `1..=50` by the undo stack
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Quiet period before a scheduled save is written
    #[serde(default = "default_autosave_debounce", with = "millis")]
    pub autosave_debounce: Duration,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_autosave_debounce() -> Duration {
    DEFAULT_AUTOSAVE_DEBOUNCE
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            autosave_debounce: default_autosave_debounce(),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.autosave_debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_config() {
        let config: EditorConfig = serde_json::from_str(r#"{ "historyLimit": 10, "autosaveDebounce": 250 }"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.autosave_debounce, Duration::from_millis(250));

        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
