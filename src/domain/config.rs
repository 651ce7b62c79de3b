use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::document::WORDS_PER_MINUTE;

/// Configuration for a content library and the editors working on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Reading speed used to estimate read times.
    words_per_minute: usize,

    /// How long the editor waits after the last edit before autosaving, in
    /// milliseconds.
    autosave_delay_ms: u64,

    /// Whether the library directory may contain files that are not
    /// recognised as content, books or taxonomy.
    pub allow_unrecognised: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            words_per_minute: WORDS_PER_MINUTE,
            autosave_delay_ms: default_autosave_delay_ms(),
            allow_unrecognised: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Reading speed used to estimate read times. Never zero.
    #[must_use]
    pub fn words_per_minute(&self) -> usize {
        self.words_per_minute.max(1)
    }

    /// The autosave debounce delay.
    #[must_use]
    pub const fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Sets the autosave debounce delay.
    pub fn set_autosave_delay(&mut self, delay: Duration) {
        self.autosave_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    }
}

const fn default_words_per_minute() -> usize {
    WORDS_PER_MINUTE
}

const fn default_autosave_delay_ms() -> u64 {
    2000
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_words_per_minute")]
        words_per_minute: usize,

        #[serde(default = "default_autosave_delay_ms")]
        autosave_delay_ms: u64,

        #[serde(default)]
        allow_unrecognised: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                words_per_minute,
                autosave_delay_ms,
                allow_unrecognised,
            } => Self {
                words_per_minute,
                autosave_delay_ms,
                allow_unrecognised,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            words_per_minute: config.words_per_minute,
            autosave_delay_ms: config.autosave_delay_ms,
            allow_unrecognised: config.allow_unrecognised,
        }
    }
}
