//! ACE configuration.
//!
//! Loaded from `~/.ace/config.toml` unless `--config` names another file.
//! A missing default file means defaults; everything is optional:
//!
//! ```toml
//! playbook = "/home/analyst/.ace/playbook.md"
//!
//! [inference]
//! backend = "ollama"
//! url = "http://localhost:11434"
//! model = "deepseek-r1:7b"
//! max-tokens = 512
//! timeout-secs = 300
//! ```
//!
//! or, to run generation through an external program:
//!
//! ```toml
//! [inference]
//! backend = "command"
//! program = "llama-cli"
//! args = ["-m", "trm-ace.gguf", "-f", "/dev/stdin"]
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::playbook::PlaybookStore;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// ACE configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Playbook location. Defaults to `~/.ace/playbook.md`.
    pub playbook: Option<PathBuf>,

    /// Which inference backend to use and how to reach it.
    pub inference: InferenceConfig,
}

/// Inference backend selection, tagged by `backend`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum InferenceConfig {
    Ollama(OllamaConfig),
    Command(CommandConfig),
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self::Ollama(OllamaConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    /// Upper bound on generated tokens per call.
    pub max_tokens: u32,
    /// Per-request timeout. Unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "deepseek-r1:7b".to_string(),
            max_tokens: 512,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Config {
    /// Loads config from `explicit`, or from the default path.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = Self::path().ok_or(ConfigError::NoHome)?;
        match Self::from_file(&path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Reads and parses a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The config file path: `~/.ace/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ace").join("config.toml"))
    }

    /// The configured playbook path, falling back to the default location.
    pub fn playbook_path(&self) -> Option<PathBuf> {
        self.playbook.clone().or_else(PlaybookStore::default_path)
    }
}
