//! Sample run configuration, persisted as TOML in `<workdir>/samples.toml`.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogue::DEFAULT_URL;
use crate::markup::{AlignOptions, TrailingText};

/// Errors from reading or writing the configuration file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(gtei::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(gtei::config::parse),
        help("Check the TOML syntax. Unknown keys are ignored; every key is optional.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(gtei::config::write),
        help("Ensure you have write permissions to the working directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Which texts to convert and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplesConfig {
    /// Where to download the catalogue container from.
    #[serde(default = "default_catalogue_url")]
    pub catalogue_url: String,
    /// Only texts in this language are converted.
    #[serde(default = "default_language")]
    pub language: String,
    /// Texts to pass over at the head of the sorted list.
    #[serde(default = "default_skip")]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Worker threads; half the available CPUs when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(default)]
    pub trailing_text: TrailingText,
    /// Regenerate TEI files that already exist.
    #[serde(default)]
    pub overwrite: bool,
}

fn default_catalogue_url() -> String {
    DEFAULT_URL.into()
}
fn default_language() -> String {
    "en".into()
}
fn default_skip() -> usize {
    50
}
fn default_limit() -> usize {
    10
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self {
            catalogue_url: default_catalogue_url(),
            language: default_language(),
            skip: default_skip(),
            limit: default_limit(),
            threads: None,
            trailing_text: TrailingText::default(),
            overwrite: false,
        }
    }
}

impl SamplesConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Effective worker count: the configured value, or `ceil(cpus / 2)`.
    pub fn worker_threads(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
            cpus.div_ceil(2)
        })
    }

    pub fn align_options(&self) -> AlignOptions {
        AlignOptions::with_trailing(self.trailing_text)
    }
}
