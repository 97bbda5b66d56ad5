use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{collect_deps::DuplicatePolicy, error::Error};

pub const DEFAULT_CONFIG_FILE: &str = "webpack.config.json";
pub const DEFAULT_OUTPUT_FILENAME: &str = "bundle.js";

/// Build configuration, read from a JSON file.
///
/// ```json
/// { "entry": "src/index.js", "output": { "path": "dist", "filename": "bundle.js" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub entry: PathBuf,
    pub output: OutputConfig,
    /// Record each module once even when several modules require it.
    #[serde(default)]
    pub dedupe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    DEFAULT_OUTPUT_FILENAME.to_owned()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// `path` only labels errors.
    pub fn parse(path: &Path, text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text).map_err(|source| Error::ConfigParse {
            path: path.to_owned(),
            source,
        })?;
        let invalid = |reason: &str| Error::ConfigInvalid {
            path: path.to_owned(),
            reason: reason.to_owned(),
        };
        if config.entry.as_os_str().is_empty() {
            return Err(invalid("`entry` must not be empty"));
        }
        if config.output.filename.is_empty() {
            return Err(invalid("`output.filename` must not be empty"));
        }
        Ok(config)
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.dedupe {
            DuplicatePolicy::FirstDiscovery
        } else {
            DuplicatePolicy::PerDiscovery
        }
    }
}
