//! Test runs described in TOML.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::run::TestRun;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario `{path}`")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid scenario `{path}`")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl TestRun {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a scenario file. A missing `name` defaults to the file stem.
    pub fn load(path: &Utf8Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut test = Self::from_toml(&text).map_err(|source| ScenarioError::Parse {
            path: path.to_owned(),
            source,
        })?;
        if test.name.is_empty() {
            test.name = path.file_stem().unwrap_or("scenario").to_string();
        }
        Ok(test)
    }
}
