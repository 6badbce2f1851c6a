//! Where a relay configuration comes from.

use std::path::{Path, PathBuf};

use thiserror::Error;
use token_codec::{ConfigError, Configuration, RaiFile};

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A configuration that may still need loading.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Already in memory.
    Inline(RaiFile),
    /// A `.rai` (JSON) or YAML file still to be read.
    Unresolved(PathBuf),
}

impl ConfigSource {
    /// Load (if needed) and validate.
    pub fn resolve(self) -> Result<Configuration, LoadError> {
        let raw = match self {
            ConfigSource::Inline(raw) => raw,
            ConfigSource::Unresolved(path) => load_file(&path)?,
        };
        let config = Configuration::validate(raw)?;
        log::info!(
            "loaded relay config for {} (version {}, fingerprint {})",
            config.urls().origin(),
            config.version().unwrap_or("unversioned"),
            config.fingerprint()
        );
        Ok(config)
    }
}

impl From<RaiFile> for ConfigSource {
    fn from(raw: RaiFile) -> Self {
        ConfigSource::Inline(raw)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::Unresolved(path)
    }
}

/// Read a raw configuration. `.yaml`/`.yml` files are YAML, anything else JSON.
pub fn load_file(path: &Path) -> Result<RaiFile, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&contents).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&contents).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
