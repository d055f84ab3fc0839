use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Env config file '{path}' not found")]
    FileNotFound { path: PathBuf },

    #[error("Error loading env config file '{path}': {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Invalid value for {name}: \"{value}\"")]
    InvalidValue { name: String, value: String },

    #[error("Invalid log level : \"{0}\"")]
    InvalidLogLevel(String),

    #[error("No command to execute: pass it after '--' (e.g. -- make all)")]
    MissingCommand,
}

/// Reads a `KEY=value` env file.
///
/// Pairs are returned in file order. The process environment is left
/// untouched; layering over it is the resolver's job.
///
/// - If the file doesn't exist, returns `ConfigError::FileNotFound`.
/// - If a line can't be parsed, returns `ConfigError::FileUnreadable`.
pub fn load_env_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let unreadable = |source: dotenvy::Error| ConfigError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = Vec::new();
    for item in dotenvy::from_path_iter(path).map_err(unreadable)? {
        vars.push(item.map_err(unreadable)?);
    }
    Ok(vars)
}
