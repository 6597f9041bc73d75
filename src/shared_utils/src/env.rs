use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// A variable is set but is empty or only whitespace.
    #[error("Environment variable {0} is set but empty")]
    Empty(String),
}

/// Reads an environment variable, returning a structured error if it's missing or blank.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvError> {
    let value = std::env::var(name).map_err(|_| EnvError::Missing(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(EnvError::Empty(name.to_string()));
    }
    Ok(value)
}

/// Reads an optional path-valued variable.
///
/// Unset and blank values both yield `None`, so callers can fall back to a default.
pub fn env_path(name: &str) -> Option<PathBuf> {
    get_env_var(name).ok().map(|v| PathBuf::from(v.trim()))
}
