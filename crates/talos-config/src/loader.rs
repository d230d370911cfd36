//! Extension-dispatched configuration file loading.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::ConfigError;

/// Loads a deserializable structure from a configuration file.
///
/// The format is chosen by file extension: `.json` is parsed as JSON,
/// `.toml` as TOML, and anything else (including `.yaml`/`.yml` and
/// unknown extensions) as YAML.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] when the file does not exist,
/// [`ConfigError::ReadError`] on other I/O failures, and a
/// format-specific variant when parsing fails.
///
/// # Example
///
/// ```rust,no_run
/// use serde::Deserialize;
/// use talos_config::load_file;
///
/// #[derive(Deserialize)]
/// struct AppConfig {
///     name: String,
/// }
///
/// # fn main() -> Result<(), talos_config::ConfigError> {
/// let config: AppConfig = load_file("app.json")?;
/// # Ok(())
/// # }
/// ```
pub fn load_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();

    let raw = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    match path.extension().and_then(OsStr::to_str) {
        Some("json") => Ok(serde_json::from_str(&raw)?),
        Some("toml") => Ok(toml::from_str(&raw)?),
        _ => Ok(serde_yaml::from_str(&raw)?),
    }
}
