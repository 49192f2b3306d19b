// Key/value sources for configuration
// A .env file in the working directory, overlaid by the process environment.

use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;

/// Key/value pairs read from the environment or an env file.
pub type Source = HashMap<String, String>;

/// Default env file, resolved relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Read a dotenv-style file into a map without touching the process env.
///
/// A missing file yields an empty map: every key may still come from the
/// process environment. A file that exists but cannot be parsed is an error.
pub fn load_env_file(path: &Path) -> Result<Source, ConfigError> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "no env file, using process environment only");
            return Ok(Source::new());
        }
        Err(e) => {
            return Err(ConfigError::EnvFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };

    let mut source = Source::new();
    for item in iter {
        let (key, value) = item.map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        source.insert(key, value);
    }

    tracing::debug!(path = %path.display(), keys = source.len(), "loaded env file");
    Ok(source)
}

/// Env file values with the process environment layered on top.
///
/// Only keys in `keys` are taken from the process environment so unrelated
/// variables never leak into the source map.
pub fn merged_source(env_file: &Path, keys: &[&str]) -> Result<Source, ConfigError> {
    let mut source = load_env_file(env_file)?;
    overlay_process_env(&mut source, keys);
    Ok(source)
}

fn overlay_process_env(source: &mut Source, keys: &[&str]) {
    for key in keys {
        if let Ok(value) = std::env::var(key) {
            source.insert((*key).to_string(), value);
        }
    }
}
