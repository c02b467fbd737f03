// Backend credentials, read from the process environment with an optional
// `.env` file filling the gaps.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_KEY";
pub const ENV_FILE_NAME: &str = ".env";

/// Where to reach the REST façade and the key to present to it.
#[derive(Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Load from the process environment. `env_file` skips discovery and
    /// reads that file instead; a missing explicit file is an error, a
    /// missing discovered file is not.
    pub fn from_env(env_file: Option<&Path>) -> Result<Self> {
        let pairs = match env_file {
            Some(path) => read_env_file(path)?,
            None => match find_env_file(&candidate_dirs()) {
                Some(path) => read_env_file(&path)?,
                None => Vec::new(),
            },
        };
        Self::resolve(|key| env::var(key).ok(), &pairs)
    }

    /// Combine an environment lookup with `.env` pairs. Environment values
    /// take precedence; blank values count as unset.
    pub fn resolve<F>(lookup: F, file_pairs: &[(String, String)]) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| {
                    file_pairs
                        .iter()
                        .find(|(k, v)| k == key && !v.trim().is_empty())
                        .map(|(_, v)| v.clone())
                })
        };
        match (get(URL_VAR), get(KEY_VAR)) {
            (Some(base_url), Some(api_key)) => Ok(Self::new(base_url.trim(), api_key.trim())),
            _ => Err(Error::Config(format!(
                "{URL_VAR} and {KEY_VAR} must be set in environment"
            ))),
        }
    }
}

/// Directories searched for a `.env` file, in priority order.
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs_out = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        dirs_out.push(cwd);
    }
    if let Ok(exe) = env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            dirs_out.push(exe_dir.to_path_buf());
            if let Some(parent) = exe_dir.parent() {
                dirs_out.push(parent.to_path_buf());
            }
        }
    }
    if let Some(config) = dirs::config_dir() {
        dirs_out.push(config.join("revpick"));
    }
    dirs_out
}

/// First directory holding a `.env` file wins.
pub fn find_env_file(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|dir| dir.join(ENV_FILE_NAME))
        .find(|path| path.is_file())
}

/// Parse a `.env` file into key/value pairs without touching the process
/// environment.
pub fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    debug!(path = %path.display(), "reading env file");
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    iter.map(|item| {
        item.map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    })
    .collect()
}
