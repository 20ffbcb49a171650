//! Environment-style key/value configuration.
//!
//! Deployment secrets and target addresses arrive as `KEY=value` pairs, either
//! from the process environment or a dotenv file. The map is built once at
//! startup and handed to whoever needs it; nothing here is cached globally.

use std::collections::HashMap;
use std::path::Path;

/// An immutable snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvMap {
    vars: HashMap<String, String>,
}

impl EnvMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment. Entries that are not
    /// valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (key, _) => {
                    tracing::warn!(key = ?key, "Skipping non UTF-8 environment variable");
                    None
                }
            })
            .collect();
        Self { vars }
    }

    /// Process environment overlaid with the dotenv file at `path`, if present.
    /// The file is read without touching the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, dotenvy::Error> {
        let mut env = Self::from_process();
        if let Some(path) = path {
            if path.exists() {
                let file_vars = dotenvy::from_path_iter(path)?.collect::<Result<Vec<_>, _>>()?;
                tracing::debug!(path = ?path, count = file_vars.len(), "Loaded env file");
                env.vars.extend(file_vars);
            }
        }
        Ok(env)
    }

    /// Insert or replace a variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Look up a variable. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
