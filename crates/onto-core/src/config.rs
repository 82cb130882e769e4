//! Editor configuration
//!
//! Loaded from TOML. Store limits sit at the top level next to the editor's
//! own settings:
//!
//! ```toml
//! max_batch_mutations = 500
//! title_cache_capacity = 10000
//! title_cache_ttl_secs = 300
//! system_users = ["ouhrac"]
//! log_filter = "info,onto_inheritance=debug"
//! ```

use crate::error::EditorError;
use onto_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration of an [`crate::OntologyEditor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Batch limit and title cache sizing
    #[serde(flatten)]
    pub store: StoreConfig,
    /// Accounts whose edits are logged but not credited as contributions
    pub system_users: Vec<String>,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            system_users: vec!["ouhrac".to_string()],
            log_filter: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EditorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML for this shape
    pub fn from_toml(text: &str) -> Result<Self, EditorError> {
        Ok(toml::from_str(text)?)
    }

    /// With mutation limit per commit
    #[inline]
    #[must_use]
    pub fn with_max_batch_mutations(mut self, limit: usize) -> Self {
        self.store = self.store.with_max_batch_mutations(limit);
        self
    }

    /// With title cache capacity
    #[inline]
    #[must_use]
    pub fn with_title_cache_capacity(mut self, capacity: u64) -> Self {
        self.store = self.store.with_title_cache_capacity(capacity);
        self
    }

    /// With title cache TTL
    #[inline]
    #[must_use]
    pub fn with_title_cache_ttl(mut self, ttl: Duration) -> Self {
        self.store = self.store.with_title_cache_ttl(ttl);
        self
    }

    /// Replace the system accounts
    #[must_use]
    pub fn with_system_users<I, T>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.system_users = users.into_iter().map(Into::into).collect();
        self
    }

    /// With default log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = EditorConfig::new();
        assert_eq!(config.store.max_batch_mutations, 500);
        assert_eq!(config.store.title_cache_capacity, 10_000);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.system_users, vec!["ouhrac".to_string()]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml("max_batch_mutations = 20\nsystem_users = []\n").unwrap();
        assert_eq!(config.store.max_batch_mutations, 20);
        assert_eq!(config.store.title_cache_ttl_secs, 300);
        assert!(config.system_users.is_empty());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = EditorConfig::from_toml("max_batch_mutations = \"many\"").unwrap_err();
        assert!(matches!(err, EditorError::ConfigParse(_)));
    }

    #[test]
    fn builders_compose() {
        let config = EditorConfig::new()
            .with_max_batch_mutations(3)
            .with_title_cache_capacity(7)
            .with_title_cache_ttl(Duration::from_secs(9))
            .with_system_users(["bot"])
            .with_log_filter("debug");
        assert_eq!(config.store.max_batch_mutations, 3);
        assert_eq!(config.store.title_cache_capacity, 7);
        assert_eq!(config.store.title_cache_ttl_secs, 9);
        assert_eq!(config.system_users, vec!["bot".to_string()]);
        assert_eq!(config.log_filter, "debug");
    }
}
