//! Server configuration.

use cardsync_protocol::RESOURCE;
use std::path::PathBuf;

/// Configuration for the card server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Name of the resource, and of its key in the database file.
    pub resource: String,
    /// Database file. Every mutation is written back when set.
    pub db_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Creates an in-memory configuration for the default resource.
    pub fn new() -> Self {
        Self {
            resource: RESOURCE.to_string(),
            db_path: None,
        }
    }

    /// Sets the resource name.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Persists the table to `path`.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.resource, "flash-cards");
        assert!(config.db_path.is_none());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_resource("decks")
            .with_db_path("/tmp/db.json");

        assert_eq!(config.resource, "decks");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/db.json")));
    }
}
