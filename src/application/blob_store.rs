// Blob store trait for persisted dashboard state
use thiserror::Error;

/// Key holding the JSON array of every dashboard.
pub const DASHBOARDS_KEY: &str = "dashboard_configs";
/// Key holding the id of the selected dashboard as plain text.
pub const CURRENT_DASHBOARD_KEY: &str = "current_dashboard";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("storage I/O failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// String-valued key-value storage. Only the dashboard store talks to it.
pub trait BlobStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
