// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_blob_store;
pub mod logging;
pub mod memory_blob_store;
pub mod reqwest_fetcher;
