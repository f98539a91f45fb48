// Application layer - Use cases and ports
pub mod blob_store;
pub mod dashboard_service;
pub mod dashboard_store;
pub mod data_source_service;
pub mod http_fetcher;
pub mod sample_data;
pub mod widget_data_cache;
pub mod widget_registry;
