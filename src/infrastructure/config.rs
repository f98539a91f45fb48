use crate::domain::layout::{GridSpec, DEFAULT_GRID_COLUMNS, DEFAULT_MAX_ROWS};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub grid: GridSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GridSettings {
    pub columns: u32,
    pub max_rows: u32,
}

impl GridSettings {
    pub fn spec(&self) -> GridSpec {
        GridSpec {
            columns: self.columns,
            max_rows: self.max_rows,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("storage.backend", "file")?
        .set_default("storage.dir", "data")?
        .set_default("grid.columns", i64::from(DEFAULT_GRID_COLUMNS))?
        .set_default("grid.max_rows", i64::from(DEFAULT_MAX_ROWS))?
        .set_default("logging.level", "info")?)
}

/// Defaults, then `config/app.*` if present, then `DASHBOARD__*` env vars.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
