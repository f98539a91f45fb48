// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::application::blob_store::BlobStore;
use crate::application::dashboard_service::DashboardService;
use crate::application::dashboard_store::DashboardStore;
use crate::application::data_source_service::DataSourceService;
use crate::application::widget_registry::WidgetRegistry;
use crate::infrastructure::config::{load_app_config, StorageBackend};
use crate::infrastructure::file_blob_store::FileBlobStore;
use crate::infrastructure::logging;
use crate::infrastructure::memory_blob_store::MemoryBlobStore;
use crate::infrastructure::reqwest_fetcher::ReqwestFetcher;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_app_config()?;

    // Initialize tracing
    logging::init(&config.logging.level);

    // Create storage and fetcher (infrastructure layer)
    let blob_store: Arc<dyn BlobStore> = match config.storage.backend {
        StorageBackend::File => {
            let store = FileBlobStore::new(config.storage.dir.clone());
            tracing::info!("Persisting dashboards under {}", store.dir().display());
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory dashboard storage");
            Arc::new(MemoryBlobStore::new())
        }
    };
    let fetcher = Arc::new(ReqwestFetcher::new());

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        DashboardStore::load(blob_store),
        WidgetRegistry::with_defaults(),
        DataSourceService::new(fetcher),
        config.grid.spec(),
    );

    // Create application state
    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards).post(create_dashboard))
        .route("/dashboards/import", post(import_dashboard))
        .route(
            "/dashboards/current",
            get(get_current_dashboard).put(set_current_dashboard),
        )
        .route(
            "/dashboards/:id",
            get(get_dashboard).put(update_dashboard).delete(delete_dashboard),
        )
        .route("/dashboards/:id/export", get(export_dashboard))
        .route("/dashboards/:id/placement", get(placement))
        .route("/dashboards/:id/data", get(dashboard_data))
        .route("/dashboards/:id/widgets", post(add_widget))
        .route("/dashboards/:id/widgets/reorder", post(reorder_widget))
        .route(
            "/dashboards/:id/widgets/:widget_id",
            put(update_widget).delete(remove_widget),
        )
        .route(
            "/dashboards/:id/widgets/:widget_id/duplicate",
            post(duplicate_widget),
        )
        .route("/dashboards/:id/widgets/:widget_id/data", get(widget_data))
        .route(
            "/dashboards/:id/widgets/:widget_id/refresh",
            post(refresh_widget),
        )
        .route("/templates", get(list_templates).post(register_template))
        .route("/templates/:type", get(get_template))
        .route("/events", get(stream_events))
        .route("/resolve", post(resolve_data_source))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting dashboard-builder service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
