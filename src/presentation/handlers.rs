// HTTP request handlers
use crate::application::dashboard_service::{DashboardService, WidgetData, WidgetDraft};
use crate::application::dashboard_store::SubscriptionId;
use crate::domain::dashboard::{Dashboard, DashboardDraft};
use crate::domain::template::WidgetTemplate;
use crate::domain::widget::{DataSource, Position, Size, Widget};
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SelectDashboard {
    pub id: String,
}

#[derive(Deserialize)]
pub struct PlacementQuery {
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<Dashboard>> {
    Json(state.dashboard_service.dashboards())
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<DashboardDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.dashboard_service.create_dashboard(draft)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn get_current_dashboard(
    State(state): State<Arc<AppState>>,
) -> Json<Option<Dashboard>> {
    Json(state.dashboard_service.current())
}

pub async fn set_current_dashboard(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectDashboard>,
) -> Result<StatusCode, ApiError> {
    state.dashboard_service.set_current(&body.id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.dashboard_service.dashboard(&id)?))
}

pub async fn update_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut dashboard): Json<Dashboard>,
) -> Result<StatusCode, ApiError> {
    dashboard.id = id;
    state.dashboard_service.update_dashboard(dashboard)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.dashboard_service.delete_dashboard(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let json = state.dashboard_service.export_dashboard(&id)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}

/// Import a dashboard from the raw JSON body produced by export.
pub async fn import_dashboard(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.dashboard_service.import_dashboard(&body)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn placement(
    Path(id): Path<String>,
    Query(query): Query<PlacementQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Position>, ApiError> {
    let size = Size::new(query.width, query.height);
    Ok(Json(state.dashboard_service.placement(&id, size)?))
}

pub async fn add_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<WidgetDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let widget = state.dashboard_service.add_widget_from_template(&id, draft)?;
    Ok((StatusCode::CREATED, Json(widget)))
}

pub async fn update_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(mut widget): Json<Widget>,
) -> Result<StatusCode, ApiError> {
    widget.id = widget_id;
    state.dashboard_service.update_widget(&id, widget)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.dashboard_service.remove_widget(&id, &widget_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let copy = state.dashboard_service.duplicate_widget(&id, &widget_id)?;
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn reorder_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    state.dashboard_service.reorder_widget(&id, body.from, body.to)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn widget_data(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.dashboard_service.load_widget_data(&id, &widget_id).await?))
}

pub async fn refresh_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.dashboard_service.refresh_widget(&id, &widget_id).await?))
}

pub async fn dashboard_data(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WidgetData>>, ApiError> {
    Ok(Json(state.dashboard_service.load_dashboard_data(&id).await?))
}

/// Resolve a data source that is not attached to any widget (config preview).
pub async fn resolve_data_source(
    State(state): State<Arc<AppState>>,
    Json(source): Json<DataSource>,
) -> Json<Value> {
    Json(state.dashboard_service.preview(&source).await)
}

pub async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<WidgetTemplate>> {
    Json(state.dashboard_service.templates())
}

pub async fn get_template(
    Path(widget_type): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.dashboard_service.template(&widget_type) {
        Some(template) => Json(template).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown widget type '{}'", widget_type) })),
        )
            .into_response(),
    }
}

pub async fn register_template(
    State(state): State<Arc<AppState>>,
    Json(template): Json<WidgetTemplate>,
) -> StatusCode {
    state.dashboard_service.register_template(template);
    StatusCode::NO_CONTENT
}

/// Unregisters its subscription when the event stream is dropped.
struct SubscriptionGuard {
    service: DashboardService,
    id: SubscriptionId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        tracing::debug!("Event stream {} closed", self.id);
        self.service.unsubscribe(self.id);
    }
}

/// Server-sent events carrying the full store snapshot after every change.
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(32);
    let service = state.dashboard_service.clone();

    let id = service.subscribe(move |snapshot| match serde_json::to_string(&snapshot) {
        Ok(json) => {
            if tx.try_send(json).is_err() {
                tracing::debug!("Dropping snapshot for slow or closed event stream");
            }
        }
        Err(e) => tracing::error!("Error serializing snapshot: {}", e),
    });
    let guard = SubscriptionGuard { service, id };

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(json) = rx.recv().await {
            yield Ok(Event::default().event("snapshot").data(json));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_store::DashboardStore;
    use crate::application::data_source_service::DataSourceService;
    use crate::application::widget_registry::WidgetRegistry;
    use crate::domain::layout::GridSpec;
    use crate::infrastructure::memory_blob_store::MemoryBlobStore;
    use crate::infrastructure::reqwest_fetcher::ReqwestFetcher;

    fn state() -> Arc<AppState> {
        let store = DashboardStore::load(Arc::new(MemoryBlobStore::new()));
        let dashboard_service = DashboardService::new(
            store,
            WidgetRegistry::with_defaults(),
            DataSourceService::new(Arc::new(ReqwestFetcher::new())),
            GridSpec::default(),
        );
        Arc::new(AppState { dashboard_service })
    }

    fn current_id(state: &Arc<AppState>) -> String {
        state.dashboard_service.current().unwrap().id
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "ok");
    }

    #[tokio::test]
    async fn test_missing_dashboard_is_not_found() {
        let state = state();
        let err = get_dashboard(Path("nope".to_string()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_widget_then_place_next() {
        let state = state();
        let id = current_id(&state);
        for _ in 0..2 {
            let draft = WidgetDraft {
                size: Some(Size::new(4, 2)),
                ..WidgetDraft::of_type("stats")
            };
            let response = add_widget(Path(id.clone()), State(state.clone()), Json(draft))
                .await
                .unwrap()
                .into_response();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let Json(position) = placement(
            Path(id),
            Query(PlacementQuery { width: 4, height: 2 }),
            State(state),
        )
        .await
        .unwrap();
        assert_eq!(position, Position::new(8, 0));
    }

    #[tokio::test]
    async fn test_import_rejects_incomplete_payload() {
        let state = state();
        let err = import_dashboard(State(state.clone()), r#"{"title": "x"}"#.to_string())
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.dashboard_service.dashboards().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_placement_is_rejected() {
        let state = state();
        let id = current_id(&state);
        let err = placement(
            Path(id),
            Query(PlacementQuery { width: 1, height: u32::MAX }),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_preview() {
        let state = state();
        let Json(value) =
            resolve_data_source(State(state), Json(DataSource::function("6 * 7"))).await;
        assert_eq!(value.as_f64(), Some(42.0));
    }

    #[tokio::test]
    async fn test_event_stream_unsubscribes_on_drop() {
        let state = state();
        assert_eq!(state.dashboard_service.subscriber_count(), 0);

        let sse = stream_events(State(state.clone())).await;
        assert_eq!(state.dashboard_service.subscriber_count(), 1);

        drop(sse);
        assert_eq!(state.dashboard_service.subscriber_count(), 0);
    }
}
