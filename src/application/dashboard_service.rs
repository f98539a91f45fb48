// Dashboard service - Use cases for editing dashboards and loading widget data
use crate::application::dashboard_store::{
    DashboardStore, ImportError, StoreError, StoreSnapshot, SubscriptionId,
};
use crate::application::data_source_service::{payload_error, DataSourceService};
use crate::application::sample_data::default_data_source;
use crate::application::widget_data_cache::WidgetDataCache;
use crate::application::widget_registry::{merge_json, WidgetRegistry};
use crate::domain::dashboard::{Dashboard, DashboardDraft};
use crate::domain::ids;
use crate::domain::layout::GridSpec;
use crate::domain::template::WidgetTemplate;
use crate::domain::widget::{DataSource, Position, Size, Widget};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// What a caller supplies to add a widget; gaps are filled from the template.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDraft {
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub refresh_interval: Option<u64>,
    #[serde(default)]
    pub data_source: Option<DataSource>,
}

impl WidgetDraft {
    pub fn of_type(widget_type: &str) -> Self {
        Self {
            widget_type: widget_type.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
    pub widget_id: String,
    pub data: Value,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<Mutex<DashboardStore>>,
    registry: Arc<RwLock<WidgetRegistry>>,
    data_sources: DataSourceService,
    cache: Arc<Mutex<WidgetDataCache>>,
    grid: GridSpec,
}

impl DashboardService {
    pub fn new(
        store: DashboardStore,
        registry: WidgetRegistry,
        data_sources: DataSourceService,
        grid: GridSpec,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store.with_grid(grid))),
            registry: Arc::new(RwLock::new(registry)),
            data_sources,
            cache: Arc::new(Mutex::new(WidgetDataCache::new())),
            grid,
        }
    }

    pub fn dashboards(&self) -> Vec<Dashboard> {
        self.store.lock().dashboards().to_vec()
    }

    pub fn dashboard(&self, dashboard_id: &str) -> Result<Dashboard, StoreError> {
        self.store
            .lock()
            .get(dashboard_id)
            .cloned()
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))
    }

    pub fn current(&self) -> Option<Dashboard> {
        self.store.lock().current().cloned()
    }

    pub fn set_current(&self, dashboard_id: &str) -> Result<(), StoreError> {
        self.store.lock().set_current(dashboard_id)
    }

    pub fn create_dashboard(&self, draft: DashboardDraft) -> Result<String, StoreError> {
        self.store.lock().create_dashboard(draft)
    }

    /// Replace a dashboard. Its widgets' cached data is dropped since any of
    /// their sources may have changed.
    pub fn update_dashboard(&self, dashboard: Dashboard) -> Result<(), StoreError> {
        let dashboard_id = dashboard.id.clone();
        self.store.lock().update_dashboard(dashboard)?;
        self.cache.lock().evict_dashboard(&dashboard_id);
        Ok(())
    }

    pub fn delete_dashboard(&self, dashboard_id: &str) -> Result<(), StoreError> {
        self.store.lock().delete_dashboard(dashboard_id)?;
        let mut cache = self.cache.lock();
        let evicted = cache.evict_dashboard(dashboard_id);
        tracing::debug!(
            "Evicted {} cached widget payloads, {} remain",
            evicted,
            cache.len()
        );
        Ok(())
    }

    pub fn export_dashboard(&self, dashboard_id: &str) -> Result<String, StoreError> {
        self.store.lock().export_dashboard(dashboard_id)
    }

    pub fn import_dashboard(&self, json: &str) -> Result<String, ImportError> {
        self.store.lock().import_dashboard(json)
    }

    pub fn templates(&self) -> Vec<WidgetTemplate> {
        self.registry.read().list()
    }

    pub fn template(&self, widget_type: &str) -> Option<WidgetTemplate> {
        self.registry.read().get(widget_type)
    }

    pub fn register_template(&self, template: WidgetTemplate) {
        self.registry.write().register(template);
    }

    /// Where a `size` widget would land on the dashboard right now. Widths
    /// beyond the grid land at the origin; heights beyond the scanned rows are
    /// rejected.
    pub fn placement(&self, dashboard_id: &str, size: Size) -> Result<Position, StoreError> {
        if size.is_empty() || size.height > self.grid.max_rows {
            return Err(StoreError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        let store = self.store.lock();
        let dashboard = store
            .get(dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;
        Ok(self
            .grid
            .find_position(dashboard.widgets.iter().map(Widget::footprint), size))
    }

    /// Instantiate a widget from its template and place it in the first free
    /// spot.
    pub fn add_widget_from_template(
        &self,
        dashboard_id: &str,
        draft: WidgetDraft,
    ) -> Result<Widget, StoreError> {
        let template = self
            .template(&draft.widget_type)
            .ok_or_else(|| StoreError::UnknownWidgetType(draft.widget_type.clone()))?;

        let size = draft.size.unwrap_or(template.default_size);
        if !self.grid.admits(size) {
            return Err(StoreError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }

        let mut store = self.store.lock();
        let dashboard = store
            .get(dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;
        let position = self
            .grid
            .find_position(dashboard.widgets.iter().map(Widget::footprint), size);

        let data_source = draft
            .data_source
            .unwrap_or_else(|| default_data_source(&template.widget_type));
        let widget = Widget {
            id: ids::widget_id(),
            widget_type: template.widget_type,
            title: draft.title.filter(|t| !t.is_empty()).unwrap_or(template.name),
            description: Some(draft.description.unwrap_or(template.description)),
            position,
            size,
            config: merge_json(&template.default_config, &draft.config),
            data_source,
            refresh_interval: Some(draft.refresh_interval.unwrap_or(0)),
            last_refreshed: None,
        };

        tracing::info!(
            dashboard_id = %dashboard_id,
            widget_id = %widget.id,
            "Placing {} widget at ({}, {})",
            widget.widget_type,
            position.x,
            position.y
        );
        store.add_widget(dashboard_id, widget.clone())?;
        Ok(widget)
    }

    pub fn update_widget(&self, dashboard_id: &str, widget: Widget) -> Result<(), StoreError> {
        let widget_id = widget.id.clone();
        self.store.lock().update_widget(dashboard_id, widget)?;
        self.cache.lock().evict(dashboard_id, &widget_id);
        Ok(())
    }

    pub fn remove_widget(&self, dashboard_id: &str, widget_id: &str) -> Result<(), StoreError> {
        self.store.lock().remove_widget(dashboard_id, widget_id)?;
        self.cache.lock().evict(dashboard_id, widget_id);
        Ok(())
    }

    pub fn reorder_widget(&self, dashboard_id: &str, from: usize, to: usize) -> Result<(), StoreError> {
        self.store.lock().reorder_widget(dashboard_id, from, to)
    }

    /// Copy a widget under a new id into the next free position.
    pub fn duplicate_widget(&self, dashboard_id: &str, widget_id: &str) -> Result<Widget, StoreError> {
        let mut store = self.store.lock();
        let dashboard = store
            .get(dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;
        let original = dashboard
            .widget(widget_id)
            .ok_or_else(|| StoreError::WidgetNotFound {
                dashboard_id: dashboard_id.to_string(),
                widget_id: widget_id.to_string(),
            })?;

        let position = self
            .grid
            .find_position(dashboard.widgets.iter().map(Widget::footprint), original.size);
        let copy = Widget {
            id: ids::widget_id(),
            title: format!("{} (Copy)", original.title),
            position,
            ..original.clone()
        };

        store.add_widget(dashboard_id, copy.clone())?;
        Ok(copy)
    }

    /// Resolve a widget's data, reusing a cached payload while it is younger
    /// than the widget's refresh interval.
    pub async fn load_widget_data(&self, dashboard_id: &str, widget_id: &str) -> Result<Value, StoreError> {
        let widget = self.find_widget(dashboard_id, widget_id)?;

        if let Some(max_age) = widget.refresh_interval_ms() {
            let cache = self.cache.lock();
            if let Some(hit) = cache.fresh(dashboard_id, widget_id, max_age, ids::now_ms()) {
                tracing::debug!(widget_id = %widget_id, "Serving cached widget data");
                return Ok(hit.data.clone());
            }
        }

        let data = self.data_sources.resolve(&widget.data_source).await;
        let fetched_at = ids::now_ms();
        if let Some(error) = payload_error(&data) {
            tracing::warn!(widget_id = %widget_id, "Widget data source failed: {}", error);
        } else if self.widget_exists(dashboard_id, widget_id) {
            self.cache
                .lock()
                .insert(dashboard_id, widget_id, data.clone(), fetched_at);
        } else {
            tracing::debug!(widget_id = %widget_id, "Widget removed while loading, discarding data");
        }
        Ok(data)
    }

    /// Resolve a widget's data unconditionally and stamp `lastRefreshed`.
    pub async fn refresh_widget(&self, dashboard_id: &str, widget_id: &str) -> Result<Value, StoreError> {
        let widget = self.find_widget(dashboard_id, widget_id)?;
        let data = self.data_sources.resolve(&widget.data_source).await;
        let fetched_at = ids::now_ms();

        let marked = self
            .store
            .lock()
            .mark_widget_refreshed(dashboard_id, widget_id, fetched_at);
        let mut cache = self.cache.lock();
        match (marked, payload_error(&data)) {
            (Err(e), _) => tracing::debug!("Discarding refresh result: {}", e),
            (Ok(()), Some(error)) => {
                tracing::warn!(widget_id = %widget_id, "Widget refresh failed: {}", error);
                cache.evict(dashboard_id, widget_id);
            }
            (Ok(()), None) => cache.insert(dashboard_id, widget_id, data.clone(), fetched_at),
        }
        Ok(data)
    }

    /// Load every widget of a dashboard concurrently.
    pub async fn load_dashboard_data(&self, dashboard_id: &str) -> Result<Vec<WidgetData>, StoreError> {
        let widget_ids: Vec<String> = self
            .dashboard(dashboard_id)?
            .widgets
            .into_iter()
            .map(|w| w.id)
            .collect();

        let loads = widget_ids.iter().map(|widget_id| async move {
            self.load_widget_data(dashboard_id, widget_id)
                .await
                .ok()
                .map(|data| WidgetData {
                    widget_id: widget_id.clone(),
                    data,
                })
        });

        Ok(join_all(loads).await.into_iter().flatten().collect())
    }

    /// Resolve an arbitrary data source without touching any dashboard.
    pub async fn preview(&self, source: &DataSource) -> Value {
        self.data_sources.resolve(source).await
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(StoreSnapshot<'_>) + Send + Sync + 'static,
    {
        self.store.lock().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.lock().unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.store.lock().subscriber_count()
    }

    fn find_widget(&self, dashboard_id: &str, widget_id: &str) -> Result<Widget, StoreError> {
        let store = self.store.lock();
        let dashboard = store
            .get(dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;
        dashboard
            .widget(widget_id)
            .cloned()
            .ok_or_else(|| StoreError::WidgetNotFound {
                dashboard_id: dashboard_id.to_string(),
                widget_id: widget_id.to_string(),
            })
    }

    fn widget_exists(&self, dashboard_id: &str, widget_id: &str) -> bool {
        self.store
            .lock()
            .get(dashboard_id)
            .is_some_and(|d| d.contains_widget(widget_id))
    }
}
