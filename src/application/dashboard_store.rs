// Dashboard store - In-memory dashboards mirrored to a blob store
use crate::application::blob_store::{BlobStore, CURRENT_DASHBOARD_KEY, DASHBOARDS_KEY};
use crate::domain::dashboard::{Dashboard, DashboardDraft};
use crate::domain::ids;
use crate::domain::layout::GridSpec;
use crate::domain::widget::{Size, Widget};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("dashboard '{0}' not found")]
    DashboardNotFound(String),
    #[error("widget '{widget_id}' not found in dashboard '{dashboard_id}'")]
    WidgetNotFound {
        dashboard_id: String,
        widget_id: String,
    },
    #[error("widget '{widget_id}' already exists in dashboard '{dashboard_id}'")]
    DuplicateWidget {
        dashboard_id: String,
        widget_id: String,
    },
    #[error("widget index {index} is out of range for {len} widgets")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("widget size {width}x{height} does not fit the grid")]
    InvalidSize { width: u32, height: u32 },
    #[error("unknown widget type '{0}'")]
    UnknownWidgetType(String),
    #[error("failed to serialize dashboard: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("dashboard JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("dashboard JSON is missing '{0}'")]
    MissingField(&'static str),
    #[error(transparent)]
    Invalid(#[from] StoreError),
}

pub type SubscriptionId = u64;

/// Full view of the store handed to every subscriber after a change.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreSnapshot<'a> {
    pub dashboards: &'a [Dashboard],
    pub current: Option<&'a Dashboard>,
}

type Listener = Box<dyn Fn(StoreSnapshot<'_>) + Send + Sync>;

pub struct DashboardStore {
    blob_store: Arc<dyn BlobStore>,
    dashboards: Vec<Dashboard>,
    current_id: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
    grid: GridSpec,
}

impl DashboardStore {
    /// Restore state from the blob store, synthesizing a default dashboard when
    /// nothing usable is persisted.
    pub fn load(blob_store: Arc<dyn BlobStore>) -> Self {
        let mut store = Self {
            blob_store,
            dashboards: Vec::new(),
            current_id: None,
            listeners: Vec::new(),
            next_subscription: 1,
            grid: GridSpec::default(),
        };
        store.load_dashboards();
        store.load_current();
        store
    }

    /// Bound stored widget sizes by `grid` instead of the default grid.
    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = grid;
        self
    }

    fn load_dashboards(&mut self) {
        let dashboards = match self.blob_store.get(DASHBOARDS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Dashboard>>(&raw) {
                Ok(dashboards) => dashboards,
                Err(e) => {
                    tracing::warn!("Persisted dashboards are malformed, starting fresh: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Error loading dashboards: {}", e);
                Vec::new()
            }
        };

        if dashboards.is_empty() {
            self.create_default_dashboard();
        } else {
            tracing::debug!("Loaded {} dashboards", dashboards.len());
            self.dashboards = dashboards;
        }
    }

    fn load_current(&mut self) {
        let remembered = match self.blob_store.get(CURRENT_DASHBOARD_KEY) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Error loading current dashboard: {}", e);
                None
            }
        };

        if let Some(id) = remembered {
            if self.get(&id).is_some() {
                self.current_id = Some(id);
                return;
            }
            tracing::debug!("Remembered dashboard {} no longer exists", id);
        }

        if let Some(first) = self.dashboards.first() {
            self.current_id = Some(first.id.clone());
            self.persist_current();
        }
    }

    fn create_default_dashboard(&mut self) {
        let dashboard = Dashboard::default_at(ids::now_ms());
        tracing::info!("Creating default dashboard {}", dashboard.id);
        self.current_id = Some(dashboard.id.clone());
        self.dashboards = vec![dashboard];
        self.persist_dashboards();
        self.persist_current();
    }

    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    pub fn get(&self, dashboard_id: &str) -> Option<&Dashboard> {
        self.dashboards.iter().find(|d| d.id == dashboard_id)
    }

    pub fn current(&self) -> Option<&Dashboard> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            dashboards: &self.dashboards,
            current: self.current(),
        }
    }

    pub fn set_current(&mut self, dashboard_id: &str) -> Result<(), StoreError> {
        if self.get(dashboard_id).is_none() {
            return Err(StoreError::DashboardNotFound(dashboard_id.to_string()));
        }
        self.current_id = Some(dashboard_id.to_string());
        self.persist_current();
        self.notify();
        Ok(())
    }

    /// Add a new dashboard and select it. Returns the generated id.
    pub fn create_dashboard(&mut self, draft: DashboardDraft) -> Result<String, StoreError> {
        let dashboard = draft.into_dashboard(ids::dashboard_id(), ids::now_ms());
        self.check_widgets(&dashboard)?;
        let id = dashboard.id.clone();
        tracing::info!(dashboard_id = %id, "Created dashboard");

        self.dashboards.push(dashboard);
        self.persist_dashboards();
        self.current_id = Some(id.clone());
        self.persist_current();
        self.notify();
        Ok(id)
    }

    /// Replace a dashboard wholesale, keyed by its id.
    pub fn update_dashboard(&mut self, mut dashboard: Dashboard) -> Result<(), StoreError> {
        let index = self
            .dashboards
            .iter()
            .position(|d| d.id == dashboard.id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard.id.clone()))?;
        self.check_widgets(&dashboard)?;

        dashboard.touch(ids::now_ms());
        self.dashboards[index] = dashboard;
        self.persist_dashboards();
        self.notify();
        Ok(())
    }

    pub fn delete_dashboard(&mut self, dashboard_id: &str) -> Result<Dashboard, StoreError> {
        let index = self
            .dashboards
            .iter()
            .position(|d| d.id == dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;

        let removed = self.dashboards.remove(index);
        self.persist_dashboards();

        if self.current_id.as_deref() == Some(dashboard_id) {
            self.current_id = self.dashboards.first().map(|d| d.id.clone());
            self.persist_current();
        }

        tracing::info!(dashboard_id = %dashboard_id, "Deleted dashboard");
        self.notify();
        Ok(removed)
    }

    pub fn add_widget(&mut self, dashboard_id: &str, widget: Widget) -> Result<(), StoreError> {
        self.check_size(widget.size)?;
        self.mutate_dashboard(dashboard_id, |dashboard| {
            if dashboard.contains_widget(&widget.id) {
                return Err(StoreError::DuplicateWidget {
                    dashboard_id: dashboard.id.clone(),
                    widget_id: widget.id.clone(),
                });
            }
            dashboard.widgets.push(widget);
            Ok(())
        })
    }

    pub fn update_widget(&mut self, dashboard_id: &str, widget: Widget) -> Result<(), StoreError> {
        self.check_size(widget.size)?;
        self.mutate_dashboard(dashboard_id, |dashboard| {
            let dashboard_id = dashboard.id.clone();
            let slot = dashboard
                .widget_mut(&widget.id)
                .ok_or_else(|| StoreError::WidgetNotFound {
                    dashboard_id,
                    widget_id: widget.id.clone(),
                })?;
            *slot = widget;
            Ok(())
        })
    }

    pub fn remove_widget(&mut self, dashboard_id: &str, widget_id: &str) -> Result<Widget, StoreError> {
        self.mutate_dashboard(dashboard_id, |dashboard| {
            let index = dashboard
                .widgets
                .iter()
                .position(|w| w.id == widget_id)
                .ok_or_else(|| StoreError::WidgetNotFound {
                    dashboard_id: dashboard.id.clone(),
                    widget_id: widget_id.to_string(),
                })?;
            Ok(dashboard.widgets.remove(index))
        })
    }

    pub fn mark_widget_refreshed(
        &mut self,
        dashboard_id: &str,
        widget_id: &str,
        at_ms: i64,
    ) -> Result<(), StoreError> {
        self.mutate_dashboard(dashboard_id, |dashboard| {
            let dashboard_id = dashboard.id.clone();
            let widget = dashboard
                .widget_mut(widget_id)
                .ok_or_else(|| StoreError::WidgetNotFound {
                    dashboard_id,
                    widget_id: widget_id.to_string(),
                })?;
            widget.last_refreshed = Some(at_ms);
            Ok(())
        })
    }

    /// Move the widget at `from` so it ends up at `to` in the widget order.
    pub fn reorder_widget(&mut self, dashboard_id: &str, from: usize, to: usize) -> Result<(), StoreError> {
        self.mutate_dashboard(dashboard_id, |dashboard| {
            let len = dashboard.widgets.len();
            for index in [from, to] {
                if index >= len {
                    return Err(StoreError::IndexOutOfRange { index, len });
                }
            }
            let widget = dashboard.widgets.remove(from);
            dashboard.widgets.insert(to, widget);
            Ok(())
        })
    }

    pub fn export_dashboard(&self, dashboard_id: &str) -> Result<String, StoreError> {
        let dashboard = self
            .get(dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;
        serde_json::to_string(dashboard).map_err(|e| {
            tracing::error!("Error serializing dashboard {}: {}", dashboard_id, e);
            StoreError::Serialization(e.to_string())
        })
    }

    /// Parse an exported dashboard and add it under a freshly generated id.
    pub fn import_dashboard(&mut self, json: &str) -> Result<String, ImportError> {
        let value: Value = serde_json::from_str(json)?;
        for field in ["id", "title"] {
            let present = value
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if !present {
                tracing::warn!("Rejecting dashboard import without {}", field);
                return Err(ImportError::MissingField(field));
            }
        }

        let mut dashboard: Dashboard = serde_json::from_value(value)?;
        dashboard.id = ids::dashboard_id();
        if let Err(e) = self.check_widgets(&dashboard) {
            tracing::warn!("Rejecting dashboard import: {}", e);
            return Err(e.into());
        }
        let id = dashboard.id.clone();
        tracing::info!(dashboard_id = %id, "Imported dashboard");

        self.dashboards.push(dashboard);
        self.persist_dashboards();
        self.notify();
        Ok(id)
    }

    /// Register a listener. It is called right away with the current state and
    /// again after every change until unsubscribed.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(StoreSnapshot<'_>) + Send + Sync + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        listener(self.snapshot());
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn check_size(&self, size: Size) -> Result<(), StoreError> {
        if self.grid.admits(size) {
            Ok(())
        } else {
            Err(StoreError::InvalidSize {
                width: size.width,
                height: size.height,
            })
        }
    }

    /// Every widget fits the grid and no widget id repeats.
    fn check_widgets(&self, dashboard: &Dashboard) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for widget in &dashboard.widgets {
            self.check_size(widget.size)?;
            if !seen.insert(widget.id.as_str()) {
                return Err(StoreError::DuplicateWidget {
                    dashboard_id: dashboard.id.clone(),
                    widget_id: widget.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Apply `change` to one dashboard, then bump its timestamp, persist and
    /// notify. Nothing is persisted when `change` fails.
    fn mutate_dashboard<T, F>(&mut self, dashboard_id: &str, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Dashboard) -> Result<T, StoreError>,
    {
        let dashboard = self
            .dashboards
            .iter_mut()
            .find(|d| d.id == dashboard_id)
            .ok_or_else(|| StoreError::DashboardNotFound(dashboard_id.to_string()))?;

        let result = change(dashboard)?;
        dashboard.touch(ids::now_ms());

        self.persist_dashboards();
        self.notify();
        Ok(result)
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for (_, listener) in &self.listeners {
            listener(snapshot);
        }
    }

    fn persist_dashboards(&self) {
        let json = match serde_json::to_string(&self.dashboards) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Error serializing dashboards: {}", e);
                return;
            }
        };
        if let Err(e) = self.blob_store.set(DASHBOARDS_KEY, &json) {
            tracing::error!("Error saving dashboards: {}", e);
        }
    }

    fn persist_current(&self) {
        let result = match &self.current_id {
            Some(id) => self.blob_store.set(CURRENT_DASHBOARD_KEY, id),
            None => self.blob_store.remove(CURRENT_DASHBOARD_KEY),
        };
        if let Err(e) = result {
            tracing::error!("Error saving current dashboard: {}", e);
        }
    }
}
