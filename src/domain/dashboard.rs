// Dashboard domain model
use super::widget::Widget;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Grid,
    Freeform,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTheme {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub layout: LayoutMode,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<CustomTheme>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Dashboard {
    /// The dashboard synthesized when nothing usable is persisted.
    pub fn default_at(now_ms: i64) -> Self {
        Self {
            id: format!("dashboard_{}_default", now_ms),
            title: "My Dashboard".to_string(),
            description: Some("Welcome to your new dashboard".to_string()),
            widgets: Vec::new(),
            layout: LayoutMode::Grid,
            theme: Theme::Light,
            custom_theme: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn widget(&self, widget_id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == widget_id)
    }

    pub fn widget_mut(&mut self, widget_id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == widget_id)
    }

    pub fn contains_widget(&self, widget_id: &str) -> bool {
        self.widget(widget_id).is_some()
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }
}

/// Fields a caller may supply when creating a dashboard; everything else is
/// filled in by the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub layout: Option<LayoutMode>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub custom_theme: Option<CustomTheme>,
}

impl DashboardDraft {
    #[cfg(test)]
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn into_dashboard(self, id: String, now_ms: i64) -> Dashboard {
        Dashboard {
            id,
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "New Dashboard".to_string()),
            description: Some(self.description.unwrap_or_default()),
            widgets: self.widgets,
            layout: self.layout.unwrap_or_default(),
            theme: self.theme.unwrap_or_default(),
            custom_theme: self.custom_theme,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}
