// Widget domain model
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-left grid cell of a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Extent of a widget in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Static,
    Api,
    Function,
    Database,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceKind::Static => "static",
            DataSourceKind::Api => "api",
            DataSourceKind::Function => "function",
            DataSourceKind::Database => "database",
        }
    }
}

/// Where a widget's data comes from. `config` is kind specific; `data` is only
/// meaningful for static sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "type")]
    pub kind: DataSourceKind,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl DataSource {
    pub fn static_data(data: Value) -> Self {
        Self {
            kind: DataSourceKind::Static,
            config: Value::Object(Default::default()),
            data: Some(data),
        }
    }
}

#[cfg(test)]
impl DataSource {
    pub fn api(url: &str, method: &str) -> Self {
        Self {
            kind: DataSourceKind::Api,
            config: serde_json::json!({
                "url": url,
                "method": method,
                "headers": {},
                "params": {},
                "body": null,
            }),
            data: None,
        }
    }

    pub fn function(expression: &str) -> Self {
        Self {
            kind: DataSourceKind::Function,
            config: serde_json::json!({ "function": expression }),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub config: Value,
    pub data_source: DataSource,
    /// Seconds between refreshes; 0 or absent disables caching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refreshed: Option<i64>,
}

impl Widget {
    /// Cells covered by this widget, as a (position, size) footprint.
    pub fn footprint(&self) -> (Position, Size) {
        (self.position, self.size)
    }

    pub fn refresh_interval_ms(&self) -> Option<i64> {
        match self.refresh_interval {
            Some(secs) if secs > 0 => Some(secs.saturating_mul(1000) as i64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_widget_wire_format() {
        let widget = Widget {
            id: "widget_1".to_string(),
            widget_type: "text".to_string(),
            title: "Notes".to_string(),
            description: None,
            position: Position::new(2, 3),
            size: Size::new(4, 3),
            config: json!({"editorMode": "markdown"}),
            data_source: DataSource::static_data(json!({"content": "hi"})),
            refresh_interval: Some(30),
            last_refreshed: None,
        };

        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["dataSource"]["type"], "static");
        assert_eq!(value["refreshInterval"], 30);
        assert_eq!(value["position"], json!({"x": 2, "y": 3}));
        assert!(value.get("lastRefreshed").is_none());
    }

    #[test]
    fn test_refresh_interval_ms() {
        let mut widget: Widget = serde_json::from_value(json!({
            "id": "w",
            "type": "stats",
            "title": "Stats",
            "position": {"x": 0, "y": 0},
            "size": {"width": 3, "height": 2},
            "dataSource": {"type": "database", "config": {}}
        }))
        .unwrap();
        assert_eq!(widget.refresh_interval_ms(), None);

        widget.refresh_interval = Some(0);
        assert_eq!(widget.refresh_interval_ms(), None);

        widget.refresh_interval = Some(5);
        assert_eq!(widget.refresh_interval_ms(), Some(5000));
    }
}
