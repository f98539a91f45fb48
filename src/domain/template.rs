// Widget template domain model
use super::widget::Size;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOptionKind {
    Text,
    Number,
    Boolean,
    Select,
    Color,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOptionKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

/// A configurable setting, described well enough to build a form for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOption {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ConfigOptionKind,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ConfigOption {
    pub fn new(key: &str, label: &str, kind: ConfigOptionKind, default_value: Value) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            default_value,
            options: Vec::new(),
            required: false,
            min: None,
            max: None,
        }
    }

    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(label, value)| SelectOption {
                label: label.to_string(),
                value: Value::String(value.to_string()),
            })
            .collect();
        self
    }
}

/// A field the widget expects in its resolved data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOption {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: DataOptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DataOption {
    pub fn required(key: &str, label: &str, kind: DataOptionKind, description: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: true,
            description: Some(description.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTemplate {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub default_size: Size,
    #[serde(default)]
    pub default_config: Value,
    #[serde(default)]
    pub config_options: Vec<ConfigOption>,
    #[serde(default)]
    pub data_options: Vec<DataOption>,
}
