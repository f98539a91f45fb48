// Widget registry - Catalog of widget templates
use crate::domain::template::{
    ConfigOption, ConfigOptionKind as Cfg, DataOption, DataOptionKind as Data, WidgetTemplate,
};
use crate::domain::widget::Size;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    templates: Vec<WidgetTemplate>,
}

impl WidgetRegistry {
    /// Registry seeded with the built-in chart, stats, table and text widgets.
    pub fn with_defaults() -> Self {
        Self {
            templates: vec![chart(), stats(), table(), text()],
        }
    }

    /// Copy of every template, in catalog order.
    pub fn list(&self) -> Vec<WidgetTemplate> {
        self.templates.clone()
    }

    pub fn get(&self, widget_type: &str) -> Option<WidgetTemplate> {
        self.templates
            .iter()
            .find(|t| t.widget_type == widget_type)
            .cloned()
    }

    /// Insert a template, replacing any existing one with the same type.
    pub fn register(&mut self, template: WidgetTemplate) {
        match self
            .templates
            .iter_mut()
            .find(|t| t.widget_type == template.widget_type)
        {
            Some(existing) => {
                tracing::debug!("Replacing widget template {}", template.widget_type);
                *existing = template;
            }
            None => {
                tracing::debug!("Registering widget template {}", template.widget_type);
                self.templates.push(template);
            }
        }
    }
}

/// Shallow merge: keys from `updates` override `base` when both are objects.
pub fn merge_json(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, Value::Null) => base.clone(),
        _ => updates.clone(),
    }
}

fn chart() -> WidgetTemplate {
    WidgetTemplate {
        widget_type: "chart".to_string(),
        name: "Chart Widget".to_string(),
        icon: "bar_chart".to_string(),
        description: "Display data in various chart formats".to_string(),
        default_size: Size::new(6, 4),
        default_config: json!({
            "chartType": "line",
            "showLegend": true,
            "animated": true,
            "colors": ["#1976d2", "#f44336", "#4caf50", "#ff9800"],
            "xAxisLabel": "X Axis",
            "yAxisLabel": "Y Axis",
            "showGrid": true,
        }),
        config_options: vec![
            ConfigOption::new("chartType", "Chart Type", Cfg::Select, json!("line")).with_options(&[
                ("Line Chart", "line"),
                ("Bar Chart", "bar"),
                ("Pie Chart", "pie"),
                ("Doughnut Chart", "doughnut"),
            ]),
            ConfigOption::new("showLegend", "Show Legend", Cfg::Boolean, json!(true)),
            ConfigOption::new("animated", "Animated", Cfg::Boolean, json!(true)),
        ],
        data_options: vec![DataOption::required(
            "series",
            "Data Series",
            Data::Array,
            "Array of data series objects",
        )],
    }
}

fn stats() -> WidgetTemplate {
    WidgetTemplate {
        widget_type: "stats".to_string(),
        name: "Statistics Widget".to_string(),
        icon: "analytics".to_string(),
        description: "Show key performance indicators".to_string(),
        default_size: Size::new(3, 2),
        default_config: json!({
            "layout": "grid",
            "showIcons": true,
            "colorScheme": "default",
        }),
        config_options: vec![
            ConfigOption::new("layout", "Layout", Cfg::Select, json!("grid"))
                .with_options(&[("Grid", "grid"), ("List", "list")]),
            ConfigOption::new("showIcons", "Show Icons", Cfg::Boolean, json!(true)),
        ],
        data_options: vec![DataOption::required(
            "stats",
            "Statistics",
            Data::Array,
            "Array of statistic objects",
        )],
    }
}

fn table() -> WidgetTemplate {
    WidgetTemplate {
        widget_type: "table".to_string(),
        name: "Data Table".to_string(),
        icon: "table_view".to_string(),
        description: "Display tabular data with sorting and filtering".to_string(),
        default_size: Size::new(8, 5),
        default_config: json!({
            "sortable": true,
            "filterable": true,
            "paginated": true,
            "pageSize": 10,
        }),
        config_options: vec![
            ConfigOption::new("sortable", "Sortable", Cfg::Boolean, json!(true)),
            ConfigOption::new("filterable", "Filterable", Cfg::Boolean, json!(true)),
            ConfigOption::new("paginated", "Paginated", Cfg::Boolean, json!(true)),
        ],
        data_options: vec![
            DataOption::required("columns", "Columns", Data::Array, "Array of column objects"),
            DataOption::required("rows", "Rows", Data::Array, "Array of data objects"),
        ],
    }
}

fn text() -> WidgetTemplate {
    WidgetTemplate {
        widget_type: "text".to_string(),
        name: "Rich Text".to_string(),
        icon: "article".to_string(),
        description: "Add formatted text content".to_string(),
        default_size: Size::new(4, 3),
        default_config: json!({
            "editorMode": "wysiwyg",
            "allowHTML": true,
        }),
        config_options: vec![
            ConfigOption::new("editorMode", "Editor Mode", Cfg::Select, json!("wysiwyg"))
                .with_options(&[("WYSIWYG", "wysiwyg"), ("Markdown", "markdown")]),
            ConfigOption::new("allowHTML", "Allow HTML", Cfg::Boolean, json!(true)),
        ],
        data_options: vec![DataOption::required(
            "content",
            "Content",
            Data::String,
            "Text content",
        )],
    }
}
