// Sample payloads for widgets created without an explicit data source
use crate::domain::widget::DataSource;
use rand::Rng;
use serde_json::{json, Value};

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
const NAMES: [&str; 4] = ["John Doe", "Jane Smith", "Robert Johnson", "Emily Davis"];
const STATUSES: [&str; 3] = ["Active", "Inactive", "Pending"];

/// A static data source filled with demo data shaped for `widget_type`.
pub fn default_data_source(widget_type: &str) -> DataSource {
    let data = match widget_type {
        "chart" => chart_data(),
        "stats" => stats_data(),
        "table" => table_data(),
        "text" => json!({
            "content": "<h2>Sample Text Widget</h2><p>This is a sample text widget.</p>"
        }),
        _ => json!({}),
    };
    DataSource::static_data(data)
}

fn chart_data() -> Value {
    let mut rng = rand::thread_rng();
    let sales: Vec<u32> = MONTHS.iter().map(|_| rng.gen_range(100..1100)).collect();
    let revenue: Vec<u32> = MONTHS.iter().map(|_| rng.gen_range(500..2500)).collect();
    json!({
        "series": [
            { "name": "Sales", "data": sales },
            { "name": "Revenue", "data": revenue },
        ],
        "categories": MONTHS,
    })
}

fn stats_data() -> Value {
    let mut rng = rand::thread_rng();
    json!({
        "stats": [
            {
                "label": "Total Users",
                "value": rng.gen_range(1000..11000),
                "icon": "person",
                "change": rng.gen_range(-10..10),
            },
            {
                "label": "Revenue",
                "value": rng.gen_range(10000..110000),
                "prefix": "$",
                "icon": "attach_money",
                "change": rng.gen_range(-10..10),
            },
            {
                "label": "Orders",
                "value": rng.gen_range(100..1100),
                "icon": "shopping_cart",
                "change": rng.gen_range(-10..10),
            },
        ]
    })
}

fn table_data() -> Value {
    let mut rng = rand::thread_rng();
    let rows: Vec<Value> = (1..=10)
        .map(|i| {
            json!({
                "id": i,
                "name": NAMES[rng.gen_range(0..NAMES.len())],
                "email": format!("user{}@example.com", i),
                "status": STATUSES[rng.gen_range(0..STATUSES.len())],
            })
        })
        .collect();
    json!({
        "columns": [
            { "name": "id", "label": "ID", "type": "number" },
            { "name": "name", "label": "Name", "type": "string" },
            { "name": "email", "label": "Email", "type": "string" },
            { "name": "status", "label": "Status", "type": "string" },
        ],
        "rows": rows,
    })
}
