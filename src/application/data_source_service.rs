// Data source service - Resolves a widget's data source to a payload
use crate::application::http_fetcher::{ApiRequest, HttpFetcher};
use crate::domain::widget::{DataSource, DataSourceKind};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Payload shape used for every failed resolution.
pub fn error_payload(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// The error message carried by a resolved payload, if any.
pub fn payload_error(payload: &Value) -> Option<&str> {
    payload.get("error").and_then(Value::as_str)
}

#[derive(Clone)]
pub struct DataSourceService {
    fetcher: Arc<dyn HttpFetcher>,
}

impl DataSourceService {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve a data source. Never fails: problems come back as
    /// `{"error": ...}` payloads.
    pub async fn resolve(&self, source: &DataSource) -> Value {
        tracing::debug!("Resolving {} data source", source.kind.as_str());
        match source.kind {
            DataSourceKind::Static => source.data.clone().unwrap_or_else(|| json!({})),
            DataSourceKind::Api => self.fetch_from_api(&source.config).await,
            DataSourceKind::Function => evaluate_function(&source.config),
            DataSourceKind::Database => json!({
                "message": "Database connection not implemented",
                "config": source.config,
            }),
        }
    }

    async fn fetch_from_api(&self, config: &Value) -> Value {
        let request = match api_request(config) {
            Some(request) => request,
            None => return error_payload("URL is required"),
        };

        match self.fetcher.fetch(&request).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("API request to {} failed: {:#}", request.url, e);
                error_payload(format!("Failed to fetch data: {:#}", e))
            }
        }
    }
}

/// Build the outbound request from an api source config. `None` when no URL
/// is configured.
fn api_request(config: &Value) -> Option<ApiRequest> {
    let url = config
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())?;

    let method = config
        .get("method")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("GET");

    let body = match config.get("body") {
        None | Some(Value::Null) => None,
        Some(body) => Some(body.clone()),
    };

    Some(ApiRequest {
        url: url.to_string(),
        method: method.to_string(),
        headers: string_map(config.get("headers")),
        params: string_map(config.get("params")),
        body,
    })
}

/// Flatten a JSON object into string pairs; non-string scalars are rendered
/// with their JSON text.
fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), rendered)
        })
        .collect()
}

/// Evaluate `config.function` as a pure arithmetic expression. The expression
/// engine has no access to I/O, variables or host functions.
fn evaluate_function(config: &Value) -> Value {
    let expression = config
        .get("function")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty());

    let Some(expression) = expression else {
        return error_payload("Function is required");
    };

    match exmex::eval_str::<f64>(expression) {
        Ok(result) => match serde_json::Number::from_f64(result) {
            Some(number) => Value::Number(number),
            None => {
                tracing::warn!("Function {} produced non-finite result {}", expression, result);
                error_payload("Failed to execute function: result is not a finite number")
            }
        },
        Err(e) => {
            tracing::error!("Function execution error: {}", e);
            error_payload(format!("Failed to execute function: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::reqwest_fetcher::ReqwestFetcher;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records requests and answers with a canned result.
    struct FakeFetcher {
        seen: Mutex<Vec<ApiRequest>>,
        fail: bool,
    }

    impl FakeFetcher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl HttpFetcher for FakeFetcher {
        async fn fetch(&self, request: &ApiRequest) -> anyhow::Result<Value> {
            self.seen.lock().push(request.clone());
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(json!({"rows": [1, 2, 3]}))
        }
    }

    fn service(fetcher: Arc<FakeFetcher>) -> DataSourceService {
        DataSourceService::new(fetcher)
    }

    #[tokio::test]
    async fn test_static_returns_payload_unchanged() {
        let svc = service(FakeFetcher::new(false));
        let source = DataSource::static_data(json!({"content": "hello"}));

        let first = svc.resolve(&source).await;
        let second = svc.resolve(&source).await;
        assert_eq!(first, json!({"content": "hello"}));
        assert_eq!(first, second);
        assert_eq!(source.data, Some(json!({"content": "hello"})));
    }

    #[tokio::test]
    async fn test_static_without_data_is_empty_object() {
        let svc = service(FakeFetcher::new(false));
        let source = DataSource {
            kind: DataSourceKind::Static,
            config: json!({}),
            data: None,
        };
        assert_eq!(svc.resolve(&source).await, json!({}));
    }

    #[tokio::test]
    async fn test_api_passes_config_through() {
        let fetcher = FakeFetcher::new(false);
        let svc = service(fetcher.clone());
        let source = DataSource {
            kind: DataSourceKind::Api,
            config: json!({
                "url": "https://example.com/rows",
                "method": "post",
                "headers": {"X-Token": "abc"},
                "params": {"limit": 10},
                "body": {"filter": "open"}
            }),
            data: None,
        };

        assert_eq!(svc.resolve(&source).await, json!({"rows": [1, 2, 3]}));

        let seen = fetcher.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "post");
        assert_eq!(seen[0].headers.get("X-Token").map(String::as_str), Some("abc"));
        assert_eq!(seen[0].params.get("limit").map(String::as_str), Some("10"));
        assert_eq!(seen[0].body, Some(json!({"filter": "open"})));
    }

    #[tokio::test]
    async fn test_api_defaults_to_get_without_body() {
        let fetcher = FakeFetcher::new(false);
        let svc = service(fetcher.clone());
        svc.resolve(&DataSource::api("https://example.com", "")).await;

        let seen = fetcher.seen.lock();
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].body, None);
    }

    #[tokio::test]
    async fn test_api_without_url_is_error_payload() {
        let fetcher = FakeFetcher::new(false);
        let svc = service(fetcher.clone());
        let source = DataSource {
            kind: DataSourceKind::Api,
            config: json!({"method": "GET"}),
            data: None,
        };

        let payload = svc.resolve(&source).await;
        assert_eq!(payload_error(&payload), Some("URL is required"));
        assert!(fetcher.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_api_failure_is_contained() {
        let svc = service(FakeFetcher::new(true));
        let payload = svc.resolve(&DataSource::api("https://example.com", "GET")).await;

        let message = payload_error(&payload).unwrap();
        assert!(message.starts_with("Failed to fetch data"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_contained() {
        let svc = DataSourceService::new(Arc::new(ReqwestFetcher::new()));
        let payload = svc
            .resolve(&DataSource::api("http://127.0.0.1:1/data", "GET"))
            .await;
        assert!(payload_error(&payload).is_some());
    }

    #[tokio::test]
    async fn test_function_evaluates_expression() {
        let svc = service(FakeFetcher::new(false));
        let payload = svc.resolve(&DataSource::function("2 * (3 + 4)")).await;
        assert_eq!(payload.as_f64(), Some(14.0));
    }

    #[tokio::test]
    async fn test_function_errors_are_contained() {
        let svc = service(FakeFetcher::new(false));

        let payload = svc.resolve(&DataSource::function("2 * (")).await;
        assert!(payload_error(&payload)
            .unwrap()
            .starts_with("Failed to execute function"));

        let payload = svc.resolve(&DataSource::function("1 / 0")).await;
        assert!(payload_error(&payload).is_some());

        let missing = DataSource {
            kind: DataSourceKind::Function,
            config: json!({}),
            data: None,
        };
        let payload = svc.resolve(&missing).await;
        assert_eq!(payload_error(&payload), Some("Function is required"));
    }

    #[tokio::test]
    async fn test_database_is_placeholder() {
        let svc = service(FakeFetcher::new(false));
        let source = DataSource {
            kind: DataSourceKind::Database,
            config: json!({"table": "orders"}),
            data: None,
        };

        let payload = svc.resolve(&source).await;
        assert_eq!(payload["message"], "Database connection not implemented");
        assert_eq!(payload["config"], json!({"table": "orders"}));
        assert!(payload_error(&payload).is_none());
    }
}
