// HTTP port used by api data sources
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// A fully described outbound request taken from a data source's config.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Perform the request and decode the response body as JSON.
    async fn fetch(&self, request: &ApiRequest) -> anyhow::Result<Value>;
}
