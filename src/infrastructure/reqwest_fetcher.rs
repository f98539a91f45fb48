// Reqwest-backed HTTP fetcher for api data sources
use crate::application::http_fetcher::{ApiRequest, HttpFetcher};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_request(&self, request: &ApiRequest) -> Result<reqwest::Request> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .with_context(|| format!("Invalid HTTP method {}", request.method))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .header("Accept", "application/json");
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder
            .build()
            .with_context(|| format!("Invalid request to {}", request.url))
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: &ApiRequest) -> Result<Value> {
        let request = self.build_request(request)?;
        let url = request.url().clone();

        tracing::debug!("Fetching widget data from {}", url);
        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Request to {} failed with status {}: {}", url, status, body);
        }

        response
            .json::<Value>()
            .await
            .context("Response body is not valid JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn request(url: &str, params: &[(&str, &str)]) -> ApiRequest {
        ApiRequest {
            url: url.to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
        }
    }

    fn url_of(request: &ApiRequest) -> String {
        ReqwestFetcher::new()
            .build_request(request)
            .unwrap()
            .url()
            .to_string()
    }

    #[test]
    fn test_request_url_encodes_params() {
        let url = url_of(&request(
            "https://example.com/data",
            &[("q", "a b"), ("page", "2")],
        ));
        assert_eq!(url, "https://example.com/data?page=2&q=a+b");

        let url = url_of(&request("https://example.com/data?x=1", &[("y", "2")]));
        assert_eq!(url, "https://example.com/data?x=1&y=2");

        let url = url_of(&request("https://example.com/data", &[]));
        assert_eq!(url, "https://example.com/data");
    }

    #[test]
    fn test_params_go_before_the_fragment() {
        let url = url_of(&request("https://example.com/data#top", &[("q", "1")]));
        assert_eq!(url, "https://example.com/data?q=1#top");
    }

    #[test]
    fn test_invalid_method_is_an_error() {
        let mut bad = request("https://example.com/data", &[]);
        bad.method = "NOT A METHOD".to_string();
        assert!(ReqwestFetcher::new().build_request(&bad).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let fetcher = ReqwestFetcher::new();
        let result = fetcher.fetch(&request("http://127.0.0.1:1/unreachable", &[])).await;
        assert!(result.is_err());
    }
}
