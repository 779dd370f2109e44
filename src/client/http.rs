use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{RouteStore, StoreError};
use crate::routes::model::{Route, RouteId};

const ROUTES_PATH: [&str; 2] = ["api", "routes"];

/// Success envelope returned by the route API
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
}

/// REST implementation of the route persistence collaborator
#[derive(Debug, Clone)]
pub struct HttpRouteStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRouteStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Transport(format!("invalid base url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!("invalid base url '{}'", base_url)));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Build a store from the global configuration
    pub fn from_config() -> Result<Self, StoreError> {
        let api = &crate::config::config().api;
        Self::new(&api.base_url, Duration::from_secs(api.request_timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, extra: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(ROUTES_PATH);
            if let Some(segment) = extra {
                segments.push(segment);
            }
        }
        url
    }

    fn request(&self, method: Method, extra: Option<&str>) -> RequestBuilder {
        self.client.request(method, self.url(extra))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        tracing::debug!("Route API responded {}: {}", status, message);

        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        match envelope {
            Envelope { success: true, data: Some(data) } => Ok(data),
            _ => Err(StoreError::InvalidResponse("missing data in success envelope".to_string())),
        }
    }
}

/// Pull a human-readable message out of an API error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout(err.to_string())
    } else {
        StoreError::Transport(err.to_string())
    }
}

#[async_trait]
impl RouteStore for HttpRouteStore {
    async fn list_routes(&self) -> Result<Vec<Route>, StoreError> {
        let response = self.send(self.request(Method::GET, None)).await?;
        Self::decode(response).await
    }

    async fn create_routes(&self, routes: &[Route]) -> Result<(), StoreError> {
        self.send(self.request(Method::POST, None).json(routes)).await?;
        Ok(())
    }

    async fn update_routes(&self, routes: &[Route]) -> Result<(), StoreError> {
        self.send(self.request(Method::PUT, None).json(routes)).await?;
        Ok(())
    }

    async fn delete_route(&self, id: &RouteId) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, Some(id.as_str()))).await?;
        Ok(())
    }

    async fn delete_routes(&self, ids: &[RouteId]) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, None).json(&json!({ "ids": ids })))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpRouteStore {
        HttpRouteStore::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn builds_collection_and_item_urls() {
        let s = store("http://localhost:3000");
        assert_eq!(s.url(None).as_str(), "http://localhost:3000/api/routes");

        let s = store("http://localhost:3000/admin/");
        assert_eq!(s.url(Some("a/b")).as_str(), "http://localhost:3000/admin/api/routes/a%2Fb");
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(HttpRouteStore::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpRouteStore::new("mailto:admin@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(
            error_message(r#"{"error":true,"message":"Route not found: 7","code":"NOT_FOUND"}"#),
            Some("Route not found: 7".to_string())
        );
        assert_eq!(error_message(r#"{"success":false,"error":"boom"}"#), Some("boom".to_string()));
        assert_eq!(error_message("<html>"), None);
    }
}
