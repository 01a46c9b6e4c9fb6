//! Thin JSON-over-HTTP client for the SAPE backend.
//!
//! Every request carries `Content-Type: application/json` and, once a session
//! exists, `Authorization: Bearer <token>`. The token is shared between clones
//! so the session store can swap it without rebuilding the client.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sape_shared::constants::{DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://10.0.2.2:8080/api`.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Error payloads the backend is known to send.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    detail_message: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the bearer token attached to subsequent requests.
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "api request");

        let builder = self.http.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.request(Method::GET, path).send().await?;
        decode(check(resp).await?).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        decode(check(resp).await?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::PUT, path).json(body).send().await?;
        decode(check(resp).await?).await
    }

    /// DELETE `path`, ignoring whatever body the server returns.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let resp = self.request(Method::DELETE, path).send().await?;
        check(resp).await?;
        Ok(())
    }
}

/// Turn non-2xx responses into [`ApiError::Status`], keeping the server's
/// message when it sent one.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.detail_message.or(b.message).or(b.error))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: format!("{}/", server.url()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_bearer_header_only_with_token() {
        let mut server = mockito::Server::new_async().await;
        let anonymous = server
            .mock("GET", "/ping")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        let client = client_for(&server);
        let ok: bool = client.get_json("ping").await.unwrap();
        assert!(ok);
        anonymous.assert_async().await;

        let authed = server
            .mock("GET", "/ping")
            .match_header("authorization", "Bearer t0k3n")
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        client.set_token(Some("t0k3n".into()));
        let _: bool = client.get_json("/ping").await.unwrap();
        authed.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_error_keeps_detail_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/thing")
            .with_status(400)
            .with_body(json!({"detailMessage": "nome inválido"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .post_json::<_, serde_json::Value>("thing", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("nome inválido"));
    }

    #[tokio::test]
    async fn test_status_error_without_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/thing/1")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.delete("thing/1").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, ref message } if message == "Not Found"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/thing")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get_json::<Vec<String>>("thing").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
