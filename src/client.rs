use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, CLIENT_TRANSPORT_ERRORS,
};
use crate::types::{ChatRequest, ChatResponse};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Path of the chat endpoint, relative to the base URL.
pub const CHAT_ENDPOINT: &str = "api/chat";

/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "CHATBOX_URL";

/// Something that can carry a [`ChatRequest`] to a backend.
///
/// The controller only ever talks to this trait, which lets tests script
/// responses and arrival order.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends one request and waits for the parsed response.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// HTTP client for the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: ReqwestClient,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl ChatClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the CHATBOX_URL
    /// environment variable; it falls back to [`DEFAULT_BASE_URL`].
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with an optional request timeout.
    ///
    /// Without a timeout a request that never completes stays pending.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let endpoint = endpoint_url(&base_url)?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Returns the full URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Convert a non-success response into an error.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let reason = status.canonical_reason().map(String::from);
        // The body is diagnostic only; an unreadable one is not worth failing over.
        let body = response.text().await.ok().filter(|b| !b.is_empty());
        Error::http(status.as_u16(), reason, body)
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    async fn post(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        serde_json::from_slice::<ChatResponse>(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl ChatTransport for ChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.post(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => {}
            Err(err) if err.is_http() => CLIENT_REQUEST_ERRORS.click(),
            Err(_) => CLIENT_TRANSPORT_ERRORS.click(),
        }
        result
    }
}

/// Resolves the chat endpoint against a base URL.
///
/// A base with a path prefix keeps it: `http://host/app` posts to
/// `http://host/app/api/chat`.
pub fn endpoint_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url.trim())?;
    if base.cannot_be_a_base() {
        return Err(Error::url(
            format!("{base_url} cannot be used as a base URL"),
            None,
        ));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(CHAT_ENDPOINT)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_bare_host() {
        let url = endpoint_url("http://127.0.0.1:3000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/api/chat");
    }

    #[test]
    fn endpoint_keeps_path_prefix() {
        assert_eq!(
            endpoint_url("https://example.com/app").unwrap().as_str(),
            "https://example.com/app/api/chat"
        );
        assert_eq!(
            endpoint_url("https://example.com/app/").unwrap().as_str(),
            "https://example.com/app/api/chat"
        );
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(endpoint_url("not a url").is_err());
        assert!(endpoint_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn explicit_url_wins() {
        let client = ChatClient::new(Some("http://localhost:8080".to_string())).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8080/api/chat");
    }

    #[test]
    fn default_headers_are_json() {
        let client = ChatClient::new(Some(DEFAULT_BASE_URL.to_string())).unwrap();
        let headers = client.default_headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCEPT], "application/json");
    }
}
