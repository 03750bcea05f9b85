//! HTTP transport shared by both story sources.
//!
//! The client is built once in `main` and injected into whichever source is
//! active. Every request goes through [`get_text`] or [`get_json`], which turn
//! transport errors, non-2xx answers and undecodable payloads into a
//! [`FetchError`]. Callers decide how to degrade; in this crate they log a
//! warning and carry on with "no data".

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::utils::truncate_for_log;

/// Failure of a single outbound request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} returned a malformed payload: {source}")]
    Payload {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:144.0) Gecko/20100101 Firefox/144.0"
                .to_string(),
        }
    }
}

/// Build the shared client: browser-like headers, redirects followed,
/// keep-alive, fixed per-request timeout.
pub fn build_client(config: &HttpConfig) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "application/json,text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

/// GET `url` and return the body as text.
#[instrument(level = "debug", skip(client))]
pub async fn get_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.text().await.map_err(transport)?;
    debug!(bytes = body.len(), "Fetched body");
    Ok(body)
}

/// GET `url` and decode the body as JSON.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, FetchError> {
    let body = get_text(client, url).await?;
    serde_json::from_str(&body).map_err(|source| {
        debug!(preview = %truncate_for_log(&body, 200), "Undecodable JSON body");
        FetchError::Payload {
            url: url.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_client(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_get_text_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let body = get_text(&client(), &format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_get_text_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = get_text(&client(), &format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_get_json_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = get_json::<serde_json::Value>(&client(), &format!("{}/bad.json", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Payload { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let err = get_text(&client(), "http://127.0.0.1:9/unreachable")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }
}
