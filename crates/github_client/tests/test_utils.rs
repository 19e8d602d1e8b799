//! Shared helpers for the HTTP-level tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::Client as ReqwestClient;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

/// Creates a test HTTP client without retry middleware
pub fn create_test_client() -> Arc<ClientWithMiddleware> {
    let client = ReqwestClient::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client");

    Arc::new(ClientBuilder::new(client).build())
}

/// Counter for tracking request attempts in tests
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    count: Arc<AtomicUsize>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Canned GitHub responses
pub struct MockResponseBuilder;

impl MockResponseBuilder {
    pub fn device_code(interval: u64) -> serde_json::Value {
        serde_json::json!({
            "device_code": "abc",
            "user_code": "WXYZ-1234",
            "verification_uri": "https://github.com/login/device",
            "expires_in": 900,
            "interval": interval
        })
    }

    pub fn oauth_error(error: &str) -> serde_json::Value {
        serde_json::json!({
            "error": error,
            "error_description": format!("{error} description"),
            "error_uri": "https://docs.github.com"
        })
    }

    pub fn access_token(token: &str) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "token_type": "bearer",
            "scope": "repo,user:email"
        })
    }

    pub fn repository(name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 1296269,
            "name": name,
            "full_name": format!("octocat/{name}"),
            "html_url": format!("https://github.com/octocat/{name}"),
            "private": false,
            "owner": { "login": "octocat" }
        })
    }

    pub fn file_content(path: &str) -> serde_json::Value {
        serde_json::json!({
            "content": {
                "name": path.rsplit('/').next().unwrap_or(path),
                "path": path,
                "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3",
                "html_url": format!("https://github.com/octocat/notes/blob/main/{path}")
            },
            "commit": {
                "sha": "7638417db6d59f3c431d3e1f261cc637155684cd",
                "html_url": "https://github.com/octocat/notes/commit/7638417"
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_counter() {
        let counter = RequestCounter::new();
        assert_eq!(counter.get(), 0);

        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_mock_response_builder() {
        assert_eq!(MockResponseBuilder::device_code(5)["user_code"], "WXYZ-1234");
        assert_eq!(
            MockResponseBuilder::oauth_error("slow_down")["error"],
            "slow_down"
        );
        assert_eq!(
            MockResponseBuilder::file_content("a/b.md")["content"]["name"],
            "b.md"
        );
    }
}
