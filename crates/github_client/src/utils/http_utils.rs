use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chat_core::{Config, ProxyAuth};
use log::{debug, error, info};
use reqwest::{Method, Proxy, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::error::{GitHubError, Result};

pub const USER_AGENT: &str = concat!("chat-archiver/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client from config: proxies, user agent and,
/// when `http_max_retries > 0`, transient-failure retries.
pub fn build_http_client(config: &Config) -> Result<Arc<ClientWithMiddleware>> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

    if !config.http_proxy.is_empty() {
        let proxy = Proxy::http(&config.http_proxy)
            .map_err(|e| GitHubError::ClientSetup(format!("invalid http_proxy: {e}")))?;
        builder = builder.proxy(with_auth(proxy, config.http_proxy_auth.as_ref()));
    }
    if !config.https_proxy.is_empty() {
        let proxy = Proxy::https(&config.https_proxy)
            .map_err(|e| GitHubError::ClientSetup(format!("invalid https_proxy: {e}")))?;
        builder = builder.proxy(with_auth(proxy, config.https_proxy_auth.as_ref()));
    }

    let client = builder
        .build()
        .map_err(|e| GitHubError::ClientSetup(e.to_string()))?;

    let mut middleware = ClientBuilder::new(client);
    if config.http_max_retries > 0 {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
            .build_with_max_retries(config.http_max_retries);
        middleware = middleware.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }

    Ok(Arc::new(middleware.build()))
}

fn with_auth(proxy: Proxy, auth: Option<&ProxyAuth>) -> Proxy {
    match auth {
        Some(auth) => proxy.basic_auth(&auth.username, &auth.password),
        None => proxy,
    }
}

/// Sends a request and returns status plus body text, logging the exchange.
/// Transport failures become `GitHubError::Network`.
pub async fn send_for_text(
    request: RequestBuilder,
    method: Method,
    url: &str,
) -> Result<(StatusCode, String)> {
    info!("Sending {} request to {}", method, url);
    let start_time = Instant::now();

    let response = match request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            let error_msg = format!("Failed HTTP request to {}: {}", url, e);
            error!("{}", error_msg);
            if let Some(source) = e.source() {
                error!("Error source: {:?}", source);
            }
            return Err(GitHubError::Network(error_msg));
        }
    };

    let status = response.status();
    info!(
        "Got response from {} after {:?} with status {}",
        url,
        start_time.elapsed(),
        status
    );

    let body = response.text().await.map_err(|e| {
        error!("Failed to read response body from {}: {}", url, e);
        GitHubError::Network(format!("Failed to read response from {}: {}", url, e))
    })?;
    debug!("Response body length from {}: {}", url, body.len());

    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_client() {
        let config = Config::default();
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn retry_and_proxy_settings_build() {
        let mut config = Config::default();
        config.http_max_retries = 2;
        config.https_proxy = "http://127.0.0.1:3128".to_string();
        config.https_proxy_auth = Some(ProxyAuth {
            username: "user".to_string(),
            password: "pass".to_string(),
        });
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(USER_AGENT.starts_with("chat-archiver/"));
    }
}
