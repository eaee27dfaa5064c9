//! Shared HTTP plumbing for the networked providers

use crate::core::error::{ConductorError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest response body echoed into an error message
const MAX_ERROR_BODY: usize = 512;

/// Client with a transport-level deadline slightly past the call timeout.
///
/// `ProviderHealth::observe` is the primary deadline; this one only guards
/// against a request outliving the future that owns it.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout + Duration::from_secs(1))
        .build()
        .map_err(|e| ConductorError::Config(format!("failed to build HTTP client: {}", e)))
}

/// Send `request` and decode a JSON body of type `R`.
///
/// Non-2xx statuses become `Http`, undecodable bodies become
/// `MalformedResponse`; both count as provider failures.
pub async fn send_json<R: DeserializeOwned>(
    provider: &str,
    timeout: Duration,
    request: RequestBuilder,
) -> Result<R> {
    let response = request.send().await.map_err(|e| transport_error(provider, timeout, e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, timeout, e))?;

    if !status.is_success() {
        return Err(ConductorError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: truncate(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| ConductorError::MalformedResponse {
        provider: provider.to_string(),
        reason: format!("{} - body: {}", e, truncate(&body)),
    })
}

fn transport_error(provider: &str, timeout: Duration, e: reqwest::Error) -> ConductorError {
    if e.is_timeout() {
        ConductorError::Timeout {
            provider: provider.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        ConductorError::Transport(format!("{}: {}", provider, e))
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
