//! Shared JSON-over-HTTP plumbing for hosted providers.

use std::time::Duration;

use legalmind_core::{RagError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Build an HTTP client with the configured request timeout.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::config(format!("Failed to build HTTP client: {}", e)))
}

/// POST `body` as JSON with bearer auth and decode the JSON reply.
///
/// Transport failures carry status 0; non-success replies carry the HTTP
/// status and the response body as the message.
pub async fn post_json<Req, Resp>(
    client: &reqwest::Client,
    provider: &str,
    url: &str,
    api_key: &str,
    body: &Req,
) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| RagError::provider(provider, 0, format!("Failed to send request: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(RagError::provider(provider, status.as_u16(), error_text));
    }

    response.json::<Resp>().await.map_err(|e| {
        RagError::provider(
            provider,
            status.as_u16(),
            format!("Failed to parse response: {}", e),
        )
    })
}

/// Join a base URL and a path without doubling the slash.
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
