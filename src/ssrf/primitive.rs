//! The outbound HTTP request.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::ssrf::mitigations::Outbound;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Blocked: Request timeout")]
    Timeout,
    #[error("{0}")]
    Request(String),
}

/// Issue the request and return the response body as text.
pub async fn fetch(client: &reqwest::Client, outbound: &Outbound) -> Result<String, FetchError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &outbound.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::Request(format!("Invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::Request(format!("Invalid header value: {}", e)))?;
        headers.insert(name, value);
    }

    let mut builder = client
        .request(outbound.method.into(), &outbound.url)
        .headers(headers);
    if let Some(timeout) = outbound.timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder.send().await.map_err(classify)?;
    response.text().await.map_err(classify)
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(error.to_string())
    }
}

/// Client shared by every SSRF route. No client-wide timeout: only the
/// timeout route sets one per request. Targets are always dialed directly,
/// never through a proxy taken from the environment.
pub fn client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("mitigation-lab/", env!("CARGO_PKG_VERSION")))
        .no_proxy()
        .connect_timeout(Duration::from_secs(30))
        .build()
}
