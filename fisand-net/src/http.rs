// fisand-net/src/http.rs
use std::time::Duration;

use fisand_common::error::{FisandError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error};
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "fisand module fetcher (Rust)";
const PRIVATE_TOKEN_HEADER: &str = "private-token";
/// GitLab pagination header carrying the next page number; empty on the last page.
pub const NEXT_PAGE_HEADER: &str = "x-next-page";

pub fn build_http_client(token: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let mut token_value = HeaderValue::from_str(token)
        .map_err(|_| FisandError::Config("Gitlab token contains invalid characters".into()))?;
    token_value.set_sensitive(true);
    headers.insert(PRIVATE_TOKEN_HEADER, token_value);

    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| FisandError::RemoteUnavailable(format!("Failed to build HTTP client: {e}")))
}

/// Sends a GET and turns transport failures and non-success statuses into
/// the remote error taxonomy.
pub async fn get_checked(client: &Client, url: Url) -> Result<Response> {
    debug!("GET {}", url);
    let response = client.get(url.clone()).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        FisandError::RemoteUnavailable(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if status.is_success() {
        return Ok(response);
    }

    let body_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read response body".to_string());
    error!("HTTP error {} for URL {}: {}", status, url, body_text);
    Err(map_status(status, url.as_str(), &body_text))
}

/// Maps a non-success status to an error kind.
pub fn map_status(status: StatusCode, url: &str, body: &str) -> FisandError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FisandError::RemoteAuth(format!("Access denied ({status}) for {url}"))
        }
        StatusCode::NOT_FOUND => FisandError::RemoteNotFound(format!("{url} (404)")),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            FisandError::RemoteUnavailable(format!("HTTP error {status} for URL {url}"))
        }
        s if s.is_server_error() => {
            FisandError::RemoteUnavailable(format!("HTTP error {status} for URL {url}: {body}"))
        }
        _ => FisandError::Api(format!("HTTP error {status} for URL {url}: {body}")),
    }
}

/// Reads the next page number from a paginated response; `None` on the last page.
pub fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(NEXT_PAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
