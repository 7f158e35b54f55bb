// fisand-net/src/validation.rs
use fisand_common::error::{FisandError, Result};
use url::{Host, Url};

/// Validates the GitLab host URL.
///
/// The token travels in a header on every request, so `https` is required.
/// Plain `http` is accepted only for loopback hosts (local GitLab instances).
pub fn validate_host_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| FisandError::Validation(format!("Failed to parse URL '{url_str}': {e}")))?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => {
            tracing::warn!("Using plain http for local host {}", url_str);
            Ok(url)
        }
        scheme => Err(FisandError::Validation(format!(
            "Invalid URL scheme for '{url_str}': Must be https, but got '{scheme}'"
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_hosts() {
        assert!(validate_host_url("https://gitlab.com").is_ok());
        assert!(validate_host_url("https://git.example.com:8443").is_ok());
    }

    #[test]
    fn http_only_for_loopback() {
        assert!(validate_host_url("http://localhost:8080").is_ok());
        assert!(validate_host_url("http://127.0.0.1").is_ok());
        assert!(matches!(
            validate_host_url("http://gitlab.example.com"),
            Err(FisandError::Validation(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(validate_host_url("gitlab.com").is_err());
        assert!(validate_host_url("ftp://gitlab.com").is_err());
    }
}
