// Public IP lookup over HTTP.
//
// Asks a plain-text echo service for the address the outside world sees
// and validates the answer before handing it back.

use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::Error;

/// Default lookup endpoint. Answers with the caller's address as plain text.
pub const DEFAULT_ENDPOINT: &str = "https://api.my-ip.io/ip";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the public IP echo service.
#[derive(Debug, Clone)]
pub struct PublicIpClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl PublicIpClient {
    /// Create a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
        let endpoint = Url::parse(endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("routerctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// Client for [`DEFAULT_ENDPOINT`] with [`DEFAULT_TIMEOUT`].
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(endpoint: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch and validate the public address.
    pub async fn fetch(&self) -> Result<IpAddr, Error> {
        let body = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let ip = parse_ip_response(&body)?;
        debug!(%ip, "public address resolved");
        Ok(ip)
    }
}

fn parse_ip_response(body: &str) -> Result<IpAddr, Error> {
    let text = body.trim();
    if text.is_empty() {
        return Err(Error::InvalidIpResponse {
            reason: "empty response".into(),
        });
    }
    text.parse().map_err(|_| Error::InvalidIpResponse {
        reason: format!("unexpected value \"{text}\""),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let ip = parse_ip_response("203.0.113.7\n").unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn parse_rejects_blank_and_garbage() {
        assert!(matches!(
            parse_ip_response("   "),
            Err(Error::InvalidIpResponse { .. })
        ));
        assert!(matches!(
            parse_ip_response("<html>"),
            Err(Error::InvalidIpResponse { .. })
        ));
    }
}
