// # HTTP IP Source
//
// This crate provides the HTTP-based public IP lookup for aliddns.
//
// ## Behavior
//
// `current()` asks each configured lookup URL in order and returns the
// first answer that parses as an address of the wanted family. A URL that
// times out, answers with a non-2xx status, or returns something that is
// not an address of that family is skipped. Only when every URL fails does
// the lookup fail.
//
// Nothing is cached: every pass reads the address fresh, so a changed IP
// is noticed on the next tick.

use aliddns_core::{AddressFamily, Error, IpSource, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Timeout for a single lookup request
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default IPv4 lookup services, tried in order
pub const DEFAULT_IPV4_URLS: &[&str] = &[
    "https://api.ipify.org",  // returns plain text IP
    "https://ifconfig.me/ip", // No rate limit documented
    "https://icanhazip.com",  // No rate limit documented
];

/// Default IPv6 lookup services, tried in order
pub const DEFAULT_IPV6_URLS: &[&str] = &["https://api6.ipify.org", "https://ipv6.icanhazip.com"];

/// Default lookup URLs for `family`
pub fn default_urls(family: AddressFamily) -> Vec<String> {
    let urls = match family {
        AddressFamily::Ipv4 => DEFAULT_IPV4_URLS,
        AddressFamily::Ipv6 => DEFAULT_IPV6_URLS,
    };
    urls.iter().map(|u| u.to_string()).collect()
}

/// HTTP-based public IP source with ordered failover
#[derive(Debug)]
pub struct HttpIpSource {
    /// Lookup URLs, tried in order
    urls: Vec<String>,

    /// Address family to accept
    family: AddressFamily,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `urls`: lookup URLs answering with the caller's address as plain text
    /// - `family`: address family to accept; answers of the other family are skipped
    ///
    /// # Returns
    ///
    /// - `Err(Error::InvalidInput)` if `urls` is empty
    pub fn new(urls: Vec<String>, family: AddressFamily) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::invalid_input("at least one IP lookup URL is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| Error::ip_source(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            urls,
            family,
            client,
        })
    }

    /// Create a source using the default services for `family`
    pub fn with_defaults(family: AddressFamily) -> Result<Self> {
        Self::new(default_urls(family), family)
    }

    /// Lookup URLs in the order they are tried
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Fetch the address from one URL
    async fn fetch_ip(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("{url}: request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{url}: HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("{url}: failed to read response: {e}")))?;

        parse_ip_response(&body, self.family)
            .map_err(|e| Error::ip_source(format!("{url}: {e}")))
    }
}

/// Parse a plain-text lookup answer, accepting only addresses of `family`
pub fn parse_ip_response(body: &str, family: AddressFamily) -> Result<IpAddr> {
    let text = body.trim();
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: {text:?}")))?;

    if !family.matches(&ip) {
        return Err(Error::ip_source(format!("Expected {family} address, got: {ip}")));
    }
    Ok(ip)
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let mut last_error = None;

        for url in &self.urls {
            match self.fetch_ip(url).await {
                Ok(ip) => {
                    tracing::debug!(%ip, url = url.as_str(), "Public IP resolved");
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("IP lookup failed, trying next service: {}", e);
                    last_error = Some(e);
                }
            }
        }

        let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(Error::ip_source(format!(
            "all {} lookup services failed (last: {detail})",
            self.urls.len()
        )))
    }

    fn family(&self) -> Option<AddressFamily> {
        Some(self.family)
    }
}
