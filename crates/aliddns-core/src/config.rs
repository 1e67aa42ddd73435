//! Configuration for the aliddns system
//!
//! The configuration is an INI file with three required sections:
//!
//! ```ini
//! [aliyun]
//! accessKeyId = LTAI...
//! accessKeySecret = ...
//! domainEndpoint = domain.aliyuncs.com
//! dnsEndpoint = alidns.cn-hangzhou.aliyuncs.com
//!
//! [domain]
//! domainList = home.example.com,nas.example.com
//! dnsType = ipv4
//!
//! [time]
//! durationMinute = 10
//! ```
//!
//! A value may carry a trailing comment after whitespace (`10 # minutes`).
//! It is loaded once at startup and never reloaded.

use crate::error::{Error, Result};
use crate::types::AddressFamily;
use ini::{Ini, ParseOption, Properties};
use std::fmt;
use std::path::Path;
use std::time::Duration;

const SECTION_ALIYUN: &str = "aliyun";
const SECTION_DOMAIN: &str = "domain";
const SECTION_TIME: &str = "time";

/// Access key pair used to sign provider requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key ID
    pub access_key_id: String,
    /// Access key secret
    /// ⚠️ NEVER log this value
    pub access_key_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}

/// Main aliddns configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Provider credentials
    pub credentials: Credentials,

    /// Domain service endpoint (`aliyun.domainEndpoint`)
    pub domain_endpoint: String,

    /// DNS service endpoint the provider client talks to (`aliyun.dnsEndpoint`)
    pub dns_endpoint: String,

    /// Domain entries to keep in sync, in file order
    pub domains: Vec<String>,

    /// Raw `domain.dnsType` selector as written in the file
    pub dns_type: String,

    /// Address family derived from `dns_type`
    pub address_family: AddressFamily,

    /// Time between reconciliation passes
    pub poll_interval: Duration,
}

impl SyncConfig {
    /// Load the configuration from an INI file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file_opt(path, parse_option())
            .map_err(|e| Error::ConfigRead(format!("{}: {}", path.display(), e)))?;
        Self::from_ini(&ini)
    }

    /// Parse the configuration from INI text
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str_opt(text, parse_option())?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self> {
        let aliyun = section(ini, SECTION_ALIYUN)?;
        let credentials = Credentials {
            access_key_id: key(aliyun, SECTION_ALIYUN, "accessKeyId")?,
            access_key_secret: key(aliyun, SECTION_ALIYUN, "accessKeySecret")?,
        };
        let domain_endpoint = key(aliyun, SECTION_ALIYUN, "domainEndpoint")?;
        let dns_endpoint = key(aliyun, SECTION_ALIYUN, "dnsEndpoint")?;

        let domain = section(ini, SECTION_DOMAIN)?;
        let domains = split_domain_list(&key(domain, SECTION_DOMAIN, "domainList")?);
        let dns_type = key(domain, SECTION_DOMAIN, "dnsType")?;
        let address_family = AddressFamily::from_selector(&dns_type);

        let time = section(ini, SECTION_TIME)?;
        let minutes = key(time, SECTION_TIME, "durationMinute")?;
        let poll_interval = parse_minutes(&minutes)?;

        Ok(Self {
            credentials,
            domain_endpoint,
            dns_endpoint,
            domains,
            dns_type,
            address_family,
            poll_interval,
        })
    }

    /// Whether `dns_type` is one of the two documented selectors.
    ///
    /// Anything else still loads (and means IPv4); callers may warn.
    pub fn dns_type_is_recognized(&self) -> bool {
        matches!(self.dns_type.as_str(), "ipv4" | "ipv6")
    }
}

fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn section<'a>(ini: &'a Ini, name: &str) -> Result<&'a Properties> {
    ini.section(Some(name))
        .ok_or_else(|| Error::section_missing(name))
}

fn key(props: &Properties, section: &str, name: &str) -> Result<String> {
    props
        .get(name)
        .map(|value| strip_inline_comment(value).to_string())
        .ok_or_else(|| Error::key_missing(section, name))
}

/// Cut a trailing `;` or `#` comment from a value.
///
/// The marker only starts a comment at the beginning of the value or
/// after whitespace, so `a#b` is kept whole.
fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    let start = bytes.iter().enumerate().position(|(i, &b)| {
        (b == b';' || b == b'#') && (i == 0 || bytes[i - 1].is_ascii_whitespace())
    });
    match start {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    }
}

/// Split a comma-separated domain list.
///
/// Entries are kept verbatim: surrounding whitespace and empty entries
/// survive and surface later as provider errors.
pub fn split_domain_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn parse_minutes(raw: &str) -> Result<Duration> {
    let minutes: u64 = raw.parse().map_err(|e| {
        Error::value_invalid(
            SECTION_TIME,
            "durationMinute",
            raw,
            format!("expected a whole number of minutes ({e})"),
        )
    })?;
    if minutes == 0 {
        return Err(Error::value_invalid(
            SECTION_TIME,
            "durationMinute",
            raw,
            "must be greater than zero",
        ));
    }
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::value_invalid(SECTION_TIME, "durationMinute", raw, "too large"))
}
