//! Domain types shared by the reconciler, the providers and the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// TTL applied to every record the writer creates or updates
pub const RECORD_TTL: u32 = 600;

/// Routing line applied to every record the writer creates or updates
pub const RECORD_LINE: &str = "default";

/// Host label used for the zone apex
pub const APEX_HOST_LABEL: &str = "@";

/// Address family selected by the `dnsType` configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4 (A records)
    Ipv4,
    /// IPv6 (AAAA records)
    Ipv6,
}

impl AddressFamily {
    /// Map a free-form selector to an address family.
    ///
    /// Only the exact string `"ipv6"` selects IPv6. Everything else,
    /// including `"IPv6"`, `" ipv6"` and typos, selects IPv4.
    pub fn from_selector(selector: &str) -> Self {
        if selector == "ipv6" {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }

    /// The DNS record type that carries addresses of this family
    pub fn record_type(self) -> RecordType {
        match self {
            AddressFamily::Ipv4 => RecordType::A,
            AddressFamily::Ipv6 => RecordType::Aaaa,
        }
    }

    /// Whether `ip` belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::Ipv4 => ip.is_ipv4(),
            AddressFamily::Ipv6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => f.write_str("ipv4"),
            AddressFamily::Ipv6 => f.write_str("ipv6"),
        }
    }
}

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as the DNS provider reports it
///
/// `record_type` is kept as the provider's raw string: listings can
/// contain CNAME, TXT and other types that share the host label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    /// Provider-assigned identifier
    pub id: String,
    /// Host label ("RR")
    pub host_label: String,
    /// Record type as reported by the provider
    pub record_type: String,
    /// Record value
    pub value: String,
}

impl ProviderRecord {
    /// Whether this record is the `record_type` record for `host_label`
    pub fn is_exact_match(&self, host_label: &str, record_type: RecordType) -> bool {
        self.host_label == host_label && self.record_type.eq_ignore_ascii_case(record_type.as_str())
    }

    /// Whether the record already holds `value`.
    ///
    /// Both sides are compared as IP addresses when they parse, so
    /// `2001:db8::1` and `2001:0db8:0:0:0:0:0:1` are the same value.
    pub fn holds_value(&self, value: &str) -> bool {
        match (self.value.parse::<IpAddr>(), value.parse::<IpAddr>()) {
            (Ok(current), Ok(desired)) => current == desired,
            _ => self.value == value,
        }
    }
}

/// One page of a record listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    /// Records on this page
    pub records: Vec<ProviderRecord>,
    /// Total number of matching records the provider reports across all pages
    pub total_count: u64,
}

/// Parameters for creating a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub domain: String,
    pub host_label: String,
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    pub line: String,
}

/// Parameters for updating a record in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub record_id: String,
    pub host_label: String,
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    pub line: String,
}

/// The record a reconciliation pass should leave behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    /// Zone name (e.g. "example.com")
    pub domain: String,
    /// Host label within the zone (e.g. "www" or "@")
    pub host_label: String,
    /// Address family to publish
    pub family: AddressFamily,
    /// Address to publish
    pub value: String,
}

impl DesiredState {
    /// Create a desired state from its parts
    pub fn new(
        domain: impl Into<String>,
        host_label: impl Into<String>,
        family: AddressFamily,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            host_label: host_label.into(),
            family,
            value: value.into(),
        }
    }

    /// Build a desired state from a configured domain entry, guessing the zone.
    ///
    /// See [`split_entry`]; with no known zones the zone is guessed from
    /// the name alone.
    pub fn from_entry(entry: &str, family: AddressFamily, value: impl Into<String>) -> Self {
        Self::from_entry_in_zones(entry, &[], family, value)
    }

    /// Build a desired state from a configured domain entry and the zones
    /// the provider hosts.
    pub fn from_entry_in_zones(
        entry: &str,
        zones: &[String],
        family: AddressFamily,
        value: impl Into<String>,
    ) -> Self {
        let (host_label, domain) = split_entry(entry, zones);
        Self::new(domain, host_label, family, value)
    }

    /// The record type this state publishes
    pub fn record_type(&self) -> RecordType {
        self.family.record_type()
    }

    /// Fully qualified name, for logging
    pub fn fqdn(&self) -> String {
        if self.host_label == APEX_HOST_LABEL {
            self.domain.clone()
        } else {
            format!("{}.{}", self.host_label, self.domain)
        }
    }
}

/// Second-level labels that registries under country-code TLDs sell
/// names beneath (`example.com.cn`, `example.co.uk`)
const SHARED_SECOND_LEVEL_LABELS: &[&str] = &["ac", "co", "com", "edu", "gov", "net", "org"];

/// Split a configured name into (host label, zone).
///
/// A single trailing dot is ignored. When `zones` is non-empty the longest
/// zone the name falls under wins, compared case-insensitively on label
/// boundaries. Otherwise the zone is the last two labels, or the last
/// three when they look like `example.com.cn`. A name that is itself the
/// zone maps to the apex label `@`. Nothing else is trimmed or validated.
pub fn split_entry<'a>(entry: &'a str, zones: &[String]) -> (&'a str, &'a str) {
    let name = entry.strip_suffix('.').unwrap_or(entry);

    let hosted = zones
        .iter()
        .map(|zone| zone.strip_suffix('.').unwrap_or(zone.as_str()))
        .filter(|zone| !zone.is_empty() && is_within_zone(name, zone))
        .map(str::len)
        .max();
    if let Some(zone_len) = hosted {
        return split_at(name, name.len() - zone_len);
    }

    let mut dots = name.rmatch_indices('.');
    match dots.nth(guessed_zone_labels(name) - 1) {
        Some((idx, _)) => (&name[..idx], &name[idx + 1..]),
        None => (APEX_HOST_LABEL, name),
    }
}

fn is_within_zone(name: &str, zone: &str) -> bool {
    if name.eq_ignore_ascii_case(zone) {
        return true;
    }
    let Some(start) = name.len().checked_sub(zone.len()) else {
        return false;
    };
    start > 0
        && name.as_bytes()[start - 1] == b'.'
        && name.get(start..).is_some_and(|tail| tail.eq_ignore_ascii_case(zone))
}

/// Split `name` where its zone starts (byte offset `zone_start`)
fn split_at(name: &str, zone_start: usize) -> (&str, &str) {
    if zone_start == 0 {
        (APEX_HOST_LABEL, name)
    } else {
        (&name[..zone_start - 1], &name[zone_start..])
    }
}

fn guessed_zone_labels(name: &str) -> usize {
    let mut labels = name.rsplit('.');
    let tld = labels.next().unwrap_or_default();
    let second = labels.next().unwrap_or_default();
    let has_host = labels.next().is_some();
    if has_host
        && tld.len() == 2
        && SHARED_SECOND_LEVEL_LABELS
            .iter()
            .any(|label| second.eq_ignore_ascii_case(label))
    {
        3
    } else {
        2
    }
}

/// What a reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No matching record existed; one was created
    Created {
        /// Identifier of the new record
        record_id: String,
    },
    /// A matching record held a stale value and was rewritten
    Updated {
        /// Identifier of the rewritten record
        record_id: String,
        /// The value it held before
        previous_value: String,
    },
    /// A matching record already held the desired value; nothing was written
    Unchanged {
        /// Identifier of the matching record
        record_id: String,
    },
}

impl ReconcileOutcome {
    /// Identifier of the record the outcome refers to
    pub fn record_id(&self) -> &str {
        match self {
            ReconcileOutcome::Created { record_id }
            | ReconcileOutcome::Updated { record_id, .. }
            | ReconcileOutcome::Unchanged { record_id } => record_id,
        }
    }

    /// Whether a provider write was issued
    pub fn wrote(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged { .. })
    }
}
