//! Record creation and update with the fixed TTL and routing line

use tracing::info;

use crate::error::Result;
use crate::traits::DnsProvider;
use crate::types::{AddressFamily, NewRecord, RECORD_LINE, RECORD_TTL, RecordType, RecordUpdate};

/// Map an address-family selector to the record type it publishes.
///
/// Exactly `"ipv6"` yields AAAA; every other input yields A. Total and
/// infallible.
pub fn record_type_for(selector: &str) -> RecordType {
    AddressFamily::from_selector(selector).record_type()
}

/// Create a record of `family`'s type for `host_label` in `domain`.
///
/// Returns the identifier the provider assigned.
pub async fn create_record(
    provider: &dyn DnsProvider,
    domain: &str,
    host_label: &str,
    value: &str,
    family: AddressFamily,
) -> Result<String> {
    let record = NewRecord {
        domain: domain.to_string(),
        host_label: host_label.to_string(),
        record_type: family.record_type(),
        value: value.to_string(),
        ttl: RECORD_TTL,
        line: RECORD_LINE.to_string(),
    };
    let record_id = provider.create_record(&record).await?;
    info!(
        domain,
        host_label,
        value,
        record_type = %record.record_type,
        record_id = %record_id,
        "Created record"
    );
    Ok(record_id)
}

/// Rewrite record `record_id` to hold `value`.
pub async fn update_record(
    provider: &dyn DnsProvider,
    record_id: &str,
    host_label: &str,
    value: &str,
    family: AddressFamily,
) -> Result<()> {
    let update = RecordUpdate {
        record_id: record_id.to_string(),
        host_label: host_label.to_string(),
        record_type: family.record_type(),
        value: value.to_string(),
        ttl: RECORD_TTL,
        line: RECORD_LINE.to_string(),
    };
    provider.update_record(&update).await?;
    info!(
        record_id,
        host_label,
        value,
        record_type = %update.record_type,
        "Updated record"
    );
    Ok(())
}
