//! Paginated record listing

use tracing::debug;

use crate::error::Result;
use crate::traits::DnsProvider;
use crate::types::ProviderRecord;

/// Records requested per page
pub const PAGE_SIZE: u64 = 20;

/// Fetch every record of `domain` matching `host_label`, across all pages.
///
/// Pages are requested one after another starting at page 1 until the
/// number of records collected reaches the provider-reported total. The
/// total is trusted; the only guard is that an empty page ends the
/// listing, since asking for the next one could never make progress.
///
/// Any page failure aborts the listing and is returned as-is; records
/// from earlier pages are discarded.
pub async fn list_all_records(
    provider: &dyn DnsProvider,
    domain: &str,
    host_label: &str,
) -> Result<Vec<ProviderRecord>> {
    let mut records = Vec::new();
    let mut page_number = 1;

    loop {
        let page = provider
            .list_records(domain, host_label, page_number, PAGE_SIZE)
            .await?;
        let fetched = page.records.len();
        records.extend(page.records);

        debug!(
            domain,
            host_label,
            page_number,
            fetched,
            collected = records.len(),
            total = page.total_count,
            "Fetched record page"
        );

        if records.len() as u64 >= page.total_count || fetched == 0 {
            break;
        }
        page_number += 1;
    }

    Ok(records)
}
