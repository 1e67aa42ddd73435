// # DNS Provider Trait
//
// Defines the three provider calls the reconciler consumes.
//
// ## Implementations
//
// - Aliyun (Alidns): `aliddns-provider-aliyun` crate
// - Tests: `tests/common/mod.rs` fake with paging and call recording
//
// ## Usage
//
// ```rust,ignore
// use aliddns_core::DnsProvider;
//
// let page = provider.list_records("example.com", "www", 1, 20).await?;
// println!("{} of {} records", page.records.len(), page.total_count);
// ```

use async_trait::async_trait;

use crate::types::{NewRecord, RecordPage, RecordUpdate};

/// Trait for DNS provider clients
///
/// A provider is a thin client over one vendor API. It does not decide
/// whether a write is needed, does not page on its own and does not retry:
/// paging and the create-or-update decision belong to
/// [`Reconciler`](crate::reconcile::Reconciler), and the engine's next
/// tick is the retry.
///
/// Every failure must be reported as
/// [`Error::ProviderRequestFailed`](crate::Error::ProviderRequestFailed).
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch one page of records of `domain` whose host label matches `host_label`
    ///
    /// # Parameters
    ///
    /// - `domain`: Zone name (e.g. "example.com")
    /// - `host_label`: Host label filter; providers may match it loosely
    /// - `page_number`: 1-based page number
    /// - `page_size`: Records per page
    ///
    /// # Returns
    ///
    /// The page's records and the provider-reported total across all pages
    async fn list_records(
        &self,
        domain: &str,
        host_label: &str,
        page_number: u64,
        page_size: u64,
    ) -> Result<RecordPage, crate::Error>;

    /// Create a record and return the identifier the provider assigned
    async fn create_record(&self, record: &NewRecord) -> Result<String, crate::Error>;

    /// Rewrite an existing record in place
    async fn update_record(&self, update: &RecordUpdate) -> Result<(), crate::Error>;

    /// List the zones hosted by the account
    ///
    /// Used to split configured names into (zone, host label). An empty
    /// list means the provider cannot tell, and callers fall back to
    /// guessing the zone from the name itself.
    async fn list_zones(&self) -> Result<Vec<String>, crate::Error> {
        Ok(Vec::new())
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
