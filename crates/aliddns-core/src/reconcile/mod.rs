//! Record reconciliation
//!
//! Brings one (domain, host label, address family) key in line with the
//! desired address:
//!
//! ```text
//! NoRecord ──create──▶ RecordExists(current)
//! RecordExists(stale) ──update──▶ RecordExists(current)
//! RecordExists(current) ──no-op──▶ RecordExists(current)
//! ```
//!
//! The [`lister`] pages through the provider's matches, the [`writer`]
//! issues create/update calls with the fixed TTL and line, and
//! [`Reconciler`] decides between them.

pub mod lister;
pub mod writer;

pub use lister::{PAGE_SIZE, list_all_records};
pub use writer::{create_record, record_type_for, update_record};

use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::DnsProvider;
use crate::types::{DesiredState, ReconcileOutcome};

/// Decides between create, update and no-op for a desired state
///
/// Holds a borrowed provider client; constructing one is free.
pub struct Reconciler<'a> {
    provider: &'a dyn DnsProvider,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over `provider`
    pub fn new(provider: &'a dyn DnsProvider) -> Self {
        Self { provider }
    }

    /// Reconcile one desired state
    ///
    /// 1. List every record for (domain, host label)
    /// 2. Keep exact host-label and record-type matches (the provider's
    ///    filter may be a keyword search)
    /// 3. If any match already holds the value, do nothing
    /// 4. Otherwise update the first match, or create a record if none
    ///
    /// Returns the first error encountered; a listing failure means no
    /// write is attempted.
    pub async fn reconcile(&self, desired: &DesiredState) -> Result<ReconcileOutcome> {
        let record_type = desired.record_type();
        let listed = list_all_records(self.provider, &desired.domain, &desired.host_label).await?;

        let matches: Vec<_> = listed
            .iter()
            .filter(|record| record.is_exact_match(&desired.host_label, record_type))
            .collect();

        if matches.len() > 1 {
            warn!(
                name = %desired.fqdn(),
                %record_type,
                count = matches.len(),
                "Multiple matching records; only the first is kept in sync"
            );
        }

        if let Some(current) = matches.iter().find(|record| record.holds_value(&desired.value)) {
            debug!(
                name = %desired.fqdn(),
                value = %desired.value,
                record_id = %current.id,
                "Record already up to date, skipping write"
            );
            return Ok(ReconcileOutcome::Unchanged {
                record_id: current.id.clone(),
            });
        }

        match matches.first() {
            Some(stale) => {
                update_record(
                    self.provider,
                    &stale.id,
                    &desired.host_label,
                    &desired.value,
                    desired.family,
                )
                .await?;
                Ok(ReconcileOutcome::Updated {
                    record_id: stale.id.clone(),
                    previous_value: stale.value.clone(),
                })
            }
            None => {
                let record_id = create_record(
                    self.provider,
                    &desired.domain,
                    &desired.host_label,
                    &desired.value,
                    desired.family,
                )
                .await?;
                Ok(ReconcileOutcome::Created { record_id })
            }
        }
    }

    /// Reconcile each desired state independently, in order
    ///
    /// A failure for one entry is returned in its slot and never stops the
    /// remaining entries.
    pub async fn reconcile_all(&self, desired: &[DesiredState]) -> Vec<Result<ReconcileOutcome>> {
        let mut results = Vec::with_capacity(desired.len());
        for state in desired {
            results.push(self.reconcile(state).await);
        }
        results
    }
}
