//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Asking the IpSource for the current public IP once per pass
//! - Reconciling every configured domain entry against the DnsProvider
//! - Keeping one entry's failure from affecting the others
//! - Repeating on the configured poll interval until shutdown
//!
//! ## Pass Flow
//!
//! ```text
//! ┌─────────────┐   current()   ┌──────────────┐   reconcile()   ┌─────────────┐
//! │  IpSource   │──────────────▶│  SyncEngine  │────────────────▶│ DnsProvider │
//! └─────────────┘               └──────────────┘  (per entry)    └─────────────┘
//!                                      │
//!                                      ▼
//!                               ┌─────────────┐
//!                               │   Events    │
//!                               │  (notify)   │
//!                               └─────────────┘
//! ```
//!
//! 1. Timer tick (the first fires immediately)
//! 2. Fetch the current IP; on failure skip the pass
//! 3. Ask the provider for its hosted zones, then build a DesiredState per
//!    domain entry
//! 4. Reconcile each entry, recording its outcome or error
//! 5. Emit events for monitoring/logging

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::reconcile::Reconciler;
use crate::traits::{DnsProvider, IpSource};
use crate::types::{AddressFamily, DesiredState, ReconcileOutcome};
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { entries: usize },

    /// A pass began with this address
    PassStarted { ip: IpAddr },

    /// A record was created
    RecordCreated { name: String, record_id: String },

    /// A stale record was rewritten
    RecordUpdated {
        name: String,
        record_id: String,
        previous_value: String,
    },

    /// A record already held the address
    RecordUnchanged { name: String, record_id: String },

    /// Reconciling one entry failed
    ReconcileFailed { name: String, error: String },

    /// A whole pass failed before any entry was reconciled
    PassFailed { error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Result of reconciling one domain entry
#[derive(Debug)]
pub struct EntryReport {
    /// The entry as written in the configuration
    pub entry: String,
    /// What reconciling it did, or why it failed
    pub result: Result<ReconcileOutcome>,
}

/// Result of one pass
#[derive(Debug)]
pub struct PassReport {
    /// Address published during the pass
    pub ip: IpAddr,
    /// One report per configured entry, in configuration order
    pub entries: Vec<EntryReport>,
}

impl PassReport {
    /// Number of entries that failed
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_err()).count()
    }

    /// Number of provider writes issued
    pub fn writes(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.result, Ok(outcome) if outcome.wrote()))
            .count()
    }
}

/// What became of an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Queued,
    /// The observer is behind; the event was dropped
    Full,
    /// Nobody is listening any more
    Closed,
}

/// Core sync engine
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Start with [`SyncEngine::run()`]
/// 3. Engine runs a pass immediately and then once per poll interval
/// 4. Engine stops on ctrl-c; a pass in progress finishes first
///
/// ## Threading
///
/// Passes run on the caller's task. Entries are reconciled one after
/// another and share no mutable state.
pub struct SyncEngine {
    /// IP source for the address to publish
    ip_source: Box<dyn IpSource>,

    /// DNS provider client
    provider: Box<dyn DnsProvider>,

    /// Domain entries to manage
    domains: Vec<String>,

    /// Address family to publish
    family: AddressFamily,

    /// Time between passes
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        if config.poll_interval.is_zero() {
            return Err(Error::invalid_input("poll interval must be greater than zero"));
        }
        if let Some(source_family) = ip_source.family()
            && source_family != config.address_family
        {
            return Err(Error::invalid_input(format!(
                "IP source reports {source_family} addresses but {} is configured",
                config.address_family
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            ip_source,
            provider,
            domains: config.domains.clone(),
            family: config.address_family,
            poll_interval: config.poll_interval,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until ctrl-c
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine until `shutdown_rx` fires (or ctrl-c when `None`)
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            entries: self.domains.len(),
        });
        info!(
            entries = self.domains.len(),
            family = %self.family,
            interval_secs = self.poll_interval.as_secs(),
            "Sync engine started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = async {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for ctrl-c: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!("Sync pass failed: {}", e);
                        // Continue running; the next tick is the retry
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        info!("Sync engine stopped");
        Ok(())
    }

    /// Run a single pass
    ///
    /// Fails only when the current IP cannot be determined; per-entry
    /// failures are reported inside the returned [`PassReport`].
    pub async fn run_once(&self) -> Result<PassReport> {
        let ip = match self.current_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                self.emit_event(EngineEvent::PassFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        self.emit_event(EngineEvent::PassStarted { ip });
        debug!(%ip, "Starting sync pass");

        let value = ip.to_string();
        let zones = self.hosted_zones().await;
        let reconciler = Reconciler::new(self.provider.as_ref());
        let mut entries = Vec::with_capacity(self.domains.len());

        for entry in &self.domains {
            let desired =
                DesiredState::from_entry_in_zones(entry, &zones, self.family, value.as_str());
            let name = desired.fqdn();
            let result = reconciler.reconcile(&desired).await;

            match &result {
                Ok(ReconcileOutcome::Created { record_id }) => {
                    self.emit_event(EngineEvent::RecordCreated {
                        name,
                        record_id: record_id.clone(),
                    });
                }
                Ok(ReconcileOutcome::Updated {
                    record_id,
                    previous_value,
                }) => {
                    info!("Updated {} -> {} (previous: {})", name, ip, previous_value);
                    self.emit_event(EngineEvent::RecordUpdated {
                        name,
                        record_id: record_id.clone(),
                        previous_value: previous_value.clone(),
                    });
                }
                Ok(ReconcileOutcome::Unchanged { record_id }) => {
                    self.emit_event(EngineEvent::RecordUnchanged {
                        name,
                        record_id: record_id.clone(),
                    });
                }
                Err(e) => {
                    error!("Failed to reconcile {}: {}", name, e);
                    self.emit_event(EngineEvent::ReconcileFailed {
                        name,
                        error: e.to_string(),
                    });
                    // Continue with other entries
                }
            }

            entries.push(EntryReport {
                entry: entry.clone(),
                result,
            });
        }

        let report = PassReport { ip, entries };
        info!(
            %ip,
            entries = report.entries.len(),
            writes = report.writes(),
            failures = report.failures(),
            "Sync pass finished"
        );
        Ok(report)
    }

    async fn current_ip(&self) -> Result<IpAddr> {
        let ip = self.ip_source.current().await?;
        if !self.family.matches(&ip) {
            return Err(Error::ip_source(format!(
                "expected an {} address, got {}",
                self.family, ip
            )));
        }
        Ok(ip)
    }

    /// Zones the provider hosts, or none when it cannot list them
    ///
    /// Without zones, entries fall back to a zone guessed from the name.
    async fn hosted_zones(&self) -> Vec<String> {
        match self.provider.list_zones().await {
            Ok(zones) => {
                debug!(count = zones.len(), "Hosted zones listed");
                zones
            }
            Err(e) => {
                warn!("Failed to list hosted zones, guessing zones from names: {}", e);
                Vec::new()
            }
        }
    }

    fn emit_event(&self, event: EngineEvent) -> Delivery {
        // never block a pass on the observer
        match self.event_tx.try_send(event) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
                Delivery::Full
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, discarding event");
                Delivery::Closed
            }
        }
    }
}
