// # aliddns-core
//
// Core library for the aliddns record synchronizer.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping DNS records
// pointed at a dynamic public IP:
// - **SyncConfig**: INI configuration loaded once at startup
// - **IpSource**: Trait for determining the current public IP
// - **DnsProvider**: Trait for listing, creating and updating records
// - **Reconciler**: Create-or-update-or-skip decision for one record key
// - **SyncEngine**: Timer-driven passes over every configured domain
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider and IP-source clients
// 2. **Injected Clients**: Providers are constructed by the caller and passed in
// 3. **Idempotency**: A record that already holds the address is never rewritten
// 4. **Isolation**: One domain's failure never aborts the others
// 5. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use config::{Credentials, SyncConfig};
pub use engine::{EngineEvent, PassReport, SyncEngine};
pub use error::{Error, Result};
pub use reconcile::Reconciler;
pub use traits::{DnsProvider, IpSource};
pub use types::{
    AddressFamily, DesiredState, NewRecord, ProviderRecord, ReconcileOutcome, RecordPage,
    RecordType, RecordUpdate,
};
