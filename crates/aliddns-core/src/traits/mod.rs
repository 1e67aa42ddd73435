//! Core traits for the aliddns system
//!
//! This module defines the abstract interfaces the engine is built on.
//!
//! - [`IpSource`]: Determine the current public IP
//! - [`DnsProvider`]: List, create and update records via a provider API

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::DnsProvider;
pub use ip_source::IpSource;
