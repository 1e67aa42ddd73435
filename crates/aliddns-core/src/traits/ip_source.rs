// # IP Source Trait
//
// Defines the interface for determining the host's current public IP.
//
// ## Implementations
//
// - HTTP lookup services: `aliddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use aliddns_core::IpSource;
//
// let ip = source.current().await?;
// println!("publishing {ip}");
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::types::AddressFamily;

/// Trait for IP source implementations
///
/// The engine calls [`IpSource::current`] once per pass. Implementations
/// must answer from a fresh lookup every time: a cached address would hide
/// exactly the change the daemon exists to notice.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error::IpSource)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the address family this source reports
    ///
    /// Returns `None` if the source may answer with either family.
    fn family(&self) -> Option<AddressFamily> {
        None
    }
}
