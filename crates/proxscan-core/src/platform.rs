//! The platform wireless-scan facility.
//!
//! [`WifiPlatform`] is the port the coordinator drives. Scan results do not
//! come back through it: the platform delivers them out of band to the
//! [`ScanSink`](crate::ScanSink) it was attached to.
//!
//! Adapters:
//! - [`NmcliPlatform`] - NetworkManager via `nmcli` (feature `nmcli`)
//! - [`MockPlatform`] - scripted platform for tests and demos (feature `mock-platform`)

use std::fmt::Debug;

use crate::types::Association;

#[cfg(any(test, feature = "mock-platform"))]
mod mock;
#[cfg(feature = "nmcli")]
mod nmcli;

#[cfg(any(test, feature = "mock-platform"))]
pub use mock::MockPlatform;
#[cfg(feature = "nmcli")]
pub use nmcli::{parse_terse_fields, NmcliPlatform};

/// Port abstracting the host's Wi-Fi scan facility.
///
/// Implementations report failures by returning `false`/`None`; the
/// coordinator treats every failure as a policy outcome.
pub trait WifiPlatform: Send + Sync + Debug {
    /// Whether the Wi-Fi radio is currently enabled.
    fn radio_enabled(&self) -> bool;

    /// Ask the platform to start a scan.
    ///
    /// Returns whether the request was accepted. Completion is delivered
    /// asynchronously to the attached sink, possibly on another thread and
    /// possibly before this call returns.
    fn start_scan(&self) -> bool;

    /// The network the device is associated with right now, if any.
    fn current_association(&self) -> Option<Association>;
}
