//! Application state shared across handlers.

use std::sync::Arc;

use proxscan_core::{Config, PlatformBackend, ProximityTracker, ScanCoordinator, WifiPlatform};
use thiserror::Error;
use tokio::sync::Mutex;

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Errors raised while assembling the application state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The configured backend was not compiled into this binary.
    #[error("platform backend '{backend}' is not available; rebuild with the `{feature}` feature")]
    BackendUnavailable {
        /// Backend named in the configuration.
        backend: &'static str,
        /// Cargo feature that provides it.
        feature: &'static str,
    },
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// The one coordinator every request goes through.
    pub coordinator: ScanCoordinator,
    /// Proximity report bookkeeping.
    pub tracker: Mutex<ProximityTracker>,
}

impl AppState {
    /// Build state for the backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if that backend is not compiled in.
    pub fn new(config: Config) -> Result<Self, StateError> {
        let coordinator = match config.platform.backend {
            PlatformBackend::Nmcli => nmcli_coordinator(&config)?,
            PlatformBackend::Mock => mock_coordinator(&config)?,
        };
        Ok(Self::from_parts(config, coordinator))
    }

    /// Build state around an already wired coordinator.
    #[must_use]
    pub fn from_parts(config: Config, coordinator: ScanCoordinator) -> Self {
        Self {
            config,
            coordinator,
            tracker: Mutex::new(ProximityTracker::new()),
        }
    }

    /// Wrap into the handle handlers receive.
    #[must_use]
    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}

#[cfg(feature = "nmcli")]
#[allow(clippy::unnecessary_wraps)]
fn nmcli_coordinator(config: &Config) -> Result<ScanCoordinator, StateError> {
    let platform = Arc::new(proxscan_core::NmcliPlatform::new(&config.platform));
    let coordinator =
        ScanCoordinator::new(Arc::clone(&platform) as Arc<dyn WifiPlatform>, &config.scan);
    platform.attach(coordinator.sink());
    Ok(coordinator)
}

#[cfg(not(feature = "nmcli"))]
fn nmcli_coordinator(_config: &Config) -> Result<ScanCoordinator, StateError> {
    Err(StateError::BackendUnavailable {
        backend: "nmcli",
        feature: "nmcli",
    })
}

#[cfg(feature = "mock-platform")]
#[allow(clippy::unnecessary_wraps)]
fn mock_coordinator(config: &Config) -> Result<ScanCoordinator, StateError> {
    use proxscan_core::{Association, MockPlatform, RawScanResult};

    let platform = Arc::new(MockPlatform::new());
    platform.set_association(Some(Association::new("02:00:00:00:00:01", "proxscan-home")));
    platform.deliver_on_scan(
        vec![
            RawScanResult::new("02:00:00:00:00:01", "proxscan-home"),
            RawScanResult::new("02:00:00:00:00:02", "proxscan-cafe"),
            RawScanResult::new("02:00:00:00:00:03", ""),
        ],
        config.platform.settle(),
    );
    let coordinator =
        ScanCoordinator::new(Arc::clone(&platform) as Arc<dyn WifiPlatform>, &config.scan);
    platform.attach(coordinator.sink());
    Ok(coordinator)
}

#[cfg(not(feature = "mock-platform"))]
fn mock_coordinator(_config: &Config) -> Result<ScanCoordinator, StateError> {
    Err(StateError::BackendUnavailable {
        backend: "mock",
        feature: "mock-platform",
    })
}
