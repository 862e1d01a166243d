//! # proxscan-core
//!
//! Core logic for answering "which wireless networks are nearby?" on top of a
//! platform that scans asynchronously.
//!
//! This crate provides:
//! - A scan coordinator that waits, bounded, for one-shot platform deliveries
//! - The sink platforms deliver scan completions to
//! - Platform adapters (NetworkManager, plus a scripted mock)
//! - Proximity report composition and change detection
//! - Configuration management
//!
//! ## Architecture
//!
//! - [`coordinator`] - Scan cycle state machine, deduplication and bounded waiting
//! - [`sink`] - Translation of platform deliveries into coordinator state
//! - [`platform`] - The [`WifiPlatform`] port and its adapters
//! - [`tracker`] - Upstream proximity reports
//! - [`config`] - Configuration loading, saving, and validation
//! - [`error`] - Platform adapter errors
//! - [`types`] - Shared types and OpenAPI schemas
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use proxscan_core::{Config, NmcliPlatform, ScanCoordinator, WifiPlatform};
//!
//! let config = Config::load_or_default(Config::default_path())?;
//! let platform = Arc::new(NmcliPlatform::new(&config.platform));
//! let coordinator = ScanCoordinator::new(platform.clone() as Arc<dyn WifiPlatform>, &config.scan);
//! platform.attach(coordinator.sink());
//!
//! let nearby = coordinator.scan(true).await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod platform;
pub mod sink;
pub mod tracker;
pub mod types;

// Re-export primary types for convenience
pub use config::{
    Config, ConfigError, ConfigResult, PlatformBackend, PlatformConfig, ScanConfig, ServerConfig,
};
pub use coordinator::ScanCoordinator;
pub use error::{ProxscanError, Result};
#[cfg(any(test, feature = "mock-platform"))]
pub use platform::MockPlatform;
#[cfg(feature = "nmcli")]
pub use platform::NmcliPlatform;
pub use platform::WifiPlatform;
pub use sink::ScanSink;
pub use tracker::ProximityTracker;
pub use types::{Association, Entry, ProximityMessage, ProximityReport, RawScanResult, ResultSet};
