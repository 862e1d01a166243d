//! Error types for the proxscan platform adapters.
//!
//! Scanning itself never fails: the coordinator turns every platform problem
//! into an empty or best-effort result. These errors exist inside adapters,
//! before they are degraded at the [`WifiPlatform`](crate::WifiPlatform)
//! boundary and logged. Configuration has its own
//! [`ConfigError`](crate::ConfigError).
//!
//! # Example
//!
//! ```rust
//! use proxscan_core::error::ProxscanError;
//!
//! let err = ProxscanError::PlatformCommand {
//!     command: "nmcli device wifi rescan".into(),
//!     reason: "exited with 1".into(),
//! };
//! assert!(err.is_recoverable());
//! assert_eq!(err.error_code(), "PLATFORM_COMMAND_FAILED");
//! ```

use thiserror::Error;

/// Errors raised while talking to the Wi-Fi platform.
#[derive(Debug, Error)]
pub enum ProxscanError {
    /// The platform tooling could not be invoked at all.
    #[error("Wi-Fi platform unavailable: {0}. Ensure NetworkManager is installed and running.")]
    PlatformUnavailable(String),

    /// A platform command ran but reported failure.
    #[error("Platform command `{command}` failed: {reason}")]
    PlatformCommand {
        /// The command line that was run.
        command: String,
        /// Exit status and diagnostics.
        reason: String,
    },
}

/// A specialized [`Result`] type for platform operations.
pub type Result<T> = std::result::Result<T, ProxscanError>;

impl ProxscanError {
    /// Returns `true` if the tooling ran and retrying later may succeed,
    /// e.g. NetworkManager refusing a rescan while one is running.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::PlatformCommand { .. })
    }

    /// Returns a machine-readable error code.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PlatformUnavailable(_) => "PLATFORM_UNAVAILABLE",
            Self::PlatformCommand { .. } => "PLATFORM_COMMAND_FAILED",
        }
    }
}
