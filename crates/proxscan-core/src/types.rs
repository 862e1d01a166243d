//! Shared types and OpenAPI schemas.
//!
//! Network records flow through the crate in three shapes:
//! - [`RawScanResult`] as delivered by the platform scan facility
//! - [`Entry`] once the sink has resolved which record is the current association
//! - [`ProximityMessage`] when a result set is reported upstream

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One observed or associated wireless network.
///
/// Entries are compared and hashed by `bssid` only; two records for the same
/// station are the same entry even if the broadcast name differs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "attached": true,
    "BSSID": "aa:bb:cc:dd:ee:ff",
    "SSID": "home"
}))]
pub struct Entry {
    /// Whether this is the network the device is currently associated with.
    #[schema(example = true)]
    pub attached: bool,

    /// Station identifier (access point MAC address).
    #[serde(rename = "BSSID")]
    #[schema(example = "aa:bb:cc:dd:ee:ff")]
    pub bssid: String,

    /// Network name. May be empty for hidden networks or a dropped link.
    #[serde(rename = "SSID")]
    #[schema(example = "home")]
    pub ssid: String,
}

impl Entry {
    /// Create an entry.
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>, attached: bool) -> Self {
        Self {
            attached,
            bssid: bssid.into(),
            ssid: ssid.into(),
        }
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.bssid == other.bssid
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bssid.hash(state);
    }
}

/// Ordered entries produced by one scan cycle or one fallback lookup.
pub type ResultSet = Vec<Entry>;

/// A single record as reported by the platform scan facility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScanResult {
    /// Station identifier, verbatim from the platform.
    pub bssid: String,
    /// Network name, verbatim from the platform.
    pub ssid: String,
}

impl RawScanResult {
    /// Create a raw record.
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
        }
    }
}

/// The link the device is currently associated with.
///
/// Both fields may be empty when the link is in the middle of dropping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Station identifier of the associated access point.
    pub bssid: String,
    /// Name of the associated network.
    pub ssid: String,
}

impl Association {
    /// Create an association record.
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
        }
    }

    /// Synthesize the single attached entry that stands in for a scan.
    #[must_use]
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.bssid.clone(), self.ssid.clone(), true)
    }
}

/// Proximity report sent upstream to a rendezvous service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "proximity": {
        "wifiaps": [
            { "attached": true, "BSSID": "aa:bb:cc:dd:ee:ff", "SSID": "home" }
        ]
    }
}))]
pub struct ProximityMessage {
    /// Report body.
    pub proximity: ProximityReport,
}

/// Body of a [`ProximityMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProximityReport {
    /// Access points seen by the latest scan.
    pub wifiaps: Vec<Entry>,
}

impl ProximityMessage {
    /// Wrap a result set in the upstream report shape.
    #[must_use]
    pub fn from_entries(entries: &[Entry]) -> Self {
        Self {
            proximity: ProximityReport {
                wifiaps: entries.to_vec(),
            },
        }
    }
}
