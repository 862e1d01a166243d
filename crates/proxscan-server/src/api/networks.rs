//! Nearby network endpoints.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use proxscan_core::Entry;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters shared by the scanning endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct ScanQuery {
    /// Start (or join) a platform scan and wait for its results.
    /// Without it only cached results or the current association are returned.
    #[serde(default)]
    #[param(example = true)]
    pub fresh: bool,
}

/// Nearby networks response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "networks": [
        { "attached": true, "BSSID": "aa:bb:cc:dd:ee:ff", "SSID": "home" },
        { "attached": false, "BSSID": "aa:bb:cc:dd:ee:00", "SSID": "cafe" }
    ],
    "fresh": true,
    "scanned_at_utc": "2025-01-15T03:30:00Z"
}))]
pub struct NetworksResponse {
    /// Networks found, in platform order.
    pub networks: Vec<Entry>,

    /// Whether a fresh scan was requested.
    #[schema(example = true)]
    pub fresh: bool,

    /// When the answer was produced.
    #[schema(example = "2025-01-15T03:30:00Z")]
    pub scanned_at_utc: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List nearby Wi-Fi networks.
#[utoipa::path(
    get,
    path = "/api/networks",
    tag = "networks",
    operation_id = "listNetworks",
    summary = "List nearby Wi-Fi networks",
    description = "Returns the networks seen by the platform. With `fresh=true` a scan \
        is started (or an in-flight one joined) and the call waits for it, bounded by \
        the configured timeout. Results are handed out once: a second call without \
        `fresh` returns only the current association.",
    params(ScanQuery),
    responses(
        (status = 200, description = "Networks listed", body = NetworksResponse)
    )
)]
pub async fn list_networks(
    State(state): State<SharedState>,
    Query(query): Query<ScanQuery>,
) -> Json<NetworksResponse> {
    let networks = state.coordinator.scan(query.fresh).await;
    tracing::debug!(count = networks.len(), fresh = query.fresh, "Networks listed");

    Json(NetworksResponse {
        networks,
        fresh: query.fresh,
        scanned_at_utc: Utc::now().to_rfc3339(),
    })
}
