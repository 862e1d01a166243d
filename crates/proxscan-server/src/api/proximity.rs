//! Proximity report endpoints.
//!
//! A client relaying reports to a rendezvous service fetches a report, sends
//! it, then acknowledges it so the next report can say whether anything changed.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use proxscan_core::ProximityMessage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ApiResult};
use crate::api::networks::ScanQuery;
use crate::state::SharedState;

/// Creates the proximity router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(get_proximity))
        .route("/ack", post(acknowledge))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Proximity report response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "message": {
        "proximity": {
            "wifiaps": [
                { "attached": true, "BSSID": "aa:bb:cc:dd:ee:ff", "SSID": "home" }
            ]
        }
    },
    "changed": true
}))]
pub struct ProximityResponse {
    /// The report, or `null` when the scan found nothing to report.
    #[schema(nullable)]
    pub message: Option<ProximityMessage>,

    /// Whether the reported BSSIDs differ from the last acknowledged report.
    #[schema(example = true)]
    pub changed: bool,
}

/// Acknowledgement response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "acknowledged": true }))]
pub struct AckResponse {
    /// Always true on success.
    #[schema(example = true)]
    pub acknowledged: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Compose a proximity report.
#[utoipa::path(
    get,
    path = "/api/proximity",
    tag = "proximity",
    operation_id = "getProximity",
    summary = "Compose a proximity report",
    description = "Scans (fresh if requested) and wraps the result in the report sent \
        to a rendezvous service. `changed` tells whether the set of access points \
        differs from the last acknowledged report.",
    params(ScanQuery),
    responses(
        (status = 200, description = "Report composed", body = ProximityResponse)
    )
)]
pub async fn get_proximity(
    State(state): State<SharedState>,
    Query(query): Query<ScanQuery>,
) -> Json<ProximityResponse> {
    let entries = state.coordinator.scan(query.fresh).await;

    let mut tracker = state.tracker.lock().await;
    let changed = tracker.has_changed(&entries);
    let message = tracker.compose(&entries);

    Json(ProximityResponse { message, changed })
}

/// Acknowledge the last composed report.
#[utoipa::path(
    post,
    path = "/api/proximity/ack",
    tag = "proximity",
    operation_id = "acknowledgeProximity",
    summary = "Acknowledge the last report",
    description = "Marks the most recently composed report as delivered upstream.",
    responses(
        (status = 200, description = "Report acknowledged", body = AckResponse),
        (status = 409, description = "No report to acknowledge", body = crate::api::error::ErrorResponse)
    )
)]
pub async fn acknowledge(State(state): State<SharedState>) -> ApiResult<Json<AckResponse>> {
    if state.tracker.lock().await.acknowledge() {
        Ok(Json(AckResponse { acknowledged: true }))
    } else {
        Err(ApiError::Conflict {
            error_code: "nothing_to_acknowledge".to_string(),
            message: "No proximity report has been composed since the last acknowledgement"
                .to_string(),
        })
    }
}
