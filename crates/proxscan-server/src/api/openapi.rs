//! OpenAPI specification generation for the proxscan API.
//!
//! Descriptions are written to be understood by both human developers and
//! generated clients.

use axum::Json;
use proxscan_core::{Entry, ProximityMessage, ProximityReport};
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::networks::NetworksResponse;
use super::proximity::{AckResponse, ProximityResponse};

/// Serve the OpenAPI specification as JSON.
///
/// This endpoint is available at `/api/openapi.json`.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as a string (for writing to file).
/// Used by the gen-openapi binary.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> serde_json::Result<String> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for proxscan.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "proxscan API",
        version = "0.1.0",
        description = r#"
# proxscan API

proxscan answers "which Wi-Fi networks are nearby?" on top of a platform that scans asynchronously.

## Overview

1. **Networks**: list nearby access points, optionally waiting for a fresh scan
2. **Proximity**: compose reports for a rendezvous service and track whether they changed

## Semantics

- **Bounded waits**: a fresh scan never waits longer than the configured timeout
- **Shared scans**: concurrent fresh requests share one platform scan
- **Consume once**: scan results are handed out once; later calls without `fresh` fall back to the current association
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local proxscan server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "networks", description = "Nearby Wi-Fi networks"),
        (name = "proximity", description = "Proximity reports for a rendezvous service")
    ),
    paths(
        super::health::health_check,
        super::networks::list_networks,
        super::proximity::get_proximity,
        super::proximity::acknowledge,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            Entry,
            NetworksResponse,
            ProximityMessage,
            ProximityReport,
            ProximityResponse,
            AckResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "proxscan API");
        assert!(!spec.paths.paths.is_empty());
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = get_openapi_json().unwrap();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"proxscan API\""));
        assert!(json.contains("/networks"));
    }
}
