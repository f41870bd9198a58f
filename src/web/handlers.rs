//! HTTP request handlers.

use super::AppState;
use crate::notify::{process_event, CrimeEvent, DispatchResult, IngestOutcome};
use crate::taxonomy::CrimeCode;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ============================================================================
// API: Ingestion
// ============================================================================

/// Event record posted by a detection source.
///
/// Field casing follows the detectors' existing payloads: the frame
/// classifier sends `crimeTypeId`, the scene classifier sends
/// `crimeTypeID` and `Summary`.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default, rename = "crimeTypeId", alias = "crimeTypeID")]
    pub crime_type_id: Option<CrimeCode>,
    #[serde(default, alias = "Summary")]
    pub summary: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default, rename = "phoneNumbers")]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub crime_type: String,
    pub notifications_sent: usize,
    pub alert_id: String,
    pub results: Vec<DispatchResult>,
}

pub async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> impl IntoResponse {
    let code = match req.crime_type_id {
        Some(code) => code,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "crimeTypeId is required" })),
            )
                .into_response();
        }
    };

    let mut explicit = req.emails;
    explicit.extend(req.phone_numbers);
    explicit.extend(req.targets);

    let event = CrimeEvent {
        code,
        summary: req.summary,
        explicit_targets: explicit,
    };

    let outcome = process_event(
        state.transport.clone(),
        &state.store,
        &state.alerts,
        &state.config,
        event,
    )
    .await;

    match outcome {
        Ok(IngestOutcome::Skipped { crime_type }) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "No criminal activity detected. No notification sent.",
                "crimeType": crime_type,
                "notificationsSent": 0,
            })),
        )
            .into_response(),
        Ok(IngestOutcome::NoRecipients { .. }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "no notification recipients available" })),
        )
            .into_response(),
        Ok(IngestOutcome::Dispatched { alert, results }) => {
            let success = results.iter().all(|r| r.success);
            let status = if success {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };

            let body = IngestResponse {
                success,
                crime_type: alert.crime_type,
                notifications_sent: alert.notifications_sent,
                alert_id: alert.id,
                results,
            };
            (status, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API: Alert log
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> impl IntoResponse {
    let alerts = state.alerts.list(query.limit.unwrap_or(20));
    Json(json!({
        "success": true,
        "count": alerts.len(),
        "alerts": alerts,
    }))
}

pub async fn handle_get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.alerts.get(&id) {
        Some(alert) => Json(alert).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "alert not found" })),
        )
            .into_response(),
    }
}

pub async fn handle_clear_alerts(State(state): State<AppState>) -> impl IntoResponse {
    state.alerts.clear();
    StatusCode::NO_CONTENT
}
