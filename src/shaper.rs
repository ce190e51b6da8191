/// Response shaping
///
/// Turns resolutions into HTTP responses. Review records first go through a
/// projection that drops caller-relative fields: values the collaborator
/// computed against this node's identity, which mean nothing to whoever is
/// calling the gateway.
use crate::{
    error::{ErrorResponse, UNKNOWN_ERROR},
    resolution::Resolution,
    store::ReviewRecord,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Top-level record keys whose value depends on who is asking
pub const CALLER_RELATIVE_FIELDS: &[&str] = &["editable"];

/// Remove every caller-relative field from a record
pub fn project_record(mut record: ReviewRecord) -> ReviewRecord {
    for field in CALLER_RELATIVE_FIELDS {
        record.remove(field);
    }
    record
}

/// Map a resolution to status + JSON body; `resource` names the thing in 404s
pub fn shape<T: Serialize>(resolution: Resolution<T>, resource: &str) -> Response {
    match resolution {
        Resolution::Found(value) => (StatusCode::OK, Json(value)).into_response(),
        Resolution::NotFound => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("{} not found", resource))),
        )
            .into_response(),
        Resolution::InvalidInput(reason) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(reason))).into_response()
        }
        Resolution::UpstreamError(message) => {
            let message = if message.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                message
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(message))).into_response()
        }
    }
}

/// Shape a review record resolution, projecting the record first
pub fn shape_record(resolution: Resolution<ReviewRecord>, resource: &str) -> Response {
    shape(resolution.map(project_record), resource)
}
