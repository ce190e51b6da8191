/// Review record endpoints
use crate::{context::AppContext, shaper};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/reviews/:id", get(get_review_record))
}

/// Query parameters of `GET /reviews/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecordParams {
    /// Only the literal `"false"` turns latest-version resolution off
    pub get_latest_version: Option<String>,
}

impl ReviewRecordParams {
    pub fn get_latest_version(&self) -> bool {
        self.get_latest_version.as_deref() != Some("false")
    }
}

/// GET /api/v1/reviews/:id
pub async fn get_review_record(
    State(ctx): State<AppContext>,
    Path(multihash): Path<String>,
    Query(params): Query<ReviewRecordParams>,
) -> Response {
    let resolution = ctx
        .resolver
        .resolve_record(&multihash, params.get_latest_version())
        .await;

    shaper::shape_record(resolution, &format!("Review Record {}", multihash))
}
