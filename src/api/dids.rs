/// DID endpoints: identity documents and the reviews around them
use crate::{context::AppContext, shaper};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/dids/:id", get(get_did))
        .route("/dids/:id/reviews/writtenby", get(get_reviews_written_by))
        .route("/dids/:id/reviews/about", get(get_reviews_about))
}

/// Query parameters of `GET /dids/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidParams {
    /// Only the literal `"true"` enables waiting
    pub wait_until_present: Option<String>,
}

impl DidParams {
    pub fn wait_until_present(&self) -> bool {
        self.wait_until_present.as_deref() == Some("true")
    }
}

/// GET /api/v1/dids/:id
pub async fn get_did(
    State(ctx): State<AppContext>,
    Path(did): Path<String>,
    Query(params): Query<DidParams>,
) -> Response {
    let resolution = ctx
        .resolver
        .resolve_identity(&did, params.wait_until_present())
        .await;

    shaper::shape(resolution, &format!("DID {}", did))
}

/// GET /api/v1/dids/:id/reviews/writtenby
pub async fn get_reviews_written_by(
    State(ctx): State<AppContext>,
    Path(did): Path<String>,
) -> Response {
    let resolution = ctx.resolver.resolve_authored_by(&did).await;
    shaper::shape(resolution, &format!("Reviews written by DID {}", did))
}

/// GET /api/v1/dids/:id/reviews/about
pub async fn get_reviews_about(
    State(ctx): State<AppContext>,
    Path(did): Path<String>,
) -> Response {
    let resolution = ctx.resolver.resolve_about(&did).await;
    shaper::shape(resolution, &format!("Reviews about DID {}", did))
}
