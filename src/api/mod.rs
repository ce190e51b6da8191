/// Versioned API routes, mounted under `/api/v1`
pub mod dids;
pub mod reviews;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(reviews::routes())
        .merge(dids::routes())
}
