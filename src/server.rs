/// HTTP server setup, routing and lifecycle
use crate::{
    context::AppContext,
    error::{ErrorResponse, GatewayError, GatewayResult},
    metrics,
};
use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::future::Future;
use std::time::Instant;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// Plain text answer of `GET /`
pub const BANNER: &str = "Chlu API Query";

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api/v1", crate::api::routes())
        .with_state(ctx)
        .fallback(not_found)
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn banner() -> &'static str {
    BANNER
}

/// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus scrape endpoint
async fn metrics_endpoint() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
        .into_response()
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found")),
    )
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_http_request(
        &method,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Start the HTTP server and run until ctrl-c
pub async fn serve(ctx: AppContext) -> GatewayResult<()> {
    serve_with_shutdown(ctx, shutdown_signal()).await
}

/// Start the collaborator, serve until `signal` resolves, then stop it
///
/// The listener is only bound once the collaborator is fully started, and
/// the collaborator is stopped even if serving fails.
pub async fn serve_with_shutdown<F>(ctx: AppContext, signal: F) -> GatewayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    ctx.start().await?;

    let result = run_listener(ctx.clone(), signal).await;

    if let Err(e) = ctx.stop().await {
        error!("Failed to stop Chlu node cleanly: {}", e);
        if result.is_ok() {
            return Err(e);
        }
    }

    result
}

async fn run_listener<F>(ctx: AppContext, signal: F) -> GatewayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = ctx.config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Chlu API Query listening on {}", addr);
    info!("   Network: {}", ctx.config.network.name);

    let app = build_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| GatewayError::Internal(format!("Server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    info!("Stopping gracefully");
}
