//! Router assembly.

use axum::{
    Router,
    middleware,
    routing::{MethodRouter, get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

use crate::api::handlers::{
    api_shorten_handler, batch_shorten_handler, ping_handler, redirect_handler, shorten_handler,
    stats_handler, user_urls_delete_handler, user_urls_handler,
};
use crate::api::middleware::{auth, request_log};
use crate::state::AppState;

/// The route table: every endpoint as an explicit `(pattern, methods)` pair,
/// folded into the router once at startup.
fn routes() -> Vec<(&'static str, MethodRouter<AppState>)> {
    vec![
        ("/", post(shorten_handler)),
        ("/ping", get(ping_handler)),
        ("/api/shorten", post(api_shorten_handler)),
        ("/api/shorten/batch", post(batch_shorten_handler)),
        (
            "/api/user/urls",
            get(user_urls_handler).delete(user_urls_delete_handler),
        ),
        ("/api/internal/stats", get(stats_handler)),
        ("/{id}", get(redirect_handler)),
    ]
}

/// Constructs the application router with all routes and middleware.
///
/// Request flow, outermost first: panic recovery, access logging, identity
/// cookie, gzip (response compression and request decompression), route
/// handler.
pub fn app_router(state: AppState) -> Router {
    let mut router = Router::new();
    for (pattern, handler) in routes() {
        router = router.route(pattern, handler);
    }

    router
        .with_state(state.clone())
        .layer(RequestDecompressionLayer::new().gzip(true))
        .layer(CompressionLayer::new().gzip(true))
        .layer(middleware::from_fn_with_state(state, auth::layer))
        .layer(middleware::from_fn(request_log::layer))
        .layer(CatchPanicLayer::new())
}
