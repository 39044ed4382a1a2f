use crate::handlers;
use crate::middleware;
use crate::AppState;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Unknown actions and unsupported methods both answer 404.
    let auth_endpoint = get(handlers::auth::get_action)
        .post(handlers::auth::post_action)
        .fallback(handlers::auth::not_found);

    let protected = Router::new()
        .route("/api/session", get(handlers::auth::current_session))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Auth endpoint: the bare path and everything beneath it
        .route("/api/auth", auth_endpoint.clone())
        .route("/api/auth/", auth_endpoint.clone())
        .route("/api/auth/*rest", auth_endpoint)
        .merge(protected)
        .fallback(handlers::auth::not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
