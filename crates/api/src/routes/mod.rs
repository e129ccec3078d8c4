//! API routes.

pub mod analytics;
pub mod health;
pub mod presentations;
pub mod templates;
pub mod versions;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // tracking and analytics
        .route("/analytics/track/view", post(analytics::track_view))
        .route(
            "/analytics/track/engagement",
            post(analytics::track_engagement),
        )
        .route(
            "/analytics/presentation/:id",
            get(analytics::presentation_analytics),
        )
        .route("/analytics/version/:id", get(analytics::version_analytics))
        // versions
        .route("/versions", post(versions::create))
        .route(
            "/versions/presentation/:presentation_id",
            get(versions::list_for_presentation),
        )
        .route(
            "/versions/:slug",
            get(versions::open).put(versions::update).delete(versions::delete),
        )
        // presentations
        .route(
            "/presentations",
            get(presentations::list).post(presentations::create),
        )
        .route(
            "/presentations/:id",
            get(presentations::get)
                .put(presentations::update)
                .delete(presentations::delete),
        )
        // templates
        .route("/templates", get(templates::list).post(templates::create))
        .route("/templates/:slug", get(templates::get))
        // webhooks
        .route("/webhooks/deal", post(webhooks::deal))
        .route("/webhooks/logs", get(webhooks::logs));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
