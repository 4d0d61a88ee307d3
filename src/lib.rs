use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session resolution, guards and the view pipeline.
pub mod auth;
pub mod config;
pub mod error;
pub mod guards;
pub mod handlers;
pub mod models;
pub mod views;

// The SPA route tree (public pages, authenticated layouts, fallback).
pub mod routes;

// --- Public Re-exports ---

// The types a host (main.rs, tests, an embedding app) needs to build and query a table.

pub use auth::{RequestSession, SessionContext, SessionStore};
pub use config::AppConfig;
pub use error::{AppError, RouteError, ViewError};
pub use guards::{Guard, Navigation, NavigationDecision};
pub use routes::{RouteEntry, RouteMatch, RouteTable, ViewRef, app_routes};
pub use views::{FsViewSource, MockViewSource, ViewLoader, ViewSource};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
/// Browser navigations are not part of it.
#[derive(OpenApi)]
#[openapi(
    // JSON endpoints only; the navigation fallback renders HTML.
    paths(
        handlers::list_routes,
        handlers::get_session,
        handlers::resolve_navigation,
    ),
    // Wire types shared with the SPA (also exported as TypeScript by ts-rs).
    components(
        schemas(
            models::RouteSummary, models::SessionStatus, models::NavigationReport,
            guards::NavigationDecision, guards::Guard,
        )
    ),
    tags(
        (name = "practice-router", description = "SPA navigation host")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request. Only the view cache changes after startup.
#[derive(Clone)]
pub struct AppState {
    /// Route Layer: the compiled, validated route table. Read-only after startup.
    pub table: Arc<RouteTable>,
    /// View Layer: memoizing loader in front of the configured `ViewSource`.
    pub views: ViewLoader,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(table: RouteTable, views: ViewLoader, config: AppConfig) -> Self {
        Self {
            table: Arc::new(table),
            views,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers and extractors pull only the piece of state they need. `RequestSession`
// relies on the `AppConfig` impl to find the JWT secret and session cookie.

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for ViewLoader {
    fn from_ref(app_state: &AppState) -> ViewLoader {
        app_state.views.clone()
    }
}

impl FromRef<AppState> for Arc<RouteTable> {
    fn from_ref(app_state: &AppState) -> Arc<RouteTable> {
        app_state.table.clone()
    }
}

/// create_router
///
/// The navigation host: a few JSON endpoints, and a fallback that treats every
/// other path as a browser navigation into the SPA.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header carrying the per-request correlation id.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the JSON endpoints.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Probes and JSON endpoints.
        .route("/health", get(handlers::health))
        .route("/api/routes", get(handlers::list_routes))
        .route("/api/session", get(handlers::get_session))
        .route("/api/navigation", get(handlers::resolve_navigation))
        // Everything else is resolved against the route table.
        .fallback(handlers::navigate)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Generate an x-request-id for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One tracing span per request, tagged with that id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo the id back on the response.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// One span per request, tagged with the request id so every log line of a
/// navigation can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "navigation",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
