use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// RouteError
///
/// Raised while building the route table or turning a route name back into a path.
/// Navigation itself never fails with these: an unknown path falls through to the
/// catch-all entry and a denied navigation is a redirect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("route name `{0}` is declared more than once")]
    DuplicateName(String),
    #[error("catch-all must be the last segment of the last route: `{0}`")]
    MisplacedCatchAll(String),
    #[error("no route named `{0}`")]
    UnknownRoute(String),
    #[error("route `{route}` needs parameter `{param}`")]
    MissingParameter { route: String, param: String },
    #[error("no route matches `{0}` and the table has no catch-all")]
    NoFallback(String),
}

/// ViewError
///
/// Failures of the view loading pipeline. A failed load is never cached.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("view module not found: {0}")]
    NotFound(String),
    #[error("failed to read view module {module}: {source}")]
    Io {
        module: String,
        #[source]
        source: std::io::Error,
    },
    #[error("view source error: {0}")]
    Source(String),
}

/// ConfigError
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
}

/// AppError
///
/// The error type returned by the HTTP handlers. Every variant is logged once here,
/// at the boundary, and converted into a bare status response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    View(#[from] ViewError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Route(RouteError::NoFallback(_)) => StatusCode::NOT_FOUND,
            AppError::Route(_) | AppError::View(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "navigation failed");
        } else {
            tracing::debug!(error = %self, "navigation rejected");
        }

        (status, status.canonical_reason().unwrap_or("error")).into_response()
    }
}
