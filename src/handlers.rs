use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::RequestSession,
    error::AppError,
    guards::{self, Navigation, NavigationDecision},
    models::{NavigationQuery, NavigationReport, RouteSummary, SessionStatus},
    routes::{RouteMatch, names},
    views::{LoadedView, compose},
};

/// Response header naming the route a navigation rendered.
pub const ROUTE_NAME_HEADER: &str = "x-route-name";

/// health
///
/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// list_routes
///
/// Publishes every named route with its pattern and guard so the SPA can navigate
/// by name.
#[utoipa::path(
    get,
    path = "/api/routes",
    responses((status = 200, description = "Route manifest", body = [RouteSummary]))
)]
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    Json(state.table.summaries().to_vec())
}

/// get_session
///
/// The non-navigational `is_authenticated` check, for conditional rendering.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn get_session(session: RequestSession) -> Json<SessionStatus> {
    Json(SessionStatus {
        is_authenticated: guards::is_authenticated(&session),
    })
}

/// resolve_navigation
///
/// Resolves and authorizes a path for the caller's session without loading any view.
#[utoipa::path(
    get,
    path = "/api/navigation",
    params(NavigationQuery),
    responses((status = 200, description = "Navigation outcome", body = NavigationReport))
)]
pub async fn resolve_navigation(
    session: RequestSession,
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> Result<Json<NavigationReport>, AppError> {
    let target = state.table.resolve_or_fallback(&query.path)?;
    let origin = query.from.as_deref().and_then(|from| state.table.resolve(from));
    let nav = Navigation::new(&target, origin.as_ref());
    let decision = guards::authorize(&nav, &session);

    let location = match &decision {
        NavigationDecision::Redirect { name } => Some(state.table.reverse(name, &HashMap::new())?),
        NavigationDecision::Proceed | NavigationDecision::Abort => None,
    };

    Ok(Json(NavigationReport {
        path: target.path.clone(),
        route: target.name().map(str::to_string),
        params: target.params.clone(),
        decision,
        location,
    }))
}

/// navigate
///
/// Fallback for every path that is not an API endpoint: a browser navigation into
/// the SPA.
///
/// 1. Resolve the path (unknown paths land on `notfound`).
/// 2. Run the matched chain's guards against the request's session.
/// 3. Redirect (303), refuse (403), or load the chain's views and render them
///    nested, 404 for `notfound` and 200 otherwise.
pub async fn navigate(
    method: Method,
    session: RequestSession,
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let target = state.table.resolve_or_fallback(uri.path())?;
    let origin = referer_path(&headers).and_then(|from| state.table.resolve(&from));
    let nav = Navigation::new(&target, origin.as_ref());

    match guards::authorize(&nav, &session) {
        NavigationDecision::Proceed => {}
        NavigationDecision::Redirect { name } => {
            let location = state.table.reverse(&name, &HashMap::new())?;
            tracing::info!(
                from = %target.path,
                to = %location,
                route = %name,
                "navigation redirected"
            );
            return Ok(Redirect::to(&location).into_response());
        }
        NavigationDecision::Abort => {
            tracing::info!(path = %target.path, "navigation aborted");
            return Ok(StatusCode::FORBIDDEN.into_response());
        }
    }

    let views = state.views.load_chain(&target.chain).await?;
    let route_name = target.name().unwrap_or_default().to_string();
    let status = if route_name == names::NOT_FOUND {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        [(ROUTE_NAME_HEADER, route_name)],
        Html(render_page(&target, &views)),
    )
        .into_response())
}

/// render_page
///
/// Wraps the composed view chain in the SPA shell. The route state is embedded as
/// JSON so the client can hydrate without resolving the path again.
pub fn render_page(target: &RouteMatch, views: &[std::sync::Arc<LoadedView>]) -> String {
    let state = serde_json::json!({
        "name": target.name(),
        "path": target.path,
        "params": target.params,
    })
    .to_string()
    .replace('<', "\\u003c");

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>Practice</title></head>\n<body>\n<div id=\"app\">{}</div>\n<script type=\"application/json\" id=\"route-state\">{}</script>\n</body>\n</html>\n",
        compose(views),
        state
    )
}

/// referer_path
///
/// Path component of the `Referer` header. Resolved against the table, it gives the
/// navigation's originating route.
fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let path = match referer.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |index| &rest[index..]),
        None => referer,
    };
    Some(path.to_string())
}
