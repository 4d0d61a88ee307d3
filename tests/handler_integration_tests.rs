use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use chrono::Duration;
use practice_router::{
    AppConfig, AppState, MockViewSource, NavigationDecision, ViewLoader, app_routes,
    auth::{RequestSession, issue_token},
    create_router,
    handlers::{self, ROUTE_NAME_HEADER},
    models::NavigationQuery,
    routes::names,
    views::OUTLET,
};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

// --- Helpers ---

fn create_app_state(mock: MockViewSource) -> AppState {
    let views = ViewLoader::new(Arc::new(mock));
    AppState::new(app_routes().unwrap(), views, AppConfig::default())
}

fn signed_in() -> RequestSession {
    RequestSession::authenticated(Uuid::from_u128(7))
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn call_navigate(state: AppState, session: RequestSession, path: &str) -> Response {
    handlers::navigate(
        Method::GET,
        session,
        State(state),
        path.parse::<Uri>().unwrap(),
        HeaderMap::new(),
    )
    .await
    .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn route_name(response: &Response) -> &str {
    response
        .headers()
        .get(ROUTE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

// --- navigate ---

#[tokio::test]
async fn test_anonymous_profile_redirects_to_login_page() {
    let state = create_app_state(MockViewSource::new());
    let response = call_navigate(state, RequestSession::anonymous(), "/profile").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_authenticated_profile_renders_inside_layout() {
    let mock = MockViewSource::new()
        .with_view("AppLayout", format!("<div class=\"layout\">{OUTLET}</div>"))
        .with_view("pages/Profile", "<h1>Profile</h1>");
    let state = create_app_state(mock);

    let response = call_navigate(state, signed_in(), "/profile").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(route_name(&response), names::PROFILE);
    let body = body_text(response).await;
    assert!(body.contains("<div class=\"layout\"><h1>Profile</h1></div>"));
}

#[tokio::test]
async fn test_authenticated_login_redirects_home() {
    let state = create_app_state(MockViewSource::new());
    let response = call_navigate(state, signed_in(), "/auth/login").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_anonymous_login_renders() {
    let mock = MockViewSource::new().with_view("pages/auth/Login", "<form>sign in</form>");
    let state = create_app_state(mock);

    let response = call_navigate(state, RequestSession::anonymous(), "/auth/login").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(route_name(&response), names::LOGIN);
    assert!(body_text(response).await.contains("<form>sign in</form>"));
}

#[tokio::test]
async fn test_problem_page_embeds_route_params() {
    let state = create_app_state(MockViewSource::new());
    let response = call_navigate(state, signed_in(), "/problems/42").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(route_name(&response), names::PROBLEM);

    let body = body_text(response).await;
    assert!(body.contains("\"params\":{\"id\":\"42\"}"));
    assert!(body.contains("data-view=\"pages/Problem\""));
}

#[tokio::test]
async fn test_decoded_params_are_escaped_in_route_state() {
    let state = create_app_state(MockViewSource::new());
    let response = call_navigate(state, signed_in(), "/problems/%3C%2Fscript%3E").await;

    assert_eq!(route_name(&response), names::PROBLEM);
    let body = body_text(response).await;
    assert!(body.contains(r#""params":{"id":"\u003c/script>"}"#));
    assert!(!body.contains(r#""id":"</script>""#));
}

#[tokio::test]
async fn test_unknown_path_renders_notfound_for_anyone() {
    for session in [RequestSession::anonymous(), signed_in()] {
        let state = create_app_state(MockViewSource::new());
        let response = call_navigate(state, session, "/nonexistent/path").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(route_name(&response), names::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_deferred_view_loaded_once_across_navigations() {
    let mock = MockViewSource::new();
    let state = create_app_state(mock.clone());

    call_navigate(state.clone(), signed_in(), "/plans/1").await;
    let after_first = mock.fetch_count();
    call_navigate(state.clone(), signed_in(), "/plans/2").await;

    // Layout and plan page were fetched by the first navigation only.
    assert_eq!(after_first, 2);
    assert_eq!(mock.fetch_count(), 2);
    assert!(state.views.is_cached("pages/plans/PlanDetail"));
}

#[tokio::test]
async fn test_redirect_does_not_load_views() {
    let mock = MockViewSource::new();
    let state = create_app_state(mock.clone());

    call_navigate(state, RequestSession::anonymous(), "/problem-sets").await;

    assert_eq!(mock.fetch_count(), 0);
}

#[tokio::test]
async fn test_view_failure_is_server_error() {
    let state = create_app_state(MockViewSource::new_failing());
    let result = handlers::navigate(
        Method::GET,
        RequestSession::anonymous(),
        State(state),
        "/auth/register".parse::<Uri>().unwrap(),
        HeaderMap::new(),
    )
    .await;

    let response = match result {
        Err(e) => e.into_response(),
        Ok(response) => panic!("expected a view error, got {}", response.status()),
    };
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_non_get_navigation_is_rejected() {
    let state = create_app_state(MockViewSource::new());
    let response = handlers::navigate(
        Method::POST,
        signed_in(),
        State(state),
        "/profile".parse::<Uri>().unwrap(),
        HeaderMap::new(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- JSON handlers ---

#[tokio::test]
async fn test_resolve_navigation_reports_redirect_location() {
    let state = create_app_state(MockViewSource::new());
    let Json(report) = handlers::resolve_navigation(
        RequestSession::anonymous(),
        State(state),
        Query(NavigationQuery {
            path: "/problems/42/submissions".to_string(),
            from: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(report.route.as_deref(), Some(names::SUBMISSION_HISTORY));
    assert_eq!(report.params.get("id").map(String::as_str), Some("42"));
    assert_eq!(report.decision, NavigationDecision::redirect(names::LOGIN));
    assert_eq!(report.location.as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_resolve_navigation_proceeds_without_location() {
    let state = create_app_state(MockViewSource::new());
    let Json(report) = handlers::resolve_navigation(
        signed_in(),
        State(state),
        Query(NavigationQuery {
            path: "/plans/create".to_string(),
            from: Some("/plans".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(report.route.as_deref(), Some(names::CREATE_PLAN));
    assert_eq!(report.decision, NavigationDecision::Proceed);
    assert_eq!(report.location, None);
}

#[tokio::test]
async fn test_get_session_matches_request_session() {
    let Json(anonymous) = handlers::get_session(RequestSession::anonymous()).await;
    assert!(!anonymous.is_authenticated);

    let Json(authenticated) = handlers::get_session(signed_in()).await;
    assert!(authenticated.is_authenticated);
}

#[tokio::test]
async fn test_list_routes_publishes_named_entries() {
    let state = create_app_state(MockViewSource::new());
    let Json(routes) = handlers::list_routes(State(state)).await;

    let route_names: Vec<_> = routes.iter().map(|route| route.name.as_str()).collect();
    assert_eq!(route_names.first(), Some(&names::HOME));
    assert_eq!(route_names.last(), Some(&names::NOT_FOUND));
    assert_eq!(routes.len(), 16);
}

// --- Full router ---

#[tokio::test]
async fn test_router_uses_bearer_token_for_guards() {
    let config = AppConfig::default();
    let token = issue_token(&config.jwt_secret, Uuid::new_v4(), Duration::minutes(5)).unwrap();
    let app = create_router(create_app_state(MockViewSource::new()));

    let request = Request::builder()
        .uri("/problems/42")
        .header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_router_redirects_anonymous_browser() {
    let app = create_router(create_app_state(MockViewSource::new()));

    let request = Request::builder()
        .uri("/problems/42")
        .header(header::REFERER, "http://localhost:3000/auth/register")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_router_health() {
    let app = create_router(create_app_state(MockViewSource::new()));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}
