use practice_router::{
    Guard, Navigation, NavigationDecision, SessionContext, SessionStore, app_routes,
    guards::{authorize, is_authenticated, redirect_if_authenticated, require_auth},
    routes::{RouteTable, names},
};

// --- Helpers ---

/// Counts how often the session flag is read.
struct CountingSession {
    authenticated: bool,
    reads: std::sync::atomic::AtomicUsize,
}

impl CountingSession {
    fn new(authenticated: bool) -> Self {
        Self {
            authenticated,
            reads: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl SessionContext for CountingSession {
    fn is_authenticated(&self) -> bool {
        self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.authenticated
    }
}

fn decide(
    table: &RouteTable,
    path: &str,
    session: &dyn SessionContext,
) -> (Option<String>, NavigationDecision) {
    let target = table.resolve_or_fallback(path).unwrap();
    let origin = table.resolve("/");
    let nav = Navigation::new(&target, origin.as_ref());
    let decision = authorize(&nav, session);
    (target.name().map(str::to_string), decision)
}

const GUARDED_PATHS: [&str; 10] = [
    "/",
    "/profile",
    "/problem-sets",
    "/learn/python-basics",
    "/problems/42",
    "/problems/42/submissions",
    "/plans",
    "/plans/create",
    "/plans/9",
    "/profile/",
];

// --- Concrete Scenarios ---

#[test]
fn test_anonymous_profile_redirects_to_login() {
    let table = app_routes().unwrap();
    let (_, decision) = decide(&table, "/profile", &false);
    assert_eq!(decision, NavigationDecision::redirect(names::LOGIN));
}

#[test]
fn test_authenticated_profile_proceeds() {
    let table = app_routes().unwrap();
    let (route, decision) = decide(&table, "/profile", &true);
    assert_eq!(decision, NavigationDecision::Proceed);
    assert_eq!(route.as_deref(), Some(names::PROFILE));
}

#[test]
fn test_authenticated_login_redirects_home() {
    let table = app_routes().unwrap();
    let (_, decision) = decide(&table, "/auth/login", &true);
    assert_eq!(decision, NavigationDecision::redirect(names::HOME));
}

#[test]
fn test_anonymous_login_proceeds() {
    let table = app_routes().unwrap();
    let (route, decision) = decide(&table, "/auth/login", &false);
    assert_eq!(decision, NavigationDecision::Proceed);
    assert_eq!(route.as_deref(), Some(names::LOGIN));
}

#[test]
fn test_problem_route_depends_on_session() {
    let table = app_routes().unwrap();
    let target = table.resolve("/problems/42").unwrap();
    assert_eq!(target.param("id"), Some("42"));

    let nav = Navigation::new(&target, None);
    assert_eq!(authorize(&nav, &true), NavigationDecision::Proceed);
    assert_eq!(authorize(&nav, &false), NavigationDecision::redirect(names::LOGIN));
}

#[test]
fn test_unknown_path_is_notfound_for_everyone() {
    let table = app_routes().unwrap();
    for authenticated in [true, false] {
        let (route, decision) = decide(&table, "/nonexistent/path", &authenticated);
        assert_eq!(route.as_deref(), Some(names::NOT_FOUND));
        assert_eq!(decision, NavigationDecision::Proceed);
    }
}

// --- Properties ---

#[test]
fn test_guarded_paths_never_proceed_when_anonymous() {
    let table = app_routes().unwrap();
    for path in GUARDED_PATHS {
        let (_, decision) = decide(&table, path, &false);
        assert_eq!(decision, NavigationDecision::redirect(names::LOGIN), "path {path}");
    }
}

#[test]
fn test_guarded_paths_never_redirect_when_authenticated() {
    let table = app_routes().unwrap();
    for path in GUARDED_PATHS {
        let (_, decision) = decide(&table, path, &true);
        assert_eq!(decision, NavigationDecision::Proceed, "path {path}");
    }
}

#[test]
fn test_open_pages_proceed_in_both_states() {
    let table = app_routes().unwrap();
    for path in ["/auth/logout", "/auth/register", "/auth/access", "/auth/error"] {
        for authenticated in [true, false] {
            let (_, decision) = decide(&table, path, &authenticated);
            assert_eq!(decision, NavigationDecision::Proceed, "path {path}");
        }
    }
}

#[test]
fn test_each_guard_reads_the_session_once() {
    let table = app_routes().unwrap();
    let target = table.resolve("/profile").unwrap();
    let nav = Navigation::new(&target, None);

    let session = CountingSession::new(false);
    require_auth(&nav, &session);
    assert_eq!(session.reads(), 1);

    redirect_if_authenticated(&nav, &session);
    assert_eq!(session.reads(), 2);
}

#[test]
fn test_guards_follow_the_live_store() {
    let table = app_routes().unwrap();
    let store = SessionStore::default();
    let observer = store.clone();

    let (_, before) = decide(&table, "/profile", &observer);
    assert_eq!(before, NavigationDecision::redirect(names::LOGIN));
    assert!(!is_authenticated(&observer));

    store.sign_in();
    let (_, after) = decide(&table, "/profile", &observer);
    assert_eq!(after, NavigationDecision::Proceed);
    assert!(is_authenticated(&observer));

    store.sign_out();
    let (_, login) = decide(&table, "/auth/login", &observer);
    assert_eq!(login, NavigationDecision::Proceed);
}

#[test]
fn test_is_authenticated_agrees_with_guard_decision() {
    let table = app_routes().unwrap();
    let target = table.resolve("/plans").unwrap();
    let nav = Navigation::new(&target, None);

    for state in [true, false] {
        let store = SessionStore::new(state);
        let decision = require_auth(&nav, &store);
        assert_eq!(decision.is_proceed(), is_authenticated(&store));
    }
}

#[test]
fn test_guard_enum_dispatches_to_functions() {
    let table = app_routes().unwrap();
    let target = table.resolve("/auth/login").unwrap();
    let origin = table.resolve("/profile").unwrap();
    let nav = Navigation::new(&target, Some(&origin));

    assert_eq!(nav.origin.and_then(|route| route.name()), Some(names::PROFILE));

    assert_eq!(
        Guard::RequireAuth.check(&nav, &false),
        require_auth(&nav, &false)
    );
    assert_eq!(
        Guard::RedirectIfAuthenticated.check(&nav, &true),
        redirect_if_authenticated(&nav, &true)
    );
}

#[test]
fn test_first_non_proceed_guard_wins() {
    use practice_router::{RouteEntry, ViewRef};

    // A login-style page nested inside a guarded layout: the outer guard runs first.
    let table = RouteTable::new(vec![
        RouteEntry::new("/outer", ViewRef::bound("Layout"))
            .with_guard(Guard::RequireAuth)
            .with_children(vec![
                RouteEntry::named("inner", "inner", ViewRef::deferred("Inner"))
                    .with_guard(Guard::RedirectIfAuthenticated),
            ]),
        RouteEntry::named("home", "/", ViewRef::deferred("Home")),
        RouteEntry::named("login", "/login", ViewRef::deferred("Login")),
    ])
    .unwrap();

    let (_, anonymous) = decide(&table, "/outer/inner", &false);
    assert_eq!(anonymous, NavigationDecision::redirect("login"));

    let (_, signed_in) = decide(&table, "/outer/inner", &true);
    assert_eq!(signed_in, NavigationDecision::redirect("home"));
}
