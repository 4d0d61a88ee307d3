use super::{RouteEntry, ViewRef, names};
use crate::guards::Guard;

/// Public Route Module
///
/// Pages any visitor may open. Only `login` carries a guard, the inverse one:
/// a visitor who is already signed in is sent home instead.
pub fn auth_pages() -> Vec<RouteEntry> {
    vec![
        // /auth/login
        RouteEntry::named(names::LOGIN, "/auth/login", ViewRef::deferred("pages/auth/Login"))
            .with_guard(Guard::RedirectIfAuthenticated),
        // /auth/logout
        // Renders the sign-out confirmation; clearing the session is the store's job.
        RouteEntry::named(names::LOGOUT, "/auth/logout", ViewRef::deferred("pages/auth/Logout")),
        // /auth/register
        RouteEntry::named(
            names::REGISTER,
            "/auth/register",
            ViewRef::deferred("pages/auth/Register"),
        ),
        // /auth/access
        RouteEntry::named(
            names::ACCESS_DENIED,
            "/auth/access",
            ViewRef::deferred("pages/auth/Access"),
        ),
        // /auth/error
        RouteEntry::named(names::ERROR, "/auth/error", ViewRef::deferred("pages/auth/Error")),
    ]
}

/// not_found
///
/// The catch-all. Must stay the last top-level entry.
pub fn not_found() -> RouteEntry {
    RouteEntry::named(
        names::NOT_FOUND,
        "/:pathMatch(.*)*",
        ViewRef::deferred("pages/NotFound"),
    )
}
