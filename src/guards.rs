use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    auth::SessionContext,
    routes::{RouteMatch, names},
};

/// Navigation
///
/// One navigation attempt as seen by a guard: the route the user is going to and,
/// when known, the route they are coming from. Built per attempt and evaluated once.
#[derive(Debug, Clone, Copy)]
pub struct Navigation<'a> {
    pub target: &'a RouteMatch,
    pub origin: Option<&'a RouteMatch>,
}

impl<'a> Navigation<'a> {
    pub fn new(target: &'a RouteMatch, origin: Option<&'a RouteMatch>) -> Self {
        Self { target, origin }
    }
}

/// NavigationDecision
///
/// What a guard tells the host to do. Returned, never passed to a callback, so every
/// code path produces exactly one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum NavigationDecision {
    /// Continue to the requested route.
    Proceed,
    /// Navigate to the named route instead.
    Redirect { name: String },
    /// Stay where you are. Reserved: neither built-in guard produces it.
    Abort,
}

impl NavigationDecision {
    pub fn redirect(name: impl Into<String>) -> Self {
        Self::Redirect { name: name.into() }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Guard
///
/// The guard attached to a route entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Guard {
    /// Anonymous visitors are sent to `login`.
    RequireAuth,
    /// Signed-in visitors are sent to `home`.
    RedirectIfAuthenticated,
}

impl Guard {
    pub fn check(self, nav: &Navigation<'_>, session: &dyn SessionContext) -> NavigationDecision {
        match self {
            Guard::RequireAuth => require_auth(nav, session),
            Guard::RedirectIfAuthenticated => redirect_if_authenticated(nav, session),
        }
    }
}

/// require_auth
///
/// Proceeds when the session is authenticated, otherwise redirects to `login`.
/// Reads the session exactly once.
pub fn require_auth(nav: &Navigation<'_>, session: &dyn SessionContext) -> NavigationDecision {
    if is_authenticated(session) {
        NavigationDecision::Proceed
    } else {
        tracing::debug!(
            target_path = %nav.target.path,
            origin = nav.origin.and_then(RouteMatch::name).unwrap_or("-"),
            "anonymous navigation to guarded route"
        );
        NavigationDecision::redirect(names::LOGIN)
    }
}

/// redirect_if_authenticated
///
/// Inverse of `require_auth`: a signed-in visitor has no business on the login page.
pub fn redirect_if_authenticated(
    nav: &Navigation<'_>,
    session: &dyn SessionContext,
) -> NavigationDecision {
    if is_authenticated(session) {
        tracing::debug!(target_path = %nav.target.path, "authenticated visitor sent home");
        NavigationDecision::redirect(names::HOME)
    } else {
        NavigationDecision::Proceed
    }
}

/// is_authenticated
///
/// The read path shared by both guards, exposed for non-navigational checks such as
/// conditional rendering.
pub fn is_authenticated(session: &dyn SessionContext) -> bool {
    session.is_authenticated()
}

/// authorize
///
/// Runs every guard on the matched chain, outermost first. The first decision other
/// than `Proceed` wins.
pub fn authorize(nav: &Navigation<'_>, session: &dyn SessionContext) -> NavigationDecision {
    nav.target
        .guards()
        .map(|guard| guard.check(nav, session))
        .find(|decision| !decision.is_proceed())
        .unwrap_or(NavigationDecision::Proceed)
}
