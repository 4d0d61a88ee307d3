//! Route Table Module Index
//!
//! The SPA's route tree, split the way access is granted: entries open to every
//! visitor live in `public`, entries behind a session live in `authenticated`.
//! `app_routes` stitches them together in resolution order.

use crate::error::RouteError;

/// Pattern parsing, matching and reversing.
pub mod pattern;

/// Route entries, the compiled table and path resolution.
pub mod table;

/// Auth pages and the not-found fallback. No session required.
pub mod public;

/// Application layouts and pages guarded by `Guard::RequireAuth`.
pub mod authenticated;

pub use pattern::{PathPattern, Segment};
pub use table::{MatchedEntry, RouteEntry, RouteMatch, RouteTable, ViewRef};

/// Route names other modules refer to.
pub mod names {
    pub const HOME: &str = "home";
    pub const DASHBOARD: &str = "dashboard";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const REGISTER: &str = "register";
    pub const ACCESS_DENIED: &str = "accessDenied";
    pub const ERROR: &str = "error";
    pub const PROFILE: &str = "profile";
    pub const PROBLEM_SETS: &str = "problemSets";
    pub const LEARN_PYTHON_BASICS: &str = "learnPythonBasics";
    pub const PROBLEM: &str = "problem";
    pub const SUBMISSION_HISTORY: &str = "submissionHistory";
    pub const PLANS: &str = "plans";
    pub const CREATE_PLAN: &str = "createPlan";
    pub const PLAN: &str = "plan";
    pub const NOT_FOUND: &str = "notfound";
}

/// Layout every signed-in page renders inside.
pub const APP_LAYOUT: &str = "AppLayout";

/// app_routes
///
/// The application's route table. Order matters: the home layout first, then the
/// auth pages, the profile layout and finally the catch-all.
pub fn app_routes() -> Result<RouteTable, RouteError> {
    let mut entries = vec![authenticated::home_layout()];
    entries.extend(public::auth_pages());
    entries.push(authenticated::profile_layout());
    entries.push(public::not_found());

    RouteTable::new(entries)
}
