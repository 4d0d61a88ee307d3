use super::{APP_LAYOUT, RouteEntry, ViewRef, names};
use crate::guards::Guard;

/// Authenticated Route Module
///
/// Layouts whose whole subtree needs a signed-in session. The guard sits on the
/// layout entry and therefore runs for every child navigation.
pub fn home_layout() -> RouteEntry {
    RouteEntry::named(names::HOME, "/", ViewRef::bound(APP_LAYOUT))
        .with_guard(Guard::RequireAuth)
        .with_children(vec![
            // /
            RouteEntry::named(names::DASHBOARD, "", ViewRef::deferred("pages/Dashboard")),
            // /problem-sets
            RouteEntry::named(
                names::PROBLEM_SETS,
                "problem-sets",
                ViewRef::deferred("pages/ProblemSets"),
            ),
            // /learn/python-basics
            RouteEntry::named(
                names::LEARN_PYTHON_BASICS,
                "learn/python-basics",
                ViewRef::deferred("pages/LearnPythonBasics"),
            ),
            // /problems/:id
            RouteEntry::named(names::PROBLEM, "problems/:id", ViewRef::deferred("pages/Problem")),
            // /problems/:id/submissions
            RouteEntry::named(
                names::SUBMISSION_HISTORY,
                "problems/:id/submissions",
                ViewRef::deferred("pages/SubmissionHistory"),
            ),
            // /plans
            RouteEntry::named(names::PLANS, "plans", ViewRef::deferred("pages/plans/PlanList")),
            // /plans/create
            // Declared before `plans/:id` so "create" is never read as a plan id.
            RouteEntry::named(
                names::CREATE_PLAN,
                "plans/create",
                ViewRef::deferred("pages/plans/CreatePlan"),
            ),
            // /plans/:id
            RouteEntry::named(names::PLAN, "plans/:id", ViewRef::deferred("pages/plans/PlanDetail")),
        ])
}

/// profile_layout
///
/// `/profile` renders inside its own unnamed `AppLayout` container.
pub fn profile_layout() -> RouteEntry {
    RouteEntry::new("/profile", ViewRef::bound(APP_LAYOUT))
        .with_guard(Guard::RequireAuth)
        .with_children(vec![RouteEntry::named(
            names::PROFILE,
            "",
            ViewRef::deferred("pages/Profile"),
        )])
}
