use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::guards::{Guard, NavigationDecision};

/// RouteSummary
///
/// One named entry of the route table as published to the SPA. The frontend uses
/// these names when it navigates by route name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteSummary {
    pub name: String,
    // Full pattern, e.g. `/problems/:id`.
    pub path: String,
    // Guard declared on this entry itself.
    pub guard: Option<Guard>,
    // True when this entry or any enclosing layout requires a session.
    pub requires_auth: bool,
    // View module rendered by this entry.
    pub view: String,
    // Deferred views are fetched on first activation.
    pub lazy: bool,
}

/// SessionStatus
///
/// Response of `GET /api/session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionStatus {
    pub is_authenticated: bool,
}

/// NavigationReport
///
/// Dry run of a navigation for the caller's session (`GET /api/navigation`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationReport {
    pub path: String,
    pub route: Option<String>,
    pub params: HashMap<String, String>,
    pub decision: NavigationDecision,
    // Where a redirect would send the browser.
    pub location: Option<String>,
}

/// NavigationQuery
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NavigationQuery {
    /// Path to resolve, e.g. `/problems/42`.
    pub path: String,
    /// Path the navigation starts from, if any.
    pub from: Option<String>,
}
