use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::pattern::{PathPattern, join_paths, normalize_path};
use crate::{error::RouteError, guards::Guard, models::RouteSummary};

/// ViewRef
///
/// How an entry refers to the view it renders. Both variants name a view module;
/// they differ only in when the module is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "module", rename_all = "snake_case")]
pub enum ViewRef {
    /// Loaded eagerly when the host starts (layouts).
    Bound(String),
    /// Loaded on the first activation of a matching entry, then reused.
    Deferred(String),
}

impl ViewRef {
    pub fn bound(module: impl Into<String>) -> Self {
        Self::Bound(module.into())
    }

    pub fn deferred(module: impl Into<String>) -> Self {
        Self::Deferred(module.into())
    }

    pub fn module(&self) -> &str {
        match self {
            Self::Bound(module) | Self::Deferred(module) => module,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// RouteEntry
///
/// One node of the declarative route tree. `path` is relative to the parent entry;
/// top-level entries use absolute paths.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: String,
    pub name: Option<String>,
    pub view: ViewRef,
    pub guard: Option<Guard>,
    pub children: Vec<RouteEntry>,
}

impl RouteEntry {
    /// An unnamed entry, typically a layout container.
    pub fn new(path: impl Into<String>, view: ViewRef) -> Self {
        Self {
            path: path.into(),
            name: None,
            view,
            guard: None,
            children: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>, path: impl Into<String>, view: ViewRef) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(path, view)
        }
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_children(mut self, children: Vec<RouteEntry>) -> Self {
        self.children = children;
        self
    }
}

/// MatchedEntry
///
/// The part of a `RouteEntry` that travels with a match: enough to run its guard
/// and render its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedEntry {
    pub name: Option<String>,
    pub view: ViewRef,
    pub guard: Option<Guard>,
}

impl From<&RouteEntry> for MatchedEntry {
    fn from(entry: &RouteEntry) -> Self {
        Self {
            name: entry.name.clone(),
            view: entry.view.clone(),
            guard: entry.guard,
        }
    }
}

/// RouteMatch
///
/// Result of resolving a path: the entry chain from the outermost layout down to the
/// leaf, plus the captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Normalized requested path.
    pub path: String,
    /// Full pattern of the matched leaf.
    pub pattern: String,
    pub chain: Vec<MatchedEntry>,
    pub params: HashMap<String, String>,
}

impl RouteMatch {
    /// Name of the nearest named entry, starting from the leaf.
    pub fn name(&self) -> Option<&str> {
        self.chain.iter().rev().find_map(|entry| entry.name.as_deref())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Guards on the chain, outermost first.
    pub fn guards(&self) -> impl Iterator<Item = Guard> + '_ {
        self.chain.iter().filter_map(|entry| entry.guard)
    }

    pub fn requires_auth(&self) -> bool {
        self.guards().any(|guard| guard == Guard::RequireAuth)
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    pattern: PathPattern,
    chain: Vec<MatchedEntry>,
}

/// RouteTable
///
/// The validated route tree, flattened into leaf routes in declaration order.
/// Resolution walks that list and returns the first match.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    named: HashMap<String, PathPattern>,
    summaries: Vec<RouteSummary>,
}

impl RouteTable {
    /// new
    ///
    /// Validates and compiles the tree. Names must be unique across the whole tree and
    /// a catch-all route may only appear last.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, RouteError> {
        let mut table = Self {
            routes: Vec::new(),
            named: HashMap::new(),
            summaries: Vec::new(),
        };
        let mut seen = HashSet::new();
        table.compile(&entries, "", &[], &mut seen)?;

        if let Some((_, shadowing)) = table.routes.split_last() {
            if let Some(route) = shadowing.iter().find(|route| route.pattern.is_catch_all()) {
                return Err(RouteError::MisplacedCatchAll(
                    route.pattern.as_str().to_string(),
                ));
            }
        }

        tracing::debug!(
            routes = table.routes.len(),
            named = table.named.len(),
            "route table compiled"
        );
        Ok(table)
    }

    fn compile(
        &mut self,
        entries: &[RouteEntry],
        parent_path: &str,
        parent_chain: &[MatchedEntry],
        seen: &mut HashSet<String>,
    ) -> Result<(), RouteError> {
        for entry in entries {
            let full_path = join_paths(parent_path, &entry.path);
            let pattern = PathPattern::parse(&full_path)?;

            let mut chain = parent_chain.to_vec();
            chain.push(MatchedEntry::from(entry));

            if let Some(name) = &entry.name {
                if !seen.insert(name.clone()) {
                    return Err(RouteError::DuplicateName(name.clone()));
                }
                self.named.insert(name.clone(), pattern.clone());
                self.summaries.push(RouteSummary {
                    name: name.clone(),
                    path: pattern.as_str().to_string(),
                    guard: entry.guard,
                    requires_auth: chain
                        .iter()
                        .any(|link| link.guard == Some(Guard::RequireAuth)),
                    view: entry.view.module().to_string(),
                    lazy: entry.view.is_deferred(),
                });
            }

            if entry.children.is_empty() {
                self.routes.push(CompiledRoute { pattern, chain });
            } else {
                self.compile(&entry.children, &full_path, &chain, seen)?;
            }
        }
        Ok(())
    }

    /// resolve
    ///
    /// First route, in declaration order, whose pattern matches `path`. Containers
    /// match only through their children. `None` only when the table has no catch-all.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let found = self.routes.iter().find_map(|route| {
            route.pattern.matches(path).map(|params| RouteMatch {
                path: normalize_path(path),
                pattern: route.pattern.as_str().to_string(),
                chain: route.chain.clone(),
                params,
            })
        });

        match &found {
            Some(route_match) => tracing::debug!(
                path,
                route = route_match.name().unwrap_or("<unnamed>"),
                pattern = %route_match.pattern,
                "path resolved"
            ),
            None => tracing::debug!(path, "no route matched"),
        }
        found
    }

    /// Like `resolve`, but treats a table without a catch-all as an error.
    pub fn resolve_or_fallback(&self, path: &str) -> Result<RouteMatch, RouteError> {
        self.resolve(path)
            .ok_or_else(|| RouteError::NoFallback(path.to_string()))
    }

    /// reverse
    ///
    /// Concrete path of the named route, e.g. `reverse("problem", {id: 42})` gives
    /// `/problems/42`.
    pub fn reverse(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<String, RouteError> {
        let pattern = self
            .named
            .get(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;

        pattern
            .reverse(params)
            .map_err(|param| RouteError::MissingParameter {
                route: name.to_string(),
                param,
            })
    }

    pub fn get(&self, name: &str) -> Option<&RouteSummary> {
        self.summaries.iter().find(|summary| summary.name == name)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Every named entry, containers before their children, in declaration order.
    pub fn summaries(&self) -> &[RouteSummary] {
        &self.summaries
    }

    /// Distinct views referenced by the table, in first-use order. A module used both
    /// bound and deferred is listed once for each.
    pub fn views(&self) -> Vec<&ViewRef> {
        let mut seen = HashSet::new();
        self.routes
            .iter()
            .flat_map(|route| route.chain.iter().map(|entry| &entry.view))
            .filter(|&view| seen.insert(view))
            .collect()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}
