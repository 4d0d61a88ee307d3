use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::{
    error::ViewError,
    routes::{MatchedEntry, RouteTable, ViewRef},
};

/// Placeholder in a layout's markup where the child view is rendered.
pub const OUTLET: &str = "<router-view></router-view>";

/// LoadedView
///
/// A fetched view module, shared by every activation once cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedView {
    pub module: String,
    pub markup: String,
}

// 1. ViewSource Contract
/// ViewSource
///
/// Where view modules come from. The loader only ever asks for a module by name;
/// `FsViewSource` serves files in production and `MockViewSource` keeps tests off
/// the filesystem.
#[async_trait]
pub trait ViewSource: Send + Sync {
    async fn fetch(&self, module: &str) -> Result<String, ViewError>;
}

pub type ViewSourceState = Arc<dyn ViewSource>;

// 2. The Real Implementation
/// FsViewSource
///
/// Reads `<root>/<module>.html`.
#[derive(Debug, Clone)]
pub struct FsViewSource {
    root: PathBuf,
}

impl FsViewSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ViewSource for FsViewSource {
    async fn fetch(&self, module: &str) -> Result<String, ViewError> {
        let relative = sanitize_module(module);
        if relative.is_empty() {
            return Err(ViewError::NotFound(module.to_string()));
        }

        let path = self.root.join(format!("{relative}.html"));
        tokio::fs::read_to_string(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ViewError::NotFound(module.to_string())
            } else {
                ViewError::Io {
                    module: module.to_string(),
                    source,
                }
            }
        })
    }
}

/// sanitize_module
///
/// Drops empty, `.` and `..` components so a module name can never leave the views
/// directory.
fn sanitize_module(module: &str) -> String {
    module
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation
/// MockViewSource
///
/// In-memory views for tests. Modules without registered markup get a placeholder
/// section carrying an outlet, so any table renders. Every fetch is counted.
#[derive(Debug, Clone, Default)]
pub struct MockViewSource {
    views: HashMap<String, String>,
    fetches: Arc<AtomicUsize>,
    /// When true, every fetch fails.
    pub should_fail: bool,
}

impl MockViewSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_view(mut self, module: impl Into<String>, markup: impl Into<String>) -> Self {
        self.views.insert(module.into(), markup.into());
        self
    }

    /// Number of fetches so far, shared between clones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewSource for MockViewSource {
    async fn fetch(&self, module: &str) -> Result<String, ViewError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(ViewError::Source(format!(
                "mock view source refused `{module}`"
            )));
        }

        let module = sanitize_module(module);
        Ok(self.views.get(&module).cloned().unwrap_or_else(|| {
            format!("<section data-view=\"{module}\">{OUTLET}</section>")
        }))
    }
}

/// ViewLoader
///
/// Memoizing front of a `ViewSource`. The first request for a module fetches it;
/// concurrent first requests share that fetch; later requests get the cached view.
/// Failures are not cached, so the next activation tries again.
#[derive(Clone)]
pub struct ViewLoader {
    source: ViewSourceState,
    cache: Arc<Mutex<HashMap<String, Arc<OnceCell<Arc<LoadedView>>>>>>,
}

impl ViewLoader {
    pub fn new(source: ViewSourceState) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn load(&self, module: &str) -> Result<Arc<LoadedView>, ViewError> {
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.entry(module.to_string()).or_default().clone()
        };

        let view = cell
            .get_or_try_init(|| async {
                tracing::debug!(module, "loading view module");
                let markup = self.source.fetch(module).await.inspect_err(|e| {
                    tracing::warn!(module, error = %e, "view module failed to load");
                })?;
                Ok::<_, ViewError>(Arc::new(LoadedView {
                    module: module.to_string(),
                    markup,
                }))
            })
            .await?;

        Ok(Arc::clone(view))
    }

    /// Loads the view of every entry on a matched chain, outermost first.
    pub async fn load_chain(
        &self,
        chain: &[MatchedEntry],
    ) -> Result<Vec<Arc<LoadedView>>, ViewError> {
        let mut views = Vec::with_capacity(chain.len());
        for entry in chain {
            views.push(self.load(entry.view.module()).await?);
        }
        Ok(views)
    }

    /// preload_bound
    ///
    /// Fetches every directly bound view of the table. Deferred views are left for
    /// their first activation. Returns how many modules were loaded.
    pub async fn preload_bound(&self, table: &RouteTable) -> Result<usize, ViewError> {
        let mut loaded = 0;
        for view in table.views() {
            if let ViewRef::Bound(module) = view {
                self.load(module).await?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    pub fn is_cached(&self, module: &str) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(module)
            .is_some_and(|cell| cell.initialized())
    }

    pub fn cached_count(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }
}

/// compose
///
/// Renders a view chain by nesting each view into its parent's outlet. The first
/// outlet in a view's markup is its slot; in the innermost view the slot renders as
/// nothing. Later occurrences of the outlet text are kept verbatim.
pub fn compose(views: &[Arc<LoadedView>]) -> String {
    views
        .iter()
        .rev()
        .fold(None::<String>, |inner, view| {
            let child = inner.unwrap_or_default();
            Some(view.markup.replacen(OUTLET, &child, 1))
        })
        .unwrap_or_default()
}
