//! Client-side routes: four pages, one dynamic segment, a before-each hook
//! that keeps the document title in sync.

use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use tracing::info;

use crate::scope::PageScope;

pub const APP_NAME: &str = "A股量化交易筛选系统";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    WeekendScan,
    DailyPool,
    Signals,
    StockDetail { code: String },
}

/// One row of the static route table.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteDef {
    pub name: &'static str,
    pub path: &'static str,
    pub title: &'static str,
}

pub static ROUTES: [RouteDef; 4] = [
    RouteDef {
        name: "WeekendScan",
        path: "/",
        title: "周末扫描结果",
    },
    RouteDef {
        name: "DailyPool",
        path: "/daily-pool",
        title: "日筛选池",
    },
    RouteDef {
        name: "Signals",
        path: "/signals",
        title: "交易信号",
    },
    RouteDef {
        name: "StockDetail",
        path: "/stock/:code",
        title: "个股详情",
    },
];

/// A path matched against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub def: &'static RouteDef,
    pub page: Page,
    pub path: String,
}

impl Route {
    pub fn title(&self) -> &'static str {
        self.def.title
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("No route matches {0}")]
    NotFound(String),

    #[error("Navigation to {0} was cancelled by a guard")]
    Cancelled(String),
}

/// Match `path` against the route table. Query string, fragment and a
/// trailing slash are ignored, and static segments match without regard to
/// ASCII case. A captured `:code` keeps the caller's spelling.
pub fn resolve(path: &str) -> Option<Route> {
    let bare = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = bare.trim_end_matches('/');
    let normalized = if trimmed.is_empty() { "/" } else { trimmed };

    ROUTES.iter().find_map(|def| {
        match_pattern(def.path, normalized).map(|param| Route {
            def,
            page: page_for(def, param),
            path: normalized.to_string(),
        })
    })
}

/// Returns `Some(param)` when `path` matches; `param` is the `:code`
/// segment for the one dynamic route.
fn match_pattern(pattern: &str, path: &str) -> Option<Option<String>> {
    let mut pat = pattern.split('/');
    let mut segs = path.split('/');
    let mut param = None;

    loop {
        match (pat.next(), segs.next()) {
            (None, None) => return Some(param),
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() {
                    return None;
                }
                param = Some(s.to_string());
            }
            (Some(p), Some(s)) if p.eq_ignore_ascii_case(s) => {}
            _ => return None,
        }
    }
}

fn page_for(def: &RouteDef, param: Option<String>) -> Page {
    match def.name {
        "DailyPool" => Page::DailyPool,
        "Signals" => Page::Signals,
        "StockDetail" => Page::StockDetail {
            code: param.unwrap_or_default(),
        },
        _ => Page::WeekendScan,
    }
}

/// The browser-tab title.
#[derive(Debug, Default)]
pub struct Document {
    title: RwLock<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> String {
        self.title
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let mut guard = self
            .title
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = title.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Cancel,
}

/// Runs synchronously before every transition.
pub trait NavigationGuard: Send + Sync {
    fn before_each(&self, to: &Route, from: Option<&Route>) -> GuardDecision;
}

/// Writes `"{route title} - {app name}"` into the document title.
pub struct TitleGuard {
    document: Arc<Document>,
    app_name: String,
}

impl TitleGuard {
    pub fn new(document: Arc<Document>, app_name: impl Into<String>) -> Self {
        Self {
            document,
            app_name: app_name.into(),
        }
    }
}

impl NavigationGuard for TitleGuard {
    fn before_each(&self, to: &Route, _from: Option<&Route>) -> GuardDecision {
        self.document
            .set_title(format!("{} - {}", to.title(), self.app_name));
        GuardDecision::Allow
    }
}

/// A completed transition: where we are now, and the scope the page's
/// loads should run under.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub route: Route,
    pub scope: PageScope,
}

struct Active {
    route: Route,
    scope: PageScope,
}

pub struct Router {
    guards: Vec<Arc<dyn NavigationGuard>>,
    current: Mutex<Option<Active>>,
}

impl Router {
    /// Router with the title guard installed.
    pub fn new(document: Arc<Document>) -> Self {
        Self::with_guards(vec![Arc::new(TitleGuard::new(document, APP_NAME))])
    }

    pub fn with_guards(guards: Vec<Arc<dyn NavigationGuard>>) -> Self {
        Self {
            guards,
            current: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<Route> {
        self.lock().as_ref().map(|a| a.route.clone())
    }

    /// Resolve `path`, run every guard, then make it the current page.
    /// The previous page's scope is cancelled so its late responses are
    /// dropped.
    pub fn navigate(&self, path: &str) -> Result<Navigation, RouterError> {
        let route = resolve(path).ok_or_else(|| RouterError::NotFound(path.to_string()))?;

        // Guards may call back into the router, so run them unlocked.
        let from = self.current();
        for guard in &self.guards {
            if guard.before_each(&route, from.as_ref()) == GuardDecision::Cancel {
                info!(to = route.path.as_str(), "Navigation cancelled by guard");
                return Err(RouterError::Cancelled(route.path));
            }
        }

        let scope = PageScope::new();
        if let Some(prev) = self.lock().replace(Active {
            route: route.clone(),
            scope: scope.clone(),
        }) {
            prev.scope.cancel();
        }

        info!(to = route.path.as_str(), page = route.def.name, "Navigated");
        Ok(Navigation { route, scope })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Active>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
