//! The dispatcher.
//!
//! Walks a [`RequestPath`] through the controller tree, one segment at a
//! time, until a handler is resolved or the walk fails. At every node the
//! order is fixed:
//!
//! 1. a `_route` hook takes the full remaining path;
//! 2. with no segments left, the exposed `index`, else `_default`;
//! 3. otherwise the first segment is matched against a child, then an exposed
//!    handler, then `_lookup`, then `_default`.

use std::fmt;
use std::sync::Arc;

use http::Method;

use pecan_rs_core::settings::AppSettings;
use pecan_rs_core::{PecanError, PecanResult};

use super::controller::{ControllerNode, NodeEntry};
use super::handler::ExposedHandler;
use super::hooks::RouteContext;
use super::path::{tokenize, RequestPath};

/// How a [`RouteResult`] was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    /// The node's `index`, with no segments left.
    Index,
    /// A handler matching a segment by name.
    Handler,
    /// The node's `_default` handler.
    Default,
    /// A `_route` hook.
    Route,
}

/// A successful dispatch.
#[derive(Clone)]
pub struct RouteResult {
    node: Arc<ControllerNode>,
    handler: Arc<ExposedHandler>,
    consumed: Vec<String>,
    remainder: Vec<String>,
    format: Option<String>,
    kind: ResolvedBy,
    missing_trailing_slash: bool,
}

impl RouteResult {
    /// The node owning the handler.
    pub const fn node(&self) -> &Arc<ControllerNode> {
        &self.node
    }

    pub const fn handler(&self) -> &Arc<ExposedHandler> {
        &self.handler
    }

    /// Segments consumed by the walk, including the handler's own name.
    pub fn consumed(&self) -> &[String] {
        &self.consumed
    }

    /// Segments left for the argument binder.
    pub fn remainder(&self) -> &[String] {
        &self.remainder
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub const fn kind(&self) -> ResolvedBy {
        self.kind
    }

    /// Set when `index` was reached through a path lacking its trailing slash.
    pub const fn missing_trailing_slash(&self) -> bool {
        self.missing_trailing_slash
    }
}

impl PartialEq for RouteResult {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
            && Arc::ptr_eq(&self.handler, &other.handler)
            && self.consumed == other.consumed
            && self.remainder == other.remainder
            && self.format == other.format
            && self.kind == other.kind
            && self.missing_trailing_slash == other.missing_trailing_slash
    }
}

impl fmt::Debug for RouteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteResult")
            .field("node", &self.node.name())
            .field("handler", &self.handler.name())
            .field("consumed", &self.consumed)
            .field("remainder", &self.remainder)
            .field("format", &self.format)
            .field("kind", &self.kind)
            .field("missing_trailing_slash", &self.missing_trailing_slash)
            .finish()
    }
}

/// A failed dispatch, as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFailure {
    pub status_code: u16,
    pub reason: String,
}

impl From<&PecanError> for RouteFailure {
    fn from(error: &PecanError) -> Self {
        Self {
            status_code: error.status_code(),
            reason: error.to_string(),
        }
    }
}

impl From<PecanError> for RouteFailure {
    fn from(error: PecanError) -> Self {
        Self::from(&error)
    }
}

/// Limits applied to a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum number of `_lookup` calls in one walk.
    pub max_lookup_depth: usize,
    /// Maximum number of `_route` calls in one walk, counting hooks
    /// re-entered through [`RouteContext::walk`].
    pub max_route_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_lookup_depth: 32,
            max_route_depth: 32,
        }
    }
}

impl From<&AppSettings> for DispatchConfig {
    fn from(app: &AppSettings) -> Self {
        Self {
            max_lookup_depth: app.max_lookup_depth,
            max_route_depth: app.max_route_depth,
        }
    }
}

/// Resolves request paths against a controller tree.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use pecan_rs_http::routing::{ControllerNode, Dispatcher, ExposedHandler, ResolvedBy};
///
/// let books = ControllerNode::builder("books")
///     .handler(ExposedHandler::new_sync("bestsellers", |_| Ok("top".into())))
///     .build()
///     .unwrap();
/// let root = ControllerNode::builder("root").child("books", books).build().unwrap();
///
/// let route = Dispatcher::new(root)
///     .dispatch_path(&Method::GET, "/books/bestsellers")
///     .unwrap();
/// assert_eq!(route.handler().name(), "bestsellers");
/// assert_eq!(route.kind(), ResolvedBy::Handler);
/// assert!(route.remainder().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    root: Arc<ControllerNode>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(root: Arc<ControllerNode>) -> Self {
        Self::with_config(root, DispatchConfig::default())
    }

    pub const fn with_config(root: Arc<ControllerNode>, config: DispatchConfig) -> Self {
        Self { root, config }
    }

    pub const fn root(&self) -> &Arc<ControllerNode> {
        &self.root
    }

    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolves `path` to a handler.
    ///
    /// # Errors
    ///
    /// - [`PecanError::NotFound`] when nothing matches;
    /// - HTTP-class errors returned by hooks, unchanged;
    /// - [`PecanError::RouteOverrideFailure`] for other hook failures and for
    ///   `_lookup` chains longer than `max_lookup_depth`, or `_route` hooks
    ///   re-entered more than `max_route_depth` times.
    pub fn dispatch(&self, method: &Method, path: &RequestPath) -> PecanResult<RouteResult> {
        let walk = Walk::new(method, path, &self.config);
        let result = walk.run(Arc::clone(&self.root), path.segments().to_vec(), false);

        match &result {
            Ok(route) => tracing::debug!(
                method = %method,
                handler = route.handler().name(),
                kind = ?route.kind(),
                remainder = ?route.remainder(),
                "dispatched"
            ),
            Err(error) => tracing::debug!(
                method = %method,
                segments = ?path.segments(),
                status = error.status_code(),
                error = %error,
                "dispatch failed"
            ),
        }
        result
    }

    /// Tokenizes `raw_path` and dispatches it. No format suffix is split.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_path(&self, method: &Method, raw_path: &str) -> PecanResult<RouteResult> {
        self.dispatch(method, &tokenize(raw_path))
    }
}

enum WalkState {
    Walking {
        node: Arc<ControllerNode>,
        remaining: Vec<String>,
        skip_route: bool,
    },
    Resolved(RouteResult),
    Failed(PecanError),
}

/// The per-request walk state shared with `_route` continuations.
#[derive(Clone)]
pub(crate) struct Walk<'a> {
    method: &'a Method,
    path: &'a RequestPath,
    config: &'a DispatchConfig,
    consumed: Vec<String>,
    lookups: usize,
    routes: usize,
}

impl<'a> Walk<'a> {
    const fn new(method: &'a Method, path: &'a RequestPath, config: &'a DispatchConfig) -> Self {
        Self {
            method,
            path,
            config,
            consumed: Vec::new(),
            lookups: 0,
            routes: 0,
        }
    }

    pub(crate) const fn method(&self) -> &Method {
        self.method
    }

    pub(crate) fn consumed(&self) -> &[String] {
        &self.consumed
    }

    pub(crate) fn format(&self) -> Option<&str> {
        self.path.format()
    }

    pub(crate) fn run(
        mut self,
        node: Arc<ControllerNode>,
        remaining: Vec<String>,
        skip_route: bool,
    ) -> PecanResult<RouteResult> {
        let mut state = WalkState::Walking {
            node,
            remaining,
            skip_route,
        };
        loop {
            state = match state {
                WalkState::Walking {
                    node,
                    remaining,
                    skip_route,
                } => self.step(node, remaining, skip_route),
                WalkState::Resolved(route) => return Ok(route),
                WalkState::Failed(error) => return Err(error),
            };
        }
    }

    fn step(
        &mut self,
        node: Arc<ControllerNode>,
        remaining: Vec<String>,
        skip_route: bool,
    ) -> WalkState {
        if !skip_route {
            if let Some(hook) = node.route_hook() {
                if self.routes >= self.config.max_route_depth {
                    return WalkState::Failed(PecanError::RouteOverrideFailure {
                        hook: "_route",
                        message: format!(
                            "more than {} nested route overrides",
                            self.config.max_route_depth
                        ),
                    });
                }
                self.routes += 1;
                let hook = Arc::clone(hook);
                let ctx = RouteContext::new(self.clone(), Arc::clone(&node));
                return match hook.route(&ctx, &remaining) {
                    Ok(route) => WalkState::Resolved(route),
                    Err(error) => WalkState::Failed(hook_error("_route", error)),
                };
            }
        }

        let Some((head, rest)) = remaining.split_first() else {
            if let Some(index) = node.exposed_handler("index") {
                let index = Arc::clone(index);
                return WalkState::Resolved(self.resolve(&node, index, Vec::new(), ResolvedBy::Index));
            }
            if let Some(default) = node.default_handler() {
                let default = Arc::clone(default);
                return WalkState::Resolved(self.resolve(&node, default, Vec::new(), ResolvedBy::Default));
            }
            return WalkState::Failed(self.not_found(&node, None));
        };

        match node.entry(head) {
            Some(NodeEntry::Child(child)) => {
                let child = Arc::clone(child);
                self.consumed.push(head.clone());
                return WalkState::Walking {
                    node: child,
                    remaining: rest.to_vec(),
                    skip_route: false,
                };
            }
            Some(NodeEntry::Handler(handler))
                if handler.is_exposed() && handler.signature().accepts_positional(rest.len()) =>
            {
                let handler = Arc::clone(handler);
                self.consumed.push(head.clone());
                return WalkState::Resolved(self.resolve(&node, handler, rest.to_vec(), ResolvedBy::Handler));
            }
            _ => {}
        }

        if let Some(hook) = node.lookup_hook() {
            if self.lookups >= self.config.max_lookup_depth {
                return WalkState::Failed(PecanError::RouteOverrideFailure {
                    hook: "_lookup",
                    message: format!(
                        "more than {} chained lookups",
                        self.config.max_lookup_depth
                    ),
                });
            }
            self.lookups += 1;
            return match hook.lookup(head, rest) {
                Ok(Some(found)) => {
                    self.consumed.push(head.clone());
                    if found.remainder.len() < rest.len() && rest.ends_with(&found.remainder) {
                        let taken = rest.len() - found.remainder.len();
                        self.consumed.extend_from_slice(&rest[..taken]);
                    }
                    WalkState::Walking {
                        node: found.node,
                        remaining: found.remainder,
                        skip_route: false,
                    }
                }
                Ok(None) => WalkState::Failed(self.not_found(&node, Some(head))),
                Err(error) => WalkState::Failed(hook_error("_lookup", error)),
            };
        }

        if let Some(default) = node.default_handler() {
            let default = Arc::clone(default);
            return WalkState::Resolved(self.resolve(&node, default, remaining, ResolvedBy::Default));
        }

        WalkState::Failed(self.not_found(&node, Some(head)))
    }

    pub(crate) fn resolve(
        &self,
        node: &Arc<ControllerNode>,
        handler: Arc<ExposedHandler>,
        remainder: Vec<String>,
        kind: ResolvedBy,
    ) -> RouteResult {
        let missing_trailing_slash = kind == ResolvedBy::Index
            && !self.path.trailing_slash()
            && !self.path.is_root()
            && self.path.format().is_none();
        RouteResult {
            node: Arc::clone(node),
            handler,
            consumed: self.consumed.clone(),
            remainder,
            format: self.path.format().map(str::to_string),
            kind,
            missing_trailing_slash,
        }
    }

    fn not_found(&self, node: &ControllerNode, segment: Option<&str>) -> PecanError {
        let at = if self.consumed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", self.consumed.join("/"))
        };
        match segment {
            Some(segment) => PecanError::NotFound(format!(
                "`{}` has nothing named `{segment}` at {at}",
                node.name()
            )),
            None => PecanError::NotFound(format!("`{}` has no index at {at}", node.name())),
        }
    }
}

/// Keeps HTTP outcomes from hooks, wraps everything else.
fn hook_error(hook: &'static str, error: PecanError) -> PecanError {
    if error.is_http_outcome() || matches!(error, PecanError::RouteOverrideFailure { .. }) {
        error
    } else {
        tracing::warn!(hook, error = %error, "routing hook failed");
        PecanError::RouteOverrideFailure {
            hook,
            message: error.to_string(),
        }
    }
}
