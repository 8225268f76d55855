//! The controller tree.
//!
//! [`ControllerNode`] is an immutable, `Arc`-shared node: named children,
//! named handlers, and the optional `_lookup`, `_default` and `_route` hooks.
//! Nodes are assembled with [`ControllerBuilder`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pecan_rs_core::{PecanError, PecanResult};

use super::dispatcher::RouteResult;
use super::expose::ExposureMetadata;
use super::handler::ExposedHandler;
use super::hooks::{LookupHook, LookupResult, RouteContext, RouteHook};

/// A named entry of a node.
#[derive(Debug, Clone)]
pub enum NodeEntry {
    Child(Arc<ControllerNode>),
    Handler(Arc<ExposedHandler>),
}

/// A node of the controller tree.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::routing::{ControllerNode, ExposedHandler};
///
/// let books = ControllerNode::builder("books")
///     .handler(ExposedHandler::new_sync("index", |_| Ok("all books".into())))
///     .build()
///     .unwrap();
/// let root = ControllerNode::builder("root")
///     .child("books", books)
///     .build()
///     .unwrap();
///
/// assert!(root.child("books").is_some());
/// assert!(!root.is_exposed("books"));
/// assert!(root.child("books").unwrap().is_exposed("index"));
/// ```
pub struct ControllerNode {
    name: String,
    entries: HashMap<String, NodeEntry>,
    lookup: Option<Arc<dyn LookupHook>>,
    default: Option<Arc<ExposedHandler>>,
    route: Option<Arc<dyn RouteHook>>,
}

impl fmt::Debug for ControllerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ControllerNode")
            .field("name", &self.name)
            .field("entries", &names)
            .field("lookup", &self.lookup.is_some())
            .field("default", &self.default.as_ref().map(|h| h.name()))
            .field("route", &self.route.is_some())
            .finish()
    }
}

impl ControllerNode {
    /// Starts building a node called `name`.
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry registered under `name`, exposed or not.
    pub fn entry(&self, name: &str) -> Option<&NodeEntry> {
        self.entries.get(name)
    }

    /// Returns the child node `name`.
    pub fn child(&self, name: &str) -> Option<&Arc<Self>> {
        match self.entries.get(name)? {
            NodeEntry::Child(child) => Some(child),
            NodeEntry::Handler(_) => None,
        }
    }

    /// Returns the handler `name` if it is exposed.
    pub fn exposed_handler(&self, name: &str) -> Option<&Arc<ExposedHandler>> {
        match self.entries.get(name)? {
            NodeEntry::Handler(handler) if handler.is_exposed() => Some(handler),
            _ => None,
        }
    }

    /// Whether `name` is an exposed handler of this node.
    pub fn is_exposed(&self, name: &str) -> bool {
        self.exposed_handler(name).is_some()
    }

    /// The metadata of handler `name` for `format`.
    ///
    /// `None` when the handler is missing or unexposed, or has no metadata
    /// for the format.
    pub fn metadata_for(&self, name: &str, format: Option<&str>) -> Option<&ExposureMetadata> {
        self.exposed_handler(name)?.exposure().select(format)
    }

    pub fn lookup_hook(&self) -> Option<&Arc<dyn LookupHook>> {
        self.lookup.as_ref()
    }

    /// The `_default` handler, if it is exposed.
    pub fn default_handler(&self) -> Option<&Arc<ExposedHandler>> {
        self.default.as_ref().filter(|handler| handler.is_exposed())
    }

    pub fn route_hook(&self) -> Option<&Arc<dyn RouteHook>> {
        self.route.as_ref()
    }

    /// Child nodes sorted by name.
    pub fn children(&self) -> Vec<(&str, &Arc<Self>)> {
        let mut children: Vec<_> = self
            .entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                NodeEntry::Child(child) => Some((name.as_str(), child)),
                NodeEntry::Handler(_) => None,
            })
            .collect();
        children.sort_unstable_by_key(|(name, _)| *name);
        children
    }

    /// Handlers, exposed or not, sorted by name.
    pub fn handlers(&self) -> Vec<&Arc<ExposedHandler>> {
        let mut handlers: Vec<_> = self
            .entries
            .values()
            .filter_map(|entry| match entry {
                NodeEntry::Handler(handler) => Some(handler),
                NodeEntry::Child(_) => None,
            })
            .collect();
        handlers.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        handlers
    }
}

/// Builder for [`ControllerNode`].
///
/// Invalid names are recorded and reported by [`build`](Self::build).
pub struct ControllerBuilder {
    name: String,
    entries: HashMap<String, NodeEntry>,
    lookup: Option<Arc<dyn LookupHook>>,
    default: Option<Arc<ExposedHandler>>,
    route: Option<Arc<dyn RouteHook>>,
    errors: Vec<String>,
}

impl ControllerBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            lookup: None,
            default: None,
            route: None,
            errors: Vec::new(),
        }
    }

    fn insert(&mut self, name: String, entry: NodeEntry) {
        if name.is_empty() {
            self.errors.push("entry names must not be empty".to_string());
        } else if name.starts_with('_') {
            self.errors
                .push(format!("`{name}`: names starting with `_` are reserved for hooks"));
        } else if name.contains('/') {
            self.errors.push(format!("`{name}`: names must not contain `/`"));
        } else if self.entries.contains_key(&name) {
            self.errors.push(format!("`{name}` is registered twice"));
        } else {
            self.entries.insert(name, entry);
        }
    }

    /// Mounts `node` under the segment `name`.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, node: Arc<ControllerNode>) -> Self {
        self.insert(name.into(), NodeEntry::Child(node));
        self
    }

    /// Registers a handler under its own name.
    #[must_use]
    pub fn handler(mut self, handler: ExposedHandler) -> Self {
        self.insert(handler.name().to_string(), NodeEntry::Handler(Arc::new(handler)));
        self
    }

    /// Sets the `_lookup` hook from a closure.
    #[must_use]
    pub fn lookup<F>(self, f: F) -> Self
    where
        F: Fn(&str, &[String]) -> PecanResult<Option<LookupResult>> + Send + Sync + 'static,
    {
        self.lookup_hook(Arc::new(f))
    }

    /// Sets the `_lookup` hook.
    #[must_use]
    pub fn lookup_hook(mut self, hook: Arc<dyn LookupHook>) -> Self {
        self.lookup = Some(hook);
        self
    }

    /// Sets the `_default` handler.
    #[must_use]
    pub fn default(mut self, handler: ExposedHandler) -> Self {
        self.default = Some(Arc::new(handler));
        self
    }

    /// Sets the `_route` hook from a closure.
    #[must_use]
    pub fn route<F>(self, f: F) -> Self
    where
        F: Fn(&RouteContext<'_>, &[String]) -> PecanResult<RouteResult> + Send + Sync + 'static,
    {
        self.route_hook(Arc::new(f))
    }

    /// Sets the `_route` hook.
    #[must_use]
    pub fn route_hook(mut self, hook: Arc<dyn RouteHook>) -> Self {
        self.route = Some(hook);
        self
    }

    /// Builds the node.
    ///
    /// # Errors
    ///
    /// [`PecanError::ImproperlyConfigured`] listing every invalid or duplicate
    /// entry name.
    pub fn build(self) -> PecanResult<Arc<ControllerNode>> {
        if !self.errors.is_empty() {
            return Err(PecanError::ImproperlyConfigured(format!(
                "controller `{}`: {}",
                self.name,
                self.errors.join("; ")
            )));
        }
        Ok(Arc::new(ControllerNode {
            name: self.name,
            entries: self.entries,
            lookup: self.lookup,
            default: self.default,
            route: self.route,
        }))
    }
}
