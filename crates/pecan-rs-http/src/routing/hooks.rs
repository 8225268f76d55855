//! Routing hooks.
//!
//! A node may carry a [`LookupHook`] (`_lookup`), a default handler
//! (`_default`) and a [`RouteHook`] (`_route`). Closures with the right
//! signature implement both hook traits.

use std::sync::Arc;

use http::Method;

use pecan_rs_core::{PecanError, PecanResult};

use super::controller::ControllerNode;
use super::dispatcher::{ResolvedBy, RouteResult, Walk};
use super::handler::ExposedHandler;

/// The node a `_lookup` hook produced and the segments left to walk.
///
/// The node is request-scoped: it lives in the dispatch of one request and is
/// never stored in the shared tree.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub node: Arc<ControllerNode>,
    pub remainder: Vec<String>,
}

impl LookupResult {
    pub fn new<S: Into<String>>(
        node: Arc<ControllerNode>,
        remainder: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            node,
            remainder: remainder.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolves a segment that matched no literal child or handler.
pub trait LookupHook: Send + Sync {
    /// Returns the node to continue with, or `None` for `404 Not Found`.
    ///
    /// # Errors
    ///
    /// HTTP-class errors propagate as-is; anything else becomes a
    /// [`PecanError::RouteOverrideFailure`].
    fn lookup(&self, key: &str, rest: &[String]) -> PecanResult<Option<LookupResult>>;
}

impl<F> LookupHook for F
where
    F: Fn(&str, &[String]) -> PecanResult<Option<LookupResult>> + Send + Sync,
{
    fn lookup(&self, key: &str, rest: &[String]) -> PecanResult<Option<LookupResult>> {
        self(key, rest)
    }
}

/// Takes over routing for everything below a node.
pub trait RouteHook: Send + Sync {
    /// Resolves `remaining` to a handler.
    ///
    /// # Errors
    ///
    /// HTTP-class errors propagate as-is; anything else becomes a
    /// [`PecanError::RouteOverrideFailure`].
    fn route(&self, ctx: &RouteContext<'_>, remaining: &[String]) -> PecanResult<RouteResult>;
}

impl<F> RouteHook for F
where
    F: Fn(&RouteContext<'_>, &[String]) -> PecanResult<RouteResult> + Send + Sync,
{
    fn route(&self, ctx: &RouteContext<'_>, remaining: &[String]) -> PecanResult<RouteResult> {
        self(ctx, remaining)
    }
}

/// What a `_route` hook can see and do.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use pecan_rs_http::routing::{ControllerNode, Dispatcher, ExposedHandler, HandlerOutput};
///
/// let api = ControllerNode::builder("api")
///     .handler(ExposedHandler::new_sync("read", |_| Ok(HandlerOutput::Empty)))
///     .handler(ExposedHandler::new_sync("write", |_| Ok(HandlerOutput::Empty)))
///     .route(|ctx, remaining| {
///         if ctx.method() == Method::GET {
///             ctx.resolve_handler("read", remaining)
///         } else {
///             ctx.resolve_handler("write", remaining)
///         }
///     })
///     .build()
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(api);
/// let route = dispatcher.dispatch_path(&Method::POST, "/anything").unwrap();
/// assert_eq!(route.handler().name(), "write");
/// ```
pub struct RouteContext<'a> {
    walk: Walk<'a>,
    node: Arc<ControllerNode>,
}

impl<'a> RouteContext<'a> {
    pub(crate) const fn new(walk: Walk<'a>, node: Arc<ControllerNode>) -> Self {
        Self { walk, node }
    }

    pub fn method(&self) -> &Method {
        self.walk.method()
    }

    /// The node whose `_route` hook is running.
    pub const fn node(&self) -> &Arc<ControllerNode> {
        &self.node
    }

    /// Segments consumed before reaching this node.
    pub fn consumed(&self) -> &[String] {
        self.walk.consumed()
    }

    /// The desired output format, if the path carried one.
    pub fn format(&self) -> Option<&str> {
        self.walk.format()
    }

    /// Runs the normal resolution on this node, skipping its `_route` hook.
    ///
    /// # Errors
    ///
    /// Any dispatch failure, e.g. [`PecanError::NotFound`].
    pub fn default_route(&self, remaining: &[String]) -> PecanResult<RouteResult> {
        self.walk
            .clone()
            .run(Arc::clone(&self.node), remaining.to_vec(), true)
    }

    /// Continues the normal walk from `node`.
    ///
    /// Walking into the current node re-enters this hook.
    ///
    /// # Errors
    ///
    /// Any dispatch failure, e.g. [`PecanError::NotFound`].
    pub fn walk(&self, node: &Arc<ControllerNode>, remaining: &[String]) -> PecanResult<RouteResult> {
        self.walk
            .clone()
            .run(Arc::clone(node), remaining.to_vec(), false)
    }

    /// Resolves to this node's exposed handler `name`.
    ///
    /// # Errors
    ///
    /// [`PecanError::NotFound`] when the node has no exposed handler `name`.
    pub fn resolve_handler(&self, name: &str, remainder: &[String]) -> PecanResult<RouteResult> {
        let handler = self.node.exposed_handler(name).ok_or_else(|| {
            PecanError::NotFound(format!("`{}` has no exposed handler `{name}`", self.node.name()))
        })?;
        Ok(self.walk.resolve(
            &self.node,
            Arc::clone(handler),
            remainder.to_vec(),
            ResolvedBy::Route,
        ))
    }

    /// Resolves to an arbitrary handler, e.g. one built for this request.
    ///
    /// # Errors
    ///
    /// [`PecanError::NotFound`] when the handler is not exposed.
    pub fn resolve(
        &self,
        handler: Arc<ExposedHandler>,
        remainder: &[String],
    ) -> PecanResult<RouteResult> {
        if !handler.is_exposed() {
            return Err(PecanError::NotFound(format!(
                "handler `{}` is not exposed",
                handler.name()
            )));
        }
        Ok(self
            .walk
            .resolve(&self.node, handler, remainder.to_vec(), ResolvedBy::Route))
    }
}
