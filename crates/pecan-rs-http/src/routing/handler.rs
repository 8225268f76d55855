//! Exposed handlers.
//!
//! An [`ExposedHandler`] is the routable unit: a name, the
//! [`HandlerSignature`] its arguments are bound against, its [`Exposure`],
//! and an async callable. Generic handlers add per-method callables.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;

use pecan_rs_core::PecanResult;

use super::binder::{BoundArguments, HandlerSignature};
use super::dispatcher::RouteResult;
use super::expose::{Exposure, ExposureMetadata};
use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// The type-erased async callable behind a handler.
pub type HandlerFn = Arc<dyn Fn(HandlerCall) -> BoxFuture<PecanResult<HandlerOutput>> + Send + Sync>;

/// Everything a handler is invoked with.
#[derive(Debug, Clone)]
pub struct HandlerCall {
    /// The request being handled.
    pub request: HttpRequest,
    /// Arguments bound from the remainder and the request parameters.
    pub args: BoundArguments,
    /// The dispatch result that selected the handler.
    pub route: RouteResult,
}

/// The value a handler produces.
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    /// No body; answered with `204 No Content`.
    Empty,
    /// A text body, sent as-is with the selected content type. Templates
    /// are bypassed; JSON metadata encodes it as a JSON string.
    Text(String),
    /// A JSON value, serialized or handed to the renderer as context.
    Json(serde_json::Value),
    /// A complete response, passed through unchanged.
    Response(HttpResponse),
}

impl From<String> for HandlerOutput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for HandlerOutput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<serde_json::Value> for HandlerOutput {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<HttpResponse> for HandlerOutput {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

impl From<()> for HandlerOutput {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

fn erase<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HandlerCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PecanResult<HandlerOutput>> + Send + 'static,
{
    Arc::new(move |call| Box::pin(f(call)))
}

fn erase_sync<F>(f: F) -> HandlerFn
where
    F: Fn(HandlerCall) -> PecanResult<HandlerOutput> + Send + Sync + 'static,
{
    Arc::new(move |call| Box::pin(std::future::ready(f(call))))
}

/// A routable handler.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::routing::{ExposedHandler, HandlerSignature, Param};
///
/// let handler = ExposedHandler::new_sync("greet", |call| {
///     let name = call.args.str("name").unwrap_or("world");
///     Ok(format!("Hello, {name}!").into())
/// })
/// .with_signature(HandlerSignature::new().param(Param::optional("name", None)));
///
/// assert_eq!(handler.name(), "greet");
/// assert!(handler.is_exposed());
/// ```
#[derive(Clone)]
pub struct ExposedHandler {
    name: String,
    signature: HandlerSignature,
    exposure: Exposure,
    callable: HandlerFn,
    methods: HashMap<Method, HandlerFn>,
}

impl fmt::Debug for ExposedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ExposedHandler")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("exposure", &self.exposure)
            .field("methods", &methods)
            .finish_non_exhaustive()
    }
}

impl ExposedHandler {
    /// Creates an exposed `text/html` handler from an async function.
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(HandlerCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PecanResult<HandlerOutput>> + Send + 'static,
    {
        Self::from_fn(name, erase(f))
    }

    /// Creates an exposed `text/html` handler from a synchronous function.
    pub fn new_sync<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(HandlerCall) -> PecanResult<HandlerOutput> + Send + Sync + 'static,
    {
        Self::from_fn(name, erase_sync(f))
    }

    /// Creates a handler from an already type-erased callable.
    pub fn from_fn(name: impl Into<String>, callable: HandlerFn) -> Self {
        Self {
            name: name.into(),
            signature: HandlerSignature::default(),
            exposure: Exposure::default(),
            callable,
            methods: HashMap::new(),
        }
    }

    /// Sets the signature arguments are bound against.
    #[must_use]
    pub fn with_signature(mut self, signature: HandlerSignature) -> Self {
        self.signature = signature;
        self
    }

    /// Sets the default content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.exposure.default_metadata_mut().content_type = content_type.into();
        self
    }

    /// Sets the default template.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.exposure.default_metadata_mut().template = Some(template.into());
        self
    }

    /// Replaces the default metadata, keeping the `generic` flag.
    #[must_use]
    pub fn metadata(mut self, metadata: ExposureMetadata) -> Self {
        let generic = self.exposure.is_generic();
        *self.exposure.default_metadata_mut() = ExposureMetadata { generic, ..metadata };
        self
    }

    /// Adds the metadata used when the path requests `format`.
    #[must_use]
    pub fn variant(mut self, format: &str, metadata: ExposureMetadata) -> Self {
        self.exposure.insert_variant(format, metadata);
        self
    }

    /// Marks the handler as dispatching on the HTTP method.
    #[must_use]
    pub fn generic(mut self) -> Self {
        self.exposure.default_metadata_mut().generic = true;
        self
    }

    /// Registers the async callable used for `method`; implies [`generic`](Self::generic).
    #[must_use]
    pub fn when<F, Fut>(mut self, method: Method, f: F) -> Self
    where
        F: Fn(HandlerCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PecanResult<HandlerOutput>> + Send + 'static,
    {
        self.methods.insert(method, erase(f));
        self.generic()
    }

    /// Registers the synchronous callable used for `method`; implies [`generic`](Self::generic).
    #[must_use]
    pub fn when_sync<F>(mut self, method: Method, f: F) -> Self
    where
        F: Fn(HandlerCall) -> PecanResult<HandlerOutput> + Send + Sync + 'static,
    {
        self.methods.insert(method, erase_sync(f));
        self.generic()
    }

    /// Hides the handler from the dispatcher.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.exposure.default_metadata_mut().exposed = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn signature(&self) -> &HandlerSignature {
        &self.signature
    }

    pub const fn exposure(&self) -> &Exposure {
        &self.exposure
    }

    pub const fn is_exposed(&self) -> bool {
        self.exposure.is_exposed()
    }

    /// The methods with a dedicated callable, sorted.
    pub fn methods(&self) -> Vec<&Method> {
        let mut methods: Vec<&Method> = self.methods.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// The callable that handles `method`.
    ///
    /// Non-generic handlers always use their default callable. Generic ones
    /// use the variant for `method`, `HEAD` falls back to the `GET` variant,
    /// and anything else falls back to the default callable.
    pub fn callable_for(&self, method: &Method) -> &HandlerFn {
        if !self.exposure.is_generic() {
            return &self.callable;
        }
        self.methods
            .get(method)
            .or_else(|| {
                (*method == Method::HEAD)
                    .then(|| self.methods.get(&Method::GET))
                    .flatten()
            })
            .unwrap_or(&self.callable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{dispatcher::Dispatcher, ControllerNode};

    fn call_for(handler: ExposedHandler) -> HandlerCall {
        let root = ControllerNode::builder("root").handler(handler).build().unwrap();
        let route = Dispatcher::new(root).dispatch_path(&Method::GET, "/h").unwrap();
        HandlerCall {
            request: HttpRequest::builder().path("/h").build(),
            args: BoundArguments::default(),
            route,
        }
    }

    async fn text_of(handler: &ExposedHandler, method: &Method, call: HandlerCall) -> String {
        match (handler.callable_for(method))(call).await.unwrap() {
            HandlerOutput::Text(text) => text,
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn test_builder_sets_metadata() {
        let handler = ExposedHandler::new_sync("h", |_| Ok(HandlerOutput::Empty))
            .content_type("text/plain")
            .template("h.txt")
            .variant("json", ExposureMetadata::json());
        let meta = handler.exposure().default_metadata();
        assert_eq!(meta.content_type, "text/plain");
        assert_eq!(meta.template.as_deref(), Some("h.txt"));
        assert_eq!(handler.exposure().formats(), vec!["json"]);
    }

    #[test]
    fn test_hidden() {
        let handler = ExposedHandler::new_sync("h", |_| Ok(HandlerOutput::Empty)).hidden();
        assert!(!handler.is_exposed());
    }

    #[test]
    fn test_metadata_keeps_generic() {
        let handler = ExposedHandler::new_sync("h", |_| Ok(HandlerOutput::Empty))
            .when_sync(Method::POST, |_| Ok(HandlerOutput::Empty))
            .metadata(ExposureMetadata::json());
        assert!(handler.exposure().is_generic());
        assert!(handler.exposure().default_metadata().renders_json());
    }

    #[tokio::test]
    async fn test_callable_for_generic() {
        let handler = ExposedHandler::new_sync("h", |_| Ok("default".into()))
            .when_sync(Method::GET, |_| Ok("get".into()))
            .when(Method::POST, |_| async { Ok("post".into()) });

        assert_eq!(handler.methods(), vec![&Method::GET, &Method::POST]);
        let call = call_for(handler.clone());
        assert_eq!(text_of(&handler, &Method::GET, call.clone()).await, "get");
        assert_eq!(text_of(&handler, &Method::POST, call.clone()).await, "post");
        assert_eq!(text_of(&handler, &Method::HEAD, call.clone()).await, "get");
        assert_eq!(text_of(&handler, &Method::DELETE, call).await, "default");
    }

    #[tokio::test]
    async fn test_callable_for_plain_handler_ignores_method() {
        let handler = ExposedHandler::new("h", |_| async { Ok("only".into()) });
        let call = call_for(handler.clone());
        assert_eq!(text_of(&handler, &Method::PUT, call).await, "only");
    }
}
