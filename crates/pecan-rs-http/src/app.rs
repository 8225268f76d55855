//! The application.
//!
//! [`Application`] owns the controller tree and the settings and turns an
//! [`HttpRequest`] into an [`HttpResponse`]: dispatch, canonical-URL
//! enforcement, metadata selection, argument binding, handler invocation and
//! rendering.
//!
//! ```rust,no_run
//! use pecan_rs_core::Settings;
//! use pecan_rs_http::routing::{ControllerNode, ExposedHandler};
//! use pecan_rs_http::Application;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = ControllerNode::builder("root")
//!     .handler(ExposedHandler::new_sync("index", |_| Ok("Hello, World!".into())))
//!     .build()?;
//!
//! Application::new(root, Settings::default()).run("127.0.0.1:8080").await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::response::IntoResponse;
use axum::routing::any;
use http::{Method, Request, StatusCode};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use pecan_rs_core::logging::request_span;
use pecan_rs_core::{PecanError, PecanResult, Settings};

use crate::request::HttpRequest;
use crate::response::{redirect, HttpResponse};
use crate::routing::binder::bind;
use crate::routing::controller::ControllerNode;
use crate::routing::dispatcher::{DispatchConfig, Dispatcher, RouteResult};
use crate::routing::expose::ExposureMetadata;
use crate::routing::handler::{HandlerCall, HandlerOutput};
use crate::routing::path::tokenize;

/// Renders a template with a JSON context.
pub trait Renderer: Send + Sync {
    /// # Errors
    ///
    /// Any error produced while loading or rendering `template`.
    fn render(&self, template: &str, context: &serde_json::Value) -> PecanResult<String>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &serde_json::Value) -> PecanResult<String> + Send + Sync,
{
    fn render(&self, template: &str, context: &serde_json::Value) -> PecanResult<String> {
        self(template, context)
    }
}

/// An object-dispatch web application.
#[derive(Clone)]
pub struct Application {
    dispatcher: Arc<Dispatcher>,
    settings: Arc<Settings>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("root", &self.dispatcher.root().name())
            .field("debug", &self.settings.debug)
            .field("has_renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Application {
    /// Creates an application serving `root`.
    pub fn new(root: Arc<ControllerNode>, settings: Settings) -> Self {
        let config = DispatchConfig::from(&settings.app);
        Self {
            dispatcher: Arc::new(Dispatcher::with_config(root, config)),
            settings: Arc::new(settings),
            renderer: None,
        }
    }

    /// Sets the renderer used for template ids other than `json`.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn root(&self) -> &Arc<ControllerNode> {
        self.dispatcher.root()
    }

    /// Dispatches `request` without invoking anything.
    ///
    /// # Errors
    ///
    /// Any dispatch failure; see [`Dispatcher::dispatch`].
    pub fn route(&self, request: &HttpRequest) -> PecanResult<RouteResult> {
        let mut path = tokenize(request.path());
        if self.settings.app.guess_content_type_from_ext {
            path = path.with_format_suffix();
        }
        self.dispatcher.dispatch(request.method(), &path)
    }

    /// Handles one request.
    ///
    /// Never fails: every error becomes a response carrying its status.
    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = request_span(&request_id, request.method().as_str(), request.path());
        let is_head = request.method() == Method::HEAD;

        let mut response = self.process(request).instrument(span).await;
        if is_head {
            response.clear_body();
        }
        response
    }

    async fn process(&self, request: HttpRequest) -> HttpResponse {
        match self.try_process(request).await {
            Ok(response) => {
                tracing::info!(status = response.status().as_u16(), "request handled");
                response
            }
            Err(error) => {
                let status = error.status_code();
                if status >= 500 {
                    tracing::error!(status, error = %error, "request failed");
                } else {
                    tracing::info!(status, error = %error, "request rejected");
                }
                HttpResponse::from_error(&error, self.settings.debug)
            }
        }
    }

    async fn try_process(&self, request: HttpRequest) -> PecanResult<HttpResponse> {
        let route = self.route(&request)?;

        if route.missing_trailing_slash() && self.settings.app.force_canonical {
            return canonical_redirect(&request);
        }

        let handler = Arc::clone(route.handler());
        let metadata = handler
            .exposure()
            .select(route.format())
            .cloned()
            .ok_or_else(|| {
                PecanError::NotFound(format!(
                    "`{}` is not exposed as `{}`",
                    handler.name(),
                    route.format().unwrap_or_default()
                ))
            })?;

        let params = request.params();
        let args = bind(
            handler.signature(),
            route.remainder(),
            &params,
            self.settings.app.strict_arguments,
        )?;

        let callable = Arc::clone(handler.callable_for(request.method()));
        let output = callable(HandlerCall {
            request,
            args,
            route,
        })
        .await?;

        self.render(&metadata, output)
    }

    fn render(&self, metadata: &ExposureMetadata, output: HandlerOutput) -> PecanResult<HttpResponse> {
        let value = match output {
            HandlerOutput::Response(response) => return Ok(response),
            HandlerOutput::Empty => {
                let mut response = HttpResponse::with_bytes(StatusCode::NO_CONTENT, Vec::new());
                response.set_content_type(metadata.content_type.as_str());
                return Ok(response);
            }
            HandlerOutput::Text(text) if !metadata.renders_json() => {
                let mut response = HttpResponse::ok(text);
                response.set_content_type(metadata.content_type.as_str());
                return Ok(response);
            }
            HandlerOutput::Text(text) => serde_json::Value::String(text),
            HandlerOutput::Json(value) => value,
        };

        match metadata.template.as_deref() {
            Some(template) if !metadata.renders_json() => {
                let renderer = self.renderer.as_ref().ok_or_else(|| {
                    PecanError::ImproperlyConfigured(format!(
                        "template `{template}` requires a renderer"
                    ))
                })?;
                let mut response = HttpResponse::ok(renderer.render(template, &value)?);
                response.set_content_type(metadata.content_type.as_str());
                Ok(response)
            }
            _ => {
                let mut response = HttpResponse::json(StatusCode::OK, &value)?;
                if metadata.renders_json() {
                    response.set_content_type(metadata.content_type.as_str());
                }
                Ok(response)
            }
        }
    }

    /// Converts the application into an axum router.
    ///
    /// When `app.static_root` is set, that directory is served under
    /// `app.static_url` ahead of dispatch.
    pub fn into_axum_router(self) -> axum::Router {
        let static_mount = static_mount(&self.settings);
        let handler = move |req: Request<Body>| {
            let app = self.clone();
            async move {
                let (parts, body) = req.into_parts();
                let body_bytes = axum::body::to_bytes(body, usize::MAX)
                    .await
                    .unwrap_or_default()
                    .to_vec();
                let request = HttpRequest::from_axum(parts, body_bytes);
                app.handle(request).await.into_response()
            }
        };

        let mut router = axum::Router::new()
            .route("/{*path}", any(handler.clone()))
            .route("/", any(handler));
        if let Some((url, root)) = static_mount {
            tracing::debug!(%url, root = %root.display(), "serving static files");
            router = router.nest_service(&url, ServeDir::new(root));
        }
        router.layer(TraceLayer::new_for_http())
    }

    /// Serves the application on `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(self, addr: &str) -> PecanResult<()> {
        let router = self.into_axum_router();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            PecanError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;

        tracing::info!(%addr, "serving");

        axum::serve(listener, router)
            .await
            .map_err(|e| PecanError::InternalServerError(format!("Server error: {e}")))?;

        Ok(())
    }
}

/// Redirects `GET`/`HEAD` to the path with a trailing slash.
fn canonical_redirect(request: &HttpRequest) -> PecanResult<HttpResponse> {
    let method = request.method();
    if method != Method::GET && method != Method::HEAD {
        return Err(PecanError::BadRequest(format!(
            "{} {} needs a trailing slash; a redirect cannot carry the request body",
            method,
            request.path()
        )));
    }
    let location = if request.query_string().is_empty() {
        format!("{}/", request.path())
    } else {
        format!("{}/?{}", request.path(), request.query_string())
    };
    tracing::debug!(%location, "redirecting to canonical URL");
    Ok(redirect(&location, false))
}

/// The `(prefix, directory)` pair to serve static files from, if any.
///
/// The prefix loses any trailing `/`; an empty or root prefix would shadow
/// dispatch and is ignored.
fn static_mount(settings: &Settings) -> Option<(String, PathBuf)> {
    let root = settings.app.static_root.clone()?;
    let url = settings.app.static_url.trim_end_matches('/');
    if !url.starts_with('/') || url.len() < 2 {
        tracing::warn!(url = %settings.app.static_url, "ignoring invalid static_url");
        return None;
    }
    Some((url.to_string(), root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::ExposedHandler;

    fn app() -> Application {
        let root = ControllerNode::builder("root")
            .handler(ExposedHandler::new_sync("index", |_| Ok("home".into())))
            .build()
            .unwrap();
        Application::new(root, Settings::default())
    }

    #[test]
    fn test_debug() {
        let debug = format!("{:?}", app());
        assert!(debug.contains("root"));
        assert!(debug.contains("has_renderer: false"));
    }

    #[test]
    fn test_into_axum_router() {
        let _router = app().into_axum_router();
    }

    #[test]
    fn test_static_mount() {
        assert!(static_mount(&Settings::default()).is_none());

        let mut settings = Settings::default();
        settings.app.static_root = Some(PathBuf::from("public"));
        settings.app.static_url = "/assets/".to_string();
        assert_eq!(
            static_mount(&settings),
            Some(("/assets".to_string(), PathBuf::from("public")))
        );

        settings.app.static_url = "/".to_string();
        assert!(static_mount(&settings).is_none());
        settings.app.static_url = "assets".to_string();
        assert!(static_mount(&settings).is_none());
    }

    #[test]
    fn test_route_splits_format_when_enabled() {
        let request = HttpRequest::builder().path("/index.json").build();
        assert_eq!(app().route(&request).unwrap().format(), Some("json"));

        let mut settings = Settings::default();
        settings.app.guess_content_type_from_ext = false;
        let root = Arc::clone(app().root());
        let plain = Application::new(root, settings);
        assert_eq!(plain.route(&request).unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_canonical_redirect_keeps_query() {
        let request = HttpRequest::builder().path("/books?page=2").build();
        let response = canonical_redirect(&request).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/books/?page=2");

        let post = HttpRequest::builder().method(Method::POST).path("/books").build();
        assert_eq!(canonical_redirect(&post).unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn test_handle_root() {
        let response = app().handle(HttpRequest::builder().build()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "home");
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        assert!(app().run("invalid-address").await.is_err());
    }
}
