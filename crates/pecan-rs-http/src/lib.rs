//! # pecan-rs-http
//!
//! HTTP layer for the pecan-rs framework: request and response types,
//! parameter dictionaries, object-dispatch routing, and the [`Application`]
//! that ties them together.
//!
//! ## Modules
//!
//! - [`request`] - [`HttpRequest`]
//! - [`response`] - [`HttpResponse`], [`redirect`], [`abort`]
//! - [`querydict`] - [`QueryDict`] for query and form parameters
//! - [`routing`] - Controller tree, dispatcher, argument binder
//! - [`app`] - Request handling and the axum adapter

pub mod app;
pub mod querydict;
pub mod request;
pub mod response;
pub mod routing;

pub use app::{Application, Renderer};
pub use querydict::QueryDict;
pub use request::HttpRequest;
pub use response::{abort, redirect, HttpResponse};
pub use routing::BoxFuture;
