//! Object-dispatch routing.
//!
//! A request path is resolved by walking a tree of [`ControllerNode`]s, one
//! segment at a time, instead of matching it against a pattern table.
//!
//! - [`path`] - Tokenization and format suffixes
//! - [`expose`] - Exposure metadata
//! - [`controller`] - The immutable controller tree
//! - [`handler`] - Exposed handlers and their outputs
//! - [`hooks`] - `_lookup` and `_route` hooks
//! - [`dispatcher`] - The segment-walking state machine
//! - [`binder`] - Binding path remainders and parameters to handler signatures
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use pecan_rs_http::routing::{
//!     ControllerNode, Dispatcher, ExposedHandler, HandlerOutput, LookupResult, ResolvedBy,
//! };
//!
//! let student = ControllerNode::builder("student")
//!     .handler(ExposedHandler::new_sync("name", |_| Ok("Ada".into())))
//!     .build()
//!     .unwrap();
//! let students = ControllerNode::builder("students")
//!     .lookup(move |_id, rest| Ok(Some(LookupResult::new(student.clone(), rest.to_vec()))))
//!     .build()
//!     .unwrap();
//! let root = ControllerNode::builder("root")
//!     .handler(ExposedHandler::new_sync("index", |_| Ok(HandlerOutput::Empty)))
//!     .child("students", students)
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(root);
//! let route = dispatcher.dispatch_path(&Method::GET, "/students/8/name").unwrap();
//! assert_eq!(route.handler().name(), "name");
//! assert_eq!(route.consumed(), ["students", "8", "name"]);
//!
//! let index = dispatcher.dispatch_path(&Method::GET, "/").unwrap();
//! assert_eq!(index.kind(), ResolvedBy::Index);
//! ```

pub mod binder;
pub mod controller;
pub mod dispatcher;
pub mod expose;
pub mod handler;
pub mod hooks;
pub mod path;

pub use binder::{bind, BoundArguments, BoundValue, HandlerSignature, Param, ParamKind};
pub use controller::{ControllerBuilder, ControllerNode, NodeEntry};
pub use dispatcher::{DispatchConfig, Dispatcher, ResolvedBy, RouteFailure, RouteResult};
pub use expose::{Exposure, ExposureMetadata};
pub use handler::{BoxFuture, ExposedHandler, HandlerCall, HandlerFn, HandlerOutput};
pub use hooks::{LookupHook, LookupResult, RouteContext, RouteHook};
pub use path::{tokenize, RequestPath};
