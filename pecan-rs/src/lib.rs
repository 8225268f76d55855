//! # pecan-rs
//!
//! An object-dispatch web framework for Rust.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `pecan-rs` to get the entire framework, or depend on
//! individual crates for finer-grained control.
//!
//! ```
//! use pecan_rs::prelude::*;
//!
//! let root = ControllerNode::builder("root")
//!     .handler(ExposedHandler::new_sync("index", |_| Ok("home".into())))
//!     .build()
//!     .unwrap();
//! let app = Application::new(root, Settings::default());
//! assert_eq!(app.root().name(), "root");
//! ```

/// Settings, error types, and logging setup.
pub use pecan_rs_core as core;

/// HTTP layer: Request, Response, controller trees, dispatcher, Application.
#[cfg(feature = "http")]
pub use pecan_rs_http as http;

/// Management commands (CLI): `serve` and `routes`.
#[cfg(feature = "cli")]
pub use pecan_rs_cli as cli;

pub use async_trait;
pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The types most applications need, in one import.
pub mod prelude {
    pub use pecan_rs_core::{PecanError, PecanResult, Settings};

    #[cfg(feature = "http")]
    pub use pecan_rs_http::routing::{
        ControllerNode, ExposedHandler, ExposureMetadata, HandlerCall, HandlerOutput,
        HandlerSignature, LookupResult, Param, ParamKind, RouteContext,
    };
    #[cfg(feature = "http")]
    pub use pecan_rs_http::{abort, redirect, Application, HttpRequest, HttpResponse};

    #[cfg(feature = "cli")]
    pub use pecan_rs_cli::AppFactory;
}
