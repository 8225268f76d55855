//! Core error types for the pecan-rs framework.
//!
//! Every failure the dispatcher, the argument binder, a routing hook, or a
//! handler can produce is a variant of [`PecanError`]. Each variant maps to
//! an HTTP status code via [`PecanError::status_code`], which is how a failure
//! reaches the transport layer.

use thiserror::Error;

/// The reason argument binding could not satisfy a handler signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindErrorKind {
    /// A required parameter had no positional segment and no query/body value.
    MissingArgument,
    /// A value was present but could not be converted to the declared kind.
    TypeMismatch,
}

/// The primary error type for the pecan-rs framework.
///
/// # Examples
///
/// ```
/// use pecan_rs_core::PecanError;
///
/// let err = PecanError::abort(403, Some("members only"));
/// assert_eq!(err.status_code(), 403);
/// assert_eq!(err.to_string(), "Aborted with status 403: members only");
/// ```
#[derive(Error, Debug)]
pub enum PecanError {
    // ── Routing ──────────────────────────────────────────────────────

    /// No node, handler, or fallback hook matched the path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Application code terminated the request with an explicit status.
    #[error("Aborted with status {status}{}", detail_suffix(.detail))]
    Abort {
        /// The HTTP status code supplied by the caller.
        status: u16,
        /// Optional human-readable detail.
        detail: Option<String>,
    },

    /// A `_route` or `_lookup` hook failed with a non-HTTP error.
    #[error("Routing hook `{hook}` failed: {message}")]
    RouteOverrideFailure {
        /// The hook that failed, e.g. `_lookup`.
        hook: &'static str,
        /// The underlying error message.
        message: String,
    },

    // ── Argument binding ─────────────────────────────────────────────

    /// A required handler parameter received no value.
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// A parameter value could not be converted to the declared type.
    #[error("Invalid value {value:?} for argument `{param}`: expected {expected}")]
    TypeMismatch {
        /// The parameter name.
        param: String,
        /// The raw value that failed to convert.
        value: String,
        /// A description of the expected type.
        expected: &'static str,
    },

    /// Strict argument checking rejected an unexpected query/body key.
    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    // ── HTTP ─────────────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 405 Method Not Allowed.
    ///
    /// The dispatcher never produces this; methods without a dedicated
    /// callable run the default one. Handlers that serve only some methods
    /// return it from their default callable.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The controller tree or application is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization ────────────────────────────────────────────────

    /// Handler output could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PecanError {
    /// Creates an explicit abort carrying `status` and an optional detail.
    pub fn abort(status: u16, detail: Option<&str>) -> Self {
        Self::Abort {
            status,
            detail: detail.map(String::from),
        }
    }

    /// Returns the HTTP status code associated with this error.
    ///
    /// - `NotFound` -> 404
    /// - `Abort` -> the status supplied by the caller
    /// - `MissingArgument`, `TypeMismatch`, `UnexpectedArgument`, `BadRequest` -> 400
    /// - `MethodNotAllowed` -> 405
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Abort { status, .. } => *status,
            Self::MissingArgument(_)
            | Self::TypeMismatch { .. }
            | Self::UnexpectedArgument(_)
            | Self::BadRequest(_) => 400,
            Self::MethodNotAllowed(_) => 405,
            Self::RouteOverrideFailure { .. }
            | Self::InternalServerError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns the binding failure kind when this error came from the binder.
    pub const fn bind_error_kind(&self) -> Option<BindErrorKind> {
        match self {
            Self::MissingArgument(_) => Some(BindErrorKind::MissingArgument),
            Self::TypeMismatch { .. } => Some(BindErrorKind::TypeMismatch),
            _ => None,
        }
    }

    /// Returns `true` for errors that describe an HTTP outcome the client
    /// should see as-is (any 4xx, or an explicit abort).
    pub const fn is_http_outcome(&self) -> bool {
        matches!(self, Self::Abort { .. }) || self.status_code() < 500
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// A convenience type alias for `Result<T, PecanError>`.
pub type PecanResult<T> = Result<T, PecanError>;
