//! HTTP response type and the redirect/abort primitives.
//!
//! Handlers never mutate a shared response object. They return a value (or an
//! [`HttpResponse`] directly), or fail with [`abort`], and the application
//! turns the outcome into an `HttpResponse`.

use axum::response::IntoResponse;
use http::{HeaderMap, HeaderValue, StatusCode};

use pecan_rs_core::PecanError;

use crate::routing::RouteFailure;

/// An HTTP response.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.text(), "Hello, World!");
/// ```
#[derive(Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    content_type: String,
    charset: String,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Creates a new `HttpResponse` with the given status code and text body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self::with_bytes(status, body.into().into_bytes())
    }

    /// Creates a new `HttpResponse` with the given status code and byte body.
    pub fn with_bytes(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
            content_type: "text/html".to_string(),
            charset: "utf-8".to_string(),
        }
    }

    /// 200 OK with a text body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// 404 Not Found with a text body.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// 400 Bad Request with a text body.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    /// 500 Internal Server Error with a text body.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Serializes `data` as a JSON response with the given status.
    ///
    /// # Errors
    ///
    /// Returns [`PecanError::SerializationError`] if `data` cannot be serialized.
    pub fn json<T: serde::Serialize>(status: StatusCode, data: &T) -> Result<Self, PecanError> {
        let body = serde_json::to_vec(data)
            .map_err(|e| PecanError::SerializationError(format!("JSON serialization error: {e}")))?;
        let mut response = Self::with_bytes(status, body);
        response.set_content_type("application/json");
        Ok(response)
    }

    /// Builds the response for a failed dispatch or handler.
    ///
    /// The body is the status reason; when `debug` is set the error message is
    /// appended.
    pub fn from_error(error: &PecanError, debug: bool) -> Self {
        let failure = RouteFailure::from(error);
        let status =
            StatusCode::from_u16(failure.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let title = status.canonical_reason().unwrap_or("Error");
        let body = if debug {
            format!("{} {title}\n\n{}", status.as_u16(), failure.reason)
        } else {
            format!("{} {title}", status.as_u16())
        };
        let mut response = Self::new(status, body);
        response.set_content_type("text/plain");
        response
    }

    /// Returns the HTTP status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the HTTP status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns a reference to the response headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, ignoring values that are not valid header text.
    pub fn set_header(&mut self, name: http::header::HeaderName, value: &str) {
        if let Ok(v) = HeaderValue::from_str(value) {
            self.headers.insert(name, v);
        }
    }

    /// Returns the content type (without charset).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type (without charset).
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Drops the body, keeping status and headers (used for `HEAD`).
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let content_type = self.full_content_type();
        let mut response = axum::response::Response::new(axum::body::Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Ok(ct) = HeaderValue::from_str(&content_type) {
            headers.insert(http::header::CONTENT_TYPE, ct);
        }
        for (key, value) in &self.headers {
            headers.insert(key, value.clone());
        }
        response
    }
}

/// Builds a redirect response to `location`.
///
/// `permanent` selects `301 Moved Permanently`; otherwise `302 Found`.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::redirect;
///
/// let response = redirect("/catalog/", false);
/// assert_eq!(response.status(), http::StatusCode::FOUND);
/// assert_eq!(response.headers()["location"], "/catalog/");
/// ```
pub fn redirect(location: &str, permanent: bool) -> HttpResponse {
    let status = if permanent {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::FOUND
    };
    let mut response = HttpResponse::new(status, "");
    response.set_header(http::header::LOCATION, location);
    response
}

/// Terminates dispatch or handling with `status`.
///
/// Return it as the error of a handler or hook:
///
/// ```
/// use pecan_rs_core::PecanResult;
/// use pecan_rs_http::abort;
///
/// fn must_be_admin(is_admin: bool) -> PecanResult<()> {
///     if !is_admin {
///         return Err(abort(403, Some("admins only")));
///     }
///     Ok(())
/// }
///
/// assert_eq!(must_be_admin(false).unwrap_err().status_code(), 403);
/// ```
pub fn abort(status: u16, detail: Option<&str>) -> PecanError {
    PecanError::abort(status, detail)
}
