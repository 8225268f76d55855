//! HTTP request type.
//!
//! [`HttpRequest`] carries what dispatch and binding need from the transport:
//! the method, the raw path, the query string, the form-body parameters, and
//! the headers.

use http::{HeaderMap, Method};

use crate::querydict::QueryDict;

/// An incoming HTTP request.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::POST)
///     .path("/catalog/books/")
///     .query_string("page=1")
///     .body_param("title", "Dune")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::POST);
/// assert_eq!(request.path(), "/catalog/books/");
/// assert_eq!(request.get().get("page"), Some("1"));
/// assert_eq!(request.post().get("title"), Some("Dune"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    get: QueryDict,
    post: QueryDict,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from axum/hyper request parts and body bytes.
    ///
    /// Form-encoded bodies (`application/x-www-form-urlencoded`) are parsed
    /// into [`post`](Self::post); other bodies are kept raw.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let query_string = parts.uri.query().unwrap_or("").to_string();
        let is_form = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let post = if is_form {
            QueryDict::parse(&String::from_utf8_lossy(&body))
        } else {
            QueryDict::new()
        };

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            get: QueryDict::parse(&query_string),
            query_string,
            post,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the query-string parameters.
    pub const fn get(&self) -> &QueryDict {
        &self.get
    }

    /// Returns the form-body parameters.
    pub const fn post(&self) -> &QueryDict {
        &self.post
    }

    /// Returns query and body parameters merged, body taking precedence.
    pub fn params(&self) -> QueryDict {
        QueryDict::merge(&self.get, &self.post)
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the path with its query string, as sent by the client.
    pub fn full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }
}

/// Builder for [`HttpRequest`], used by tests and non-axum transports.
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    query_string: String,
    post: QueryDict,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl HttpRequestBuilder {
    /// Sets the HTTP method (default `GET`).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request path (default `/`). A `?query` suffix is split off
    /// into the query string.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        match path.split_once('?') {
            Some((p, q)) => {
                self.path = Some(p.to_string());
                self.query_string = q.to_string();
            }
            None => self.path = Some(path.to_string()),
        }
        self
    }

    /// Sets the raw query string.
    #[must_use]
    pub fn query_string(mut self, query_string: &str) -> Self {
        self.query_string = query_string.to_string();
        self
    }

    /// Adds a form-body parameter.
    #[must_use]
    pub fn body_param(mut self, key: &str, value: &str) -> Self {
        self.post.append(key, value);
        self
    }

    /// Adds a header, ignoring names or values that are not valid.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the raw body bytes.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the request.
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method.unwrap_or(Method::GET),
            path: self.path.unwrap_or_else(|| "/".to_string()),
            get: QueryDict::parse(&self.query_string),
            query_string: self.query_string,
            post: self.post,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = HttpRequest::builder().build();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
        assert!(request.get().is_empty());
        assert!(request.post().is_empty());
    }

    #[test]
    fn test_builder_splits_query_from_path() {
        let request = HttpRequest::builder().path("/search?q=rust&page=2").build();
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query_string(), "q=rust&page=2");
        assert_eq!(request.get().get("q"), Some("rust"));
        assert_eq!(request.full_path(), "/search?q=rust&page=2");
    }

    #[test]
    fn test_params_body_wins() {
        let request = HttpRequest::builder()
            .method(Method::POST)
            .path("/save?name=query&page=3")
            .body_param("name", "body")
            .build();
        let params = request.params();
        assert_eq!(params.get("name"), Some("body"));
        assert_eq!(params.get("page"), Some("3"));
    }

    #[test]
    fn test_from_axum_parses_form_body() {
        let (parts, ()) = http::Request::builder()
            .method(Method::POST)
            .uri("/books/new?draft=1")
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(())
            .unwrap()
            .into_parts();
        let request = HttpRequest::from_axum(parts, b"title=Dune&author=Herbert".to_vec());

        assert_eq!(request.path(), "/books/new");
        assert_eq!(request.get().get("draft"), Some("1"));
        assert_eq!(request.post().get("title"), Some("Dune"));
        assert_eq!(request.body(), b"title=Dune&author=Herbert");
    }

    #[test]
    fn test_from_axum_keeps_json_body_raw() {
        let (parts, ()) = http::Request::builder()
            .method(Method::POST)
            .uri("/api")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(())
            .unwrap()
            .into_parts();
        let request = HttpRequest::from_axum(parts, br#"{"a":1}"#.to_vec());
        assert!(request.post().is_empty());
        assert_eq!(request.body(), br#"{"a":1}"#);
    }

    #[test]
    fn test_header_builder() {
        let request = HttpRequest::builder().header("accept", "application/json").build();
        assert_eq!(request.headers()[http::header::ACCEPT], "application/json");
    }
}
