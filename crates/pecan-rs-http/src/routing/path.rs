//! Path tokenization.
//!
//! [`tokenize`] turns a raw URL path into the ordered, non-empty segments the
//! dispatcher walks, plus the trailing-slash flag that selects `index`
//! resolution. [`RequestPath::with_format_suffix`] strips a known format
//! extension (`/books.json`) off the final segment.

/// Known format extensions and the content types they select.
pub const KNOWN_FORMATS: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("rss", "application/rss+xml"),
    ("atom", "application/atom+xml"),
];

/// Returns the content type selected by a format extension, if it is known.
///
/// ```
/// use pecan_rs_http::routing::path::content_type_for_format;
///
/// assert_eq!(content_type_for_format("json"), Some("application/json"));
/// assert_eq!(content_type_for_format("JSON"), Some("application/json"));
/// assert_eq!(content_type_for_format("exe"), None);
/// ```
pub fn content_type_for_format(format: &str) -> Option<&'static str> {
    KNOWN_FORMATS
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(format))
        .map(|(_, content_type)| *content_type)
}

/// A tokenized request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
    trailing_slash: bool,
    format: Option<String>,
}

impl RequestPath {
    /// Builds a path from already-split segments.
    pub fn from_segments<S: Into<String>>(
        segments: impl IntoIterator<Item = S>,
        trailing_slash: bool,
    ) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            trailing_slash,
            format: None,
        }
    }

    /// The non-empty, percent-decoded segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether the raw path ended with `/`.
    pub const fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// The desired output format split off the final segment, if any.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Returns `true` when there are no segments (the application root).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits a known format extension off the final segment.
    ///
    /// `books.json` becomes the segment `books` with format `json`. Unknown
    /// extensions, dot-files (`.hidden`), and paths ending in `/` are left
    /// untouched.
    ///
    /// ```
    /// use pecan_rs_http::routing::path::tokenize;
    ///
    /// let path = tokenize("/catalog/books.json").with_format_suffix();
    /// assert_eq!(path.segments(), ["catalog", "books"]);
    /// assert_eq!(path.format(), Some("json"));
    ///
    /// let path = tokenize("/files/report.v2").with_format_suffix();
    /// assert_eq!(path.segments(), ["files", "report.v2"]);
    /// assert_eq!(path.format(), None);
    /// ```
    #[must_use]
    pub fn with_format_suffix(mut self) -> Self {
        if self.trailing_slash {
            return self;
        }
        let Some(last) = self.segments.last_mut() else {
            return self;
        };
        if let Some((name, ext)) = last.rsplit_once('.') {
            if !name.is_empty() && content_type_for_format(ext).is_some() {
                let format = ext.to_ascii_lowercase();
                *last = name.to_string();
                self.format = Some(format);
            }
        }
        self
    }
}

/// Splits a raw URL path into a [`RequestPath`].
///
/// Empty segments from repeated separators are discarded, each segment is
/// percent-decoded, and anything after `?` is ignored. Never fails: the empty
/// string and `/` both produce an empty segment list.
///
/// ```
/// use pecan_rs_http::routing::path::tokenize;
///
/// let path = tokenize("/catalog//books/");
/// assert_eq!(path.segments(), ["catalog", "books"]);
/// assert!(path.trailing_slash());
/// ```
pub fn tokenize(raw_path: &str) -> RequestPath {
    let path = raw_path.split_once('?').map_or(raw_path, |(p, _)| p);

    let segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            percent_encoding::percent_decode_str(segment)
                .decode_utf8_lossy()
                .into_owned()
        })
        .collect();

    RequestPath {
        segments,
        trailing_slash: path.ends_with('/'),
        format: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_root() {
        let path = tokenize("/");
        assert!(path.is_root());
        assert!(path.trailing_slash());

        let empty = tokenize("");
        assert!(empty.is_root());
        assert!(!empty.trailing_slash());
    }

    #[test]
    fn test_tokenize_nested() {
        let path = tokenize("/catalog/books/bestsellers");
        assert_eq!(path.segments(), ["catalog", "books", "bestsellers"]);
        assert!(!path.trailing_slash());
    }

    #[test]
    fn test_tokenize_repeated_separators() {
        let path = tokenize("//a///b//");
        assert_eq!(path.segments(), ["a", "b"]);
        assert!(path.trailing_slash());
    }

    #[test]
    fn test_tokenize_percent_decoding() {
        let path = tokenize("/people/J%C3%BCrgen/a+b/x%2Fy");
        assert_eq!(path.segments(), ["people", "Jürgen", "a+b", "x/y"]);
    }

    #[test]
    fn test_tokenize_ignores_query() {
        let path = tokenize("/search/?q=a/b");
        assert_eq!(path.segments(), ["search"]);
        assert!(path.trailing_slash());
    }

    #[test]
    fn test_format_suffix_known() {
        let path = tokenize("/books.XML").with_format_suffix();
        assert_eq!(path.segments(), ["books"]);
        assert_eq!(path.format(), Some("xml"));
    }

    #[test]
    fn test_format_suffix_ignored_cases() {
        assert_eq!(tokenize("/.json").with_format_suffix().segments(), [".json"]);
        assert_eq!(
            tokenize("/books.json/").with_format_suffix().segments(),
            ["books.json"]
        );
        assert_eq!(tokenize("/").with_format_suffix().format(), None);
        assert_eq!(tokenize("/a.tar.gz").with_format_suffix().format(), None);
    }

    #[test]
    fn test_format_suffix_only_last_segment() {
        let path = tokenize("/v1.json/items").with_format_suffix();
        assert_eq!(path.segments(), ["v1.json", "items"]);
        assert_eq!(path.format(), None);
    }

    #[test]
    fn test_from_segments() {
        let path = RequestPath::from_segments(["a", "b"], true);
        assert_eq!(path.segments(), ["a", "b"]);
        assert!(path.trailing_slash());
    }
}
