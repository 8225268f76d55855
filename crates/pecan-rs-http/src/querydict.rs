//! Query string and form-body parameters.
//!
//! [`QueryDict`] wraps [`MultiValueDict`] for GET and POST parameters.
//! [`QueryDict::merge`] builds the single namespace the argument binder reads
//! from, where body parameters win over query parameters.

use pecan_rs_core::utils::MultiValueDict;

/// A multi-valued, insertion-ordered dictionary of request parameters.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color").unwrap(), ["red", "blue"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: MultiValueDict<String, String>,
}

impl QueryDict {
    /// Creates an empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded string (`"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space, and keeps repeated keys.
    pub fn parse(query_string: &str) -> Self {
        let data = query_string
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (percent_decode(key), percent_decode(value))
            })
            .collect();
        Self { data }
    }

    /// Builds a `QueryDict` from key/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Merges query and body parameters into one namespace.
    ///
    /// Every key present in `body` replaces the same key from `query`
    /// entirely, including all of its values.
    ///
    /// ```
    /// use pecan_rs_http::QueryDict;
    ///
    /// let merged = QueryDict::merge(
    ///     &QueryDict::parse("a=query&b=query"),
    ///     &QueryDict::parse("b=body"),
    /// );
    /// assert_eq!(merged.get("a"), Some("query"));
    /// assert_eq!(merged.get("b"), Some("body"));
    /// ```
    pub fn merge(query: &Self, body: &Self) -> Self {
        let mut data = query.data.clone();
        data.extend_replacing(body.data.clone());
        Self { data }
    }

    /// Returns the last value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Returns all values for the given key.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get_list(key)
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.append(key.into(), value.into());
    }

    /// Sets a single value for the given key, replacing any existing values.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.set(key.into(), value.into());
    }

    /// Encodes this `QueryDict` as a URL query string, in insertion order.
    pub fn urlencode(&self) -> String {
        self.data
            .iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .map(move |value| format!("{}={}", percent_encode(key), percent_encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns an iterator over (key, values) pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Decodes a form-encoded component (`+` is a space).
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_keys() {
        let qd = QueryDict::parse("a=1&b=2&c=3");
        assert_eq!(qd.get("a"), Some("1"));
        assert_eq!(qd.get("b"), Some("2"));
        assert_eq!(qd.get("c"), Some("3"));
        assert_eq!(qd.len(), 3);
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("color=red&color=blue&color=green");
        assert_eq!(qd.get("color"), Some("green"));
        assert_eq!(qd.get_list("color").unwrap(), ["red", "blue", "green"]);
    }

    #[test]
    fn test_parse_empty_and_valueless() {
        assert!(QueryDict::parse("").is_empty());
        assert_eq!(QueryDict::parse("key").get("key"), Some(""));
        assert_eq!(QueryDict::parse("key=").get("key"), Some(""));
        assert_eq!(QueryDict::parse("a=1&&b=2").len(), 2);
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("name=hello%20world&city=New+York&eq=a%3Db");
        assert_eq!(qd.get("name"), Some("hello world"));
        assert_eq!(qd.get("city"), Some("New York"));
        assert_eq!(qd.get("eq"), Some("a=b"));
    }

    #[test]
    fn test_merge_body_wins_whole_key() {
        let query = QueryDict::parse("tag=a&tag=b&page=1");
        let body = QueryDict::parse("tag=c");
        let merged = QueryDict::merge(&query, &body);
        assert_eq!(merged.get_list("tag").unwrap(), ["c"]);
        assert_eq!(merged.get("page"), Some("1"));
    }

    #[test]
    fn test_merge_keeps_query_order_then_body_additions() {
        let merged = QueryDict::merge(&QueryDict::parse("b=1&a=2"), &QueryDict::parse("c=3&a=4"));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_urlencode() {
        let mut qd = QueryDict::new();
        qd.set("name", "hello world");
        qd.append("n", "1");
        qd.append("n", "2");
        assert_eq!(qd.urlencode(), "name=hello%20world&n=1&n=2");
    }

    #[test]
    fn test_from_pairs() {
        let qd = QueryDict::from_pairs([("a", "1"), ("b", "2")]);
        assert!(qd.contains_key("a"));
        assert_eq!(qd.get("b"), Some("2"));
        assert!(!qd.contains_key("c"));
    }
}
