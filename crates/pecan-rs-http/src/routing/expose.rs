//! Exposure metadata.
//!
//! Every handler carries an [`Exposure`]: the default [`ExposureMetadata`]
//! plus optional per-format variants. The metadata decides whether the
//! handler is routable at all and how its output is rendered.

use std::collections::HashMap;

use super::path::content_type_for_format;

/// How a handler is exposed and rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureMetadata {
    /// Whether the dispatcher may select the handler.
    pub exposed: bool,
    /// The response content type.
    pub content_type: String,
    /// Template identifier; `"json"` selects the built-in JSON rendering.
    pub template: Option<String>,
    /// Whether the handler dispatches on the HTTP method.
    pub generic: bool,
}

impl Default for ExposureMetadata {
    fn default() -> Self {
        Self::new("text/html")
    }
}

impl ExposureMetadata {
    /// Exposed metadata with the given content type and no template.
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            exposed: true,
            content_type: content_type.into(),
            template: None,
            generic: false,
        }
    }

    /// Metadata rendering the handler output as JSON.
    pub fn json() -> Self {
        Self::new("application/json").with_template("json")
    }

    /// Metadata rendering through the named template.
    ///
    /// The content type is taken from the template's extension when it is a
    /// known format (`"book.xml"` → `application/xml`), `text/html` otherwise.
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        let content_type = template
            .rsplit_once('.')
            .and_then(|(_, ext)| content_type_for_format(ext))
            .unwrap_or("text/html");
        Self::new(content_type).with_template(template)
    }

    /// Sets the template identifier.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Returns `true` when the output is rendered as JSON.
    pub fn renders_json(&self) -> bool {
        self.template.as_deref() == Some("json")
            || (self.template.is_none() && self.content_type == "application/json")
    }
}

/// The default metadata of a handler plus its format variants.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::routing::expose::{Exposure, ExposureMetadata};
///
/// let exposure = Exposure::new(ExposureMetadata::template("books.html"))
///     .variant("json", ExposureMetadata::json());
///
/// assert_eq!(exposure.select(None).unwrap().content_type, "text/html");
/// assert_eq!(exposure.select(Some("json")).unwrap().content_type, "application/json");
/// assert_eq!(exposure.select(Some("html")).unwrap().content_type, "text/html");
/// assert!(exposure.select(Some("xml")).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exposure {
    default: ExposureMetadata,
    variants: HashMap<String, ExposureMetadata>,
}

impl Exposure {
    /// Creates an exposure from its default metadata.
    pub fn new(default: ExposureMetadata) -> Self {
        Self {
            default,
            variants: HashMap::new(),
        }
    }

    /// Adds a variant selected by the format `format`.
    #[must_use]
    pub fn variant(mut self, format: &str, metadata: ExposureMetadata) -> Self {
        self.variants.insert(format.to_ascii_lowercase(), metadata);
        self
    }

    /// Returns the default metadata.
    pub const fn default_metadata(&self) -> &ExposureMetadata {
        &self.default
    }

    pub(crate) fn default_metadata_mut(&mut self) -> &mut ExposureMetadata {
        &mut self.default
    }

    pub(crate) fn insert_variant(&mut self, format: &str, metadata: ExposureMetadata) {
        self.variants.insert(format.to_ascii_lowercase(), metadata);
    }

    /// Returns the formats with an explicit variant, sorted.
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.variants.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Whether the handler is routable.
    pub const fn is_exposed(&self) -> bool {
        self.default.exposed
    }

    /// Whether the handler dispatches on the HTTP method.
    pub const fn is_generic(&self) -> bool {
        self.default.generic
    }

    /// Selects the metadata for a desired format.
    ///
    /// - no format: the default metadata;
    /// - an exact variant for the format;
    /// - the default metadata when its content type is the one the format
    ///   stands for;
    /// - otherwise `None`.
    pub fn select(&self, format: Option<&str>) -> Option<&ExposureMetadata> {
        let Some(format) = format else {
            return Some(&self.default);
        };
        let format = format.to_ascii_lowercase();
        if let Some(metadata) = self.variants.get(&format) {
            return Some(metadata);
        }
        content_type_for_format(&format)
            .filter(|content_type| *content_type == self.default.content_type)
            .map(|_| &self.default)
    }
}
