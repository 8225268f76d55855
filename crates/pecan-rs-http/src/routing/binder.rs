//! Argument binding.
//!
//! [`bind`] maps the unconsumed path segments and the merged query/body
//! parameters onto a handler's [`HandlerSignature`], producing
//! [`BoundArguments`] or a 4xx error.

use std::collections::{HashMap, HashSet};

use pecan_rs_core::{PecanError, PecanResult};

use crate::querydict::QueryDict;

/// The type a parameter value is converted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParamKind {
    /// Kept as the raw string.
    #[default]
    Str,
    /// A signed 64-bit integer.
    Int,
    /// A 64-bit float.
    Float,
    /// `true/false`, `1/0`, `yes/no`, `on/off`.
    Bool,
    /// Every value given for the key.
    List,
}

impl ParamKind {
    const fn expected(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::List => "list",
        }
    }
}

/// A named handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    required: bool,
    default: Option<String>,
}

impl Param {
    /// A parameter that must receive a value.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Str,
            required: true,
            default: None,
        }
    }

    /// A parameter that falls back to `default` (or stays unbound when `None`).
    pub fn optional(name: impl Into<String>, default: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Str,
            required: false,
            default: default.map(str::to_string),
        }
    }

    /// Sets the conversion applied to the value.
    #[must_use]
    pub const fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The conversion applied to the value.
    pub const fn param_kind(&self) -> ParamKind {
        self.kind
    }

    /// Whether a value is mandatory.
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// The parameters a handler accepts.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::routing::binder::{HandlerSignature, Param, ParamKind};
///
/// let signature = HandlerSignature::new()
///     .param(Param::required("id").kind(ParamKind::Int))
///     .param(Param::optional("page", Some("1")))
///     .varkw();
///
/// assert!(signature.accepts_positional(2));
/// assert!(!signature.accepts_positional(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerSignature {
    params: Vec<Param>,
    varargs: bool,
    varkw: bool,
}

impl HandlerSignature {
    /// A signature accepting no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Accepts any number of extra positional segments.
    #[must_use]
    pub const fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    /// Accepts any extra keyword parameters.
    #[must_use]
    pub const fn varkw(mut self) -> Self {
        self.varkw = true;
        self
    }

    /// The named parameters in order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Whether extra positional segments are accepted.
    pub const fn has_varargs(&self) -> bool {
        self.varargs
    }

    /// Whether extra keyword parameters are accepted.
    pub const fn has_varkw(&self) -> bool {
        self.varkw
    }

    /// Whether `count` positional segments can be bound.
    pub fn accepts_positional(&self, count: usize) -> bool {
        self.varargs || count <= self.params.len()
    }
}

/// A converted argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl BoundValue {
    /// The value as a string slice, when it is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&BoundValue> for serde_json::Value {
    fn from(value: &BoundValue) -> Self {
        match value {
            BoundValue::Str(s) => Self::from(s.as_str()),
            BoundValue::Int(i) => Self::from(*i),
            BoundValue::Float(f) => Self::from(*f),
            BoundValue::Bool(b) => Self::from(*b),
            BoundValue::List(items) => Self::from(items.clone()),
        }
    }
}

/// The arguments a handler is invoked with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    positional: Vec<String>,
    named: HashMap<String, BoundValue>,
    extra: HashMap<String, BoundValue>,
}

impl BoundArguments {
    /// Returns the named argument `name`.
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.named.get(name)
    }

    /// Returns the named argument as a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(BoundValue::as_str)
    }

    /// Returns the named argument as an integer.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            BoundValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the named argument as a float.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            BoundValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the named argument as a bool.
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            BoundValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the named argument as a list.
    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.get(name)? {
            BoundValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Segments bound to the catch-all positional parameter.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Named arguments.
    pub const fn named(&self) -> &HashMap<String, BoundValue> {
        &self.named
    }

    /// Keys collected by the catch-all keyword parameter.
    pub const fn extra(&self) -> &HashMap<String, BoundValue> {
        &self.extra
    }
}

/// Binds `remainder` and `params` to `signature`.
///
/// Remainder segments fill named parameters in order, and overflow into the
/// catch-all positional. Named parameters still empty are filled from
/// `params`. Catch-all keyword collects the keys nothing else consumed.
///
/// # Errors
///
/// - [`PecanError::NotFound`] when segments are left over and the signature
///   has no catch-all positional;
/// - [`PecanError::MissingArgument`] for a required parameter without value;
/// - [`PecanError::TypeMismatch`] when a value does not convert;
/// - [`PecanError::UnexpectedArgument`] for an unknown key when `strict`.
///
/// # Examples
///
/// ```
/// use pecan_rs_http::QueryDict;
/// use pecan_rs_http::routing::binder::{bind, HandlerSignature, Param, ParamKind};
///
/// let signature = HandlerSignature::new()
///     .param(Param::required("id").kind(ParamKind::Int))
///     .param(Param::optional("sort", Some("title")));
///
/// let args = bind(&signature, &["42".to_string()], &QueryDict::parse("sort=year"), false).unwrap();
/// assert_eq!(args.int("id"), Some(42));
/// assert_eq!(args.str("sort"), Some("year"));
/// ```
pub fn bind(
    signature: &HandlerSignature,
    remainder: &[String],
    params: &QueryDict,
    strict: bool,
) -> PecanResult<BoundArguments> {
    if !signature.accepts_positional(remainder.len()) {
        return Err(PecanError::NotFound(format!(
            "{} unexpected path segment(s): /{}",
            remainder.len() - signature.params.len(),
            remainder[signature.params.len()..].join("/")
        )));
    }

    let mut args = BoundArguments::default();
    let mut consumed: HashSet<&str> = HashSet::new();
    let split = remainder.len().min(signature.params.len());
    let (by_position, overflow) = remainder.split_at(split);

    for (param, segment) in signature.params.iter().zip(by_position) {
        let value = convert(param, std::slice::from_ref(segment))?;
        args.named.insert(param.name.clone(), value);
        consumed.insert(param.name.as_str());
    }
    args.positional = overflow.to_vec();

    for param in &signature.params[split..] {
        consumed.insert(param.name.as_str());
        if let Some(values) = params.get_list(&param.name).filter(|v| !v.is_empty()) {
            let value = convert(param, values)?;
            args.named.insert(param.name.clone(), value);
        } else if let Some(default) = &param.default {
            let value = convert(param, std::slice::from_ref(default))?;
            args.named.insert(param.name.clone(), value);
        } else if param.required {
            return Err(PecanError::MissingArgument(param.name.clone()));
        }
    }

    for (key, values) in params.iter() {
        if consumed.contains(key) {
            continue;
        }
        if signature.varkw {
            let value = match values {
                [single] => BoundValue::Str(single.clone()),
                many => BoundValue::List(many.to_vec()),
            };
            args.extra.insert(key.to_string(), value);
        } else if strict {
            return Err(PecanError::UnexpectedArgument(key.to_string()));
        }
    }

    Ok(args)
}

fn convert(param: &Param, values: &[String]) -> PecanResult<BoundValue> {
    if param.kind == ParamKind::List {
        return Ok(BoundValue::List(values.to_vec()));
    }
    let raw = values.last().map_or("", String::as_str);
    let mismatch = || PecanError::TypeMismatch {
        param: param.name.clone(),
        value: raw.to_string(),
        expected: param.kind.expected(),
    };
    match param.kind {
        ParamKind::Str | ParamKind::List => Ok(BoundValue::Str(raw.to_string())),
        ParamKind::Int => raw.trim().parse().map(BoundValue::Int).map_err(|_| mismatch()),
        ParamKind::Float => raw.trim().parse().map(BoundValue::Float).map_err(|_| mismatch()),
        ParamKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(BoundValue::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(BoundValue::Bool(false)),
            _ => Err(mismatch()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pecan_rs_core::error::BindErrorKind;

    fn segs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_positional_fills_named_then_varargs() {
        let sig = HandlerSignature::new()
            .param(Param::required("a"))
            .varargs();
        let args = bind(&sig, &segs(&["x", "y", "z"]), &QueryDict::new(), false).unwrap();
        assert_eq!(args.str("a"), Some("x"));
        assert_eq!(args.positional(), ["y", "z"]);
    }

    #[test]
    fn test_too_many_segments_is_not_found() {
        let sig = HandlerSignature::new().param(Param::required("a"));
        let err = bind(&sig, &segs(&["x", "y"]), &QueryDict::new(), false).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_named_from_params() {
        let sig = HandlerSignature::new()
            .param(Param::required("name"))
            .param(Param::optional("age", None).kind(ParamKind::Int));
        let args = bind(&sig, &[], &QueryDict::parse("name=ada&age=36"), false).unwrap();
        assert_eq!(args.str("name"), Some("ada"));
        assert_eq!(args.int("age"), Some(36));
    }

    #[test]
    fn test_missing_required() {
        let sig = HandlerSignature::new().param(Param::required("name"));
        let err = bind(&sig, &[], &QueryDict::new(), false).unwrap_err();
        assert_eq!(err.bind_error_kind(), Some(BindErrorKind::MissingArgument));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_optional_default_and_absent() {
        let sig = HandlerSignature::new()
            .param(Param::optional("page", Some("1")).kind(ParamKind::Int))
            .param(Param::optional("q", None));
        let args = bind(&sig, &[], &QueryDict::new(), false).unwrap();
        assert_eq!(args.int("page"), Some(1));
        assert!(args.get("q").is_none());
    }

    #[test]
    fn test_type_mismatch() {
        let sig = HandlerSignature::new().param(Param::required("id").kind(ParamKind::Int));
        let err = bind(&sig, &segs(&["abc"]), &QueryDict::new(), false).unwrap_err();
        assert_eq!(err.bind_error_kind(), Some(BindErrorKind::TypeMismatch));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_bool_and_float_conversion() {
        let sig = HandlerSignature::new()
            .param(Param::required("flag").kind(ParamKind::Bool))
            .param(Param::required("ratio").kind(ParamKind::Float));
        let args = bind(&sig, &[], &QueryDict::parse("flag=Yes&ratio=0.5"), false).unwrap();
        assert_eq!(args.bool("flag"), Some(true));
        assert_eq!(args.float("ratio"), Some(0.5));
    }

    #[test]
    fn test_multiple_values() {
        let sig = HandlerSignature::new()
            .param(Param::required("tag").kind(ParamKind::List))
            .param(Param::required("color"));
        let args = bind(&sig, &[], &QueryDict::parse("tag=a&tag=b&color=red&color=blue"), false)
            .unwrap();
        assert_eq!(args.list("tag").unwrap(), ["a", "b"]);
        assert_eq!(args.str("color"), Some("blue"));
    }

    #[test]
    fn test_positional_wins_over_query_key() {
        let sig = HandlerSignature::new().param(Param::required("id"));
        let args = bind(&sig, &segs(&["7"]), &QueryDict::parse("id=9"), true).unwrap();
        assert_eq!(args.str("id"), Some("7"));
    }

    #[test]
    fn test_varkw_collects_unconsumed() {
        let sig = HandlerSignature::new().param(Param::required("a")).varkw();
        let args = bind(&sig, &[], &QueryDict::parse("a=1&b=2&c=3&c=4"), false).unwrap();
        assert_eq!(args.str("a"), Some("1"));
        assert_eq!(args.extra().get("b"), Some(&BoundValue::Str("2".into())));
        assert_eq!(
            args.extra().get("c"),
            Some(&BoundValue::List(vec!["3".into(), "4".into()]))
        );
        assert!(!args.extra().contains_key("a"));
    }

    #[test]
    fn test_extra_keys_ignored_unless_strict() {
        let sig = HandlerSignature::new();
        assert!(bind(&sig, &[], &QueryDict::parse("x=1"), false).is_ok());
        let err = bind(&sig, &[], &QueryDict::parse("x=1"), true).unwrap_err();
        assert!(matches!(err, PecanError::UnexpectedArgument(ref k) if k == "x"));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_bound_value_to_json() {
        assert_eq!(serde_json::Value::from(&BoundValue::Int(3)), serde_json::json!(3));
        assert_eq!(
            serde_json::Value::from(&BoundValue::List(vec!["a".into()])),
            serde_json::json!(["a"])
        );
    }
}
