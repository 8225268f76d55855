//! Settings for the pecan-rs framework.
//!
//! [`Settings`] holds everything the application layer and the CLI read at
//! startup: the `server` bind address, the `app` routing behaviour, and the
//! `reload` watcher configuration. Settings are passed explicitly; there is no
//! process-wide settings object.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the development server binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// The host interface to bind to.
    pub host: String,
    /// The TCP port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    /// Returns the `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Routing and rendering behaviour of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Redirect `/node` to `/node/` when the request resolves to `index`.
    pub force_canonical: bool,
    /// Treat a known extension on the last path segment as the desired format.
    pub guess_content_type_from_ext: bool,
    /// Reject query/body keys that no handler parameter accepts.
    pub strict_arguments: bool,
    /// Maximum number of chained `_lookup` hops in a single request.
    pub max_lookup_depth: usize,
    /// Maximum number of `_route` hooks entered in a single request.
    pub max_route_depth: usize,
    /// Directory served as static files under `static_url`. `None` serves
    /// nothing.
    pub static_root: Option<PathBuf>,
    /// URL prefix for `static_root`.
    pub static_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            force_canonical: true,
            guess_content_type_from_ext: true,
            strict_arguments: false,
            max_lookup_depth: 32,
            max_route_depth: 32,
            static_root: None,
            static_url: "/static".to_string(),
        }
    }
}

/// Configuration for `serve --reload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadSettings {
    /// Paths that are watched recursively; a change restarts the server.
    pub paths: Vec<PathBuf>,
    /// Poll interval for watcher backends that poll, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ReloadSettings {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("src")],
            poll_interval_ms: 1000,
        }
    }
}

/// The complete set of framework settings.
///
/// # Examples
///
/// ```
/// use pecan_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.server.port, 8080);
/// assert!(settings.app.force_canonical);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled. Failure responses include error detail.
    pub debug: bool,
    /// The log level filter (e.g. "info", "debug", "pecan_rs_http=trace").
    pub log_level: String,
    /// Development server configuration.
    pub server: ServerSettings,
    /// Routing and rendering behaviour.
    pub app: AppSettings,
    /// Auto-reload watcher configuration.
    pub reload: ReloadSettings,
    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            app: AppSettings::default(),
            reload: ReloadSettings::default(),
            extra: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.server.port, 8080);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_default_app_settings() {
        let app = AppSettings::default();
        assert!(app.force_canonical);
        assert!(app.guess_content_type_from_ext);
        assert!(!app.strict_arguments);
        assert_eq!(app.max_lookup_depth, 32);
        assert_eq!(app.max_route_depth, 32);
        assert!(app.static_root.is_none());
        assert_eq!(app.static_url, "/static");
    }

    #[test]
    fn test_default_reload_settings() {
        let reload = ReloadSettings::default();
        assert_eq!(reload.paths, vec![PathBuf::from("src")]);
        assert_eq!(reload.poll_interval_ms, 1000);
    }

    #[test]
    fn test_server_addr() {
        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 9000,
        };
        assert_eq!(server.addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_settings_serialize_roundtrip() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server, s.server);
        assert_eq!(parsed.app, s.app);
    }
}
