//! Running the built-in commands through `execute_from_args`.

use std::io::Write;
use std::sync::{Arc, Mutex};

use pecan_rs_cli::{builtin_registry, execute_from_args, AppFactory};
use pecan_rs_core::{PecanError, PecanResult, Settings};
use pecan_rs_http::routing::{ControllerNode, ExposedHandler};
use pecan_rs_http::Application;

fn recording_factory(seen: Arc<Mutex<Vec<Settings>>>) -> AppFactory {
    Arc::new(move |settings: &Settings| -> PecanResult<Application> {
        seen.lock().unwrap().push(settings.clone());
        let root = ControllerNode::builder("root")
            .handler(ExposedHandler::new_sync("index", |_| Ok("home".into())))
            .build()?;
        Ok(Application::new(root, settings.clone()))
    })
}

#[test]
fn test_builtin_registry_lists_commands() {
    let registry = builtin_registry(&recording_factory(Arc::default()));
    assert_eq!(registry.list_commands(), vec!["routes", "serve"]);
}

#[tokio::test]
async fn test_routes_with_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[server]\nport = 9100\n\n[app]\nstrict_arguments = true").unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let path = file.path().to_string_lossy().into_owned();
    execute_from_args(
        ["pecan-app", "routes", "--config", path.as_str()],
        recording_factory(Arc::clone(&seen)),
    )
    .await
    .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].server.port, 9100);
    assert!(seen[0].app.strict_arguments);
    assert!(seen[0].app.force_canonical);
}

#[tokio::test]
async fn test_routes_json_without_config() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    execute_from_args(["pecan-app", "routes", "--json"], recording_factory(Arc::clone(&seen)))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_config_file_is_an_error() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let result = execute_from_args(
        ["pecan-app", "routes", "-c", "/nonexistent/pecan.toml"],
        recording_factory(Arc::clone(&seen)),
    )
    .await;
    assert!(result.is_err());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_subcommand_is_configuration_error() {
    let err = execute_from_args(["pecan-app", "migrate"], recording_factory(Arc::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, PecanError::ConfigurationError(_)));
}
