//! The `serve` management command.
//!
//! Builds the application from the factory and serves it. With `--reload`
//! the command becomes a supervisor: it runs the same executable without
//! `--reload` as a child process and restarts it whenever a watched path
//! changes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use pecan_rs_core::{PecanError, Settings};

use crate::command::ManagementCommand;
use crate::AppFactory;

/// Serves the application.
pub struct ServeCommand {
    factory: AppFactory,
}

impl ServeCommand {
    pub fn new(factory: AppFactory) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl ManagementCommand for ServeCommand {
    fn name(&self) -> &'static str {
        "serve"
    }

    fn help(&self) -> &'static str {
        "Serves the application"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("host")
                .long("host")
                .help("Host to bind to (overrides server.host)"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .value_parser(clap::value_parser!(u16))
                .help("Port to bind to (overrides server.port)"),
        )
        .arg(
            clap::Arg::new("reload")
                .long("reload")
                .action(clap::ArgAction::SetTrue)
                .help("Watch for changes and automatically restart"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), PecanError> {
        let mut settings = settings.clone();
        if let Some(host) = matches.get_one::<String>("host") {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            settings.server.port = *port;
        }

        if matches.get_flag("reload") {
            let config = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
            return watch_and_respawn(&settings, config).await;
        }

        let app = (self.factory)(&settings)?;
        println!("Starting server in PID {}", std::process::id());
        println!("{}", serving_message(&settings.server.host, settings.server.port));
        app.run(&settings.server.addr()).await
    }
}

/// The line announcing where the server listens.
///
/// A wildcard bind also advertises the loopback URL.
pub fn serving_message(host: &str, port: u16) -> String {
    if host == "0.0.0.0" {
        format!("serving on 0.0.0.0:{port}, view at http://127.0.0.1:{port}")
    } else {
        format!("serving on http://{host}:{port}")
    }
}

/// The arguments the child is started with: ours, minus `--reload`.
pub fn child_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .skip(1)
        .filter(|arg| arg != "--reload")
        .collect()
}

/// The paths watched for changes and how.
///
/// Every `reload.paths` entry is watched recursively; the directory of the
/// settings file, when there is one, non-recursively.
pub fn paths_to_monitor(settings: &Settings, config: Option<&Path>) -> Vec<(PathBuf, RecursiveMode)> {
    let mut paths: Vec<(PathBuf, RecursiveMode)> = settings
        .reload
        .paths
        .iter()
        .map(|path| (path.clone(), RecursiveMode::Recursive))
        .collect();

    if let Some(config) = config {
        let dir = config
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        paths.push((dir, RecursiveMode::NonRecursive));
    }
    paths
}

/// Whether a file-system event should restart the server.
pub const fn should_reload(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

fn spawn_child(exe: &Path, args: &[OsString]) -> Result<Child, PecanError> {
    let child = Command::new(exe).args(args).kill_on_drop(true).spawn()?;
    tracing::info!(pid = child.id(), "server process started");
    Ok(child)
}

fn watcher_error(error: &notify::Error) -> PecanError {
    PecanError::ConfigurationError(format!("Failed to watch for changes: {error}"))
}

async fn watch_and_respawn(settings: &Settings, config: Option<&Path>) -> Result<(), PecanError> {
    let exe = std::env::current_exe()?;
    let args = child_args(std::env::args_os());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| match result {
            Ok(event) if should_reload(&event.kind) => {
                let _ = tx.send(event.paths);
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Watch error: {e}"),
        },
        Config::default().with_poll_interval(Duration::from_millis(settings.reload.poll_interval_ms)),
    )
    .map_err(|e| watcher_error(&e))?;

    for (path, mode) in paths_to_monitor(settings, config) {
        if path.exists() {
            watcher.watch(&path, mode).map_err(|e| watcher_error(&e))?;
            tracing::debug!(path = %path.display(), "watching");
        } else {
            tracing::warn!(path = %path.display(), "watch path does not exist");
        }
    }

    println!("Monitoring for changes...");
    let mut child = spawn_child(&exe, &args)?;

    loop {
        tokio::select! {
            Some(paths) = rx.recv() => {
                tokio::time::sleep(Duration::from_millis(100)).await;
                while rx.try_recv().is_ok() {}
                tracing::info!(?paths, "change detected, restarting");
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to stop server process: {e}");
                }
                child = spawn_child(&exe, &args)?;
            }
            _ = tokio::signal::ctrl_c() => {
                child.kill().await.ok();
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
    use pecan_rs_core::PecanResult;
    use pecan_rs_http::Application;

    fn failing_factory(message: &'static str) -> AppFactory {
        std::sync::Arc::new(move |_: &Settings| -> PecanResult<Application> {
            Err(PecanError::ImproperlyConfigured(message.to_string()))
        })
    }

    #[test]
    fn test_serving_message() {
        assert_eq!(
            serving_message("0.0.0.0", 8080),
            "serving on 0.0.0.0:8080, view at http://127.0.0.1:8080"
        );
        assert_eq!(serving_message("localhost", 3000), "serving on http://localhost:3000");
    }

    #[test]
    fn test_child_args_drop_reload_and_program() {
        let args = ["pecan-app", "serve", "--reload", "--port", "9000"].map(OsString::from);
        assert_eq!(
            child_args(args),
            ["serve", "--port", "9000"].map(OsString::from).to_vec()
        );
    }

    #[test]
    fn test_paths_to_monitor() {
        let settings = Settings::default();
        let paths = paths_to_monitor(&settings, Some(Path::new("conf/app.toml")));
        assert_eq!(
            paths,
            vec![
                (PathBuf::from("src"), RecursiveMode::Recursive),
                (PathBuf::from("conf"), RecursiveMode::NonRecursive),
            ]
        );

        let bare = paths_to_monitor(&settings, Some(Path::new("app.toml")));
        assert_eq!(bare[1], (PathBuf::from("."), RecursiveMode::NonRecursive));
        assert_eq!(paths_to_monitor(&settings, None).len(), 1);
    }

    #[test]
    fn test_should_reload() {
        assert!(should_reload(&EventKind::Modify(ModifyKind::Any)));
        assert!(should_reload(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))));
        assert!(should_reload(&EventKind::Create(CreateKind::File)));
        assert!(!should_reload(&EventKind::Remove(RemoveKind::File)));
        assert!(!should_reload(&EventKind::Any));
    }

    #[test]
    fn test_arguments() {
        let cmd = ServeCommand::new(failing_factory("unused"));
        let matches = cmd
            .add_arguments(clap::Command::new("serve"))
            .try_get_matches_from(["serve", "--host", "127.0.0.1", "--port", "9000", "--reload"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("host").unwrap(), "127.0.0.1");
        assert_eq!(matches.get_one::<u16>("port"), Some(&9000));
        assert!(matches.get_flag("reload"));
    }

    #[tokio::test]
    async fn test_factory_error_propagates() {
        let cmd = ServeCommand::new(failing_factory("no root"));
        let matches = cmd
            .add_arguments(clap::Command::new("serve"))
            .try_get_matches_from(["serve"])
            .unwrap();
        let err = cmd.handle(&matches, &Settings::default()).await.unwrap_err();
        assert!(matches!(err, PecanError::ImproperlyConfigured(_)));
    }
}
