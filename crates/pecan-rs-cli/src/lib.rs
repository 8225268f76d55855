//! # pecan-rs-cli
//!
//! Management commands for the pecan-rs framework.
//!
//! - **Management commands** - [`ManagementCommand`] and [`CommandRegistry`]
//! - **`serve`** - Runs the application, optionally under a file watcher that
//!   restarts it on change
//! - **`routes`** - Prints the route table of the controller tree
//!
//! A binary supplies an [`AppFactory`] that builds its [`Application`] from
//! the loaded settings and hands control to [`execute_from_env`]:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pecan_rs_cli::AppFactory;
//! use pecan_rs_core::{PecanResult, Settings};
//! use pecan_rs_http::routing::{ControllerNode, ExposedHandler};
//! use pecan_rs_http::Application;
//!
//! #[tokio::main]
//! async fn main() -> PecanResult<()> {
//!     let factory: AppFactory = Arc::new(|settings: &Settings| -> PecanResult<Application> {
//!         let root = ControllerNode::builder("root")
//!             .handler(ExposedHandler::new_sync("index", |_| Ok("hello".into())))
//!             .build()?;
//!         Ok(Application::new(root, settings.clone()))
//!     });
//!     pecan_rs_cli::execute_from_env(factory).await
//! }
//! ```

// These clippy lints are intentionally allowed:
// - result_large_err: PecanError is the framework-wide error type
// - doc_markdown: backtick requirements for documentation items are too strict
// - missing_const_for_fn: some functions may gain runtime logic later
// - module_name_repetitions: re-exports make module-prefixed names redundant
// - unused_async: command handlers maintain consistent async signatures
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use pecan_rs_core::logging::setup_logging;
use pecan_rs_core::{settings_loader, PecanError, PecanResult, Settings};
use pecan_rs_http::Application;

pub use command::{CommandRegistry, ManagementCommand};
pub use commands::{register_builtin_commands, RoutesCommand, ServeCommand};

/// Builds the application from the loaded settings.
///
/// Called once per command invocation, and once per child process when
/// `serve --reload` restarts the server.
pub type AppFactory = Arc<dyn Fn(&Settings) -> PecanResult<Application> + Send + Sync>;

/// A registry holding the built-in commands for `factory`.
pub fn builtin_registry(factory: &AppFactory) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry, factory);
    registry
}

/// Loads settings from `--config` when given, otherwise from the environment.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or parsed.
pub fn load_settings(matches: &clap::ArgMatches) -> PecanResult<Settings> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let settings = settings_loader::from_file_with_env(path)?;
            tracing::debug!(path = %path.display(), "loaded settings file");
            Ok(settings)
        }
        None => Ok(settings_loader::from_env()),
    }
}

async fn run(registry: &CommandRegistry, matches: &clap::ArgMatches) -> PecanResult<()> {
    let settings = load_settings(matches)?;
    setup_logging(&settings);
    registry.execute(matches, &settings).await
}

/// Parses `args` (program name first) and runs the selected command.
///
/// # Errors
///
/// Argument errors, including `--help`, are returned as
/// [`PecanError::ConfigurationError`]; everything else comes from settings
/// loading or the command itself.
pub async fn execute_from_args<I, T>(args: I, factory: AppFactory) -> PecanResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let registry = builtin_registry(&factory);
    let matches = registry
        .build_cli()
        .try_get_matches_from(args)
        .map_err(|e| PecanError::ConfigurationError(e.to_string()))?;
    run(&registry, &matches).await
}

/// Parses the process arguments and runs the selected command.
///
/// Argument errors print usage and exit the process, as clap does.
///
/// # Errors
///
/// Returns an error from settings loading or the command itself.
pub async fn execute_from_env(factory: AppFactory) -> PecanResult<()> {
    let registry = builtin_registry(&factory);
    let matches = registry
        .build_cli()
        .try_get_matches()
        .unwrap_or_else(|e| e.exit());
    run(&registry, &matches).await
}
