//! Built-in management commands.
//!
//! Both commands build the application through the [`AppFactory`] the
//! binary supplies, so they see the same controller tree a request would.

pub mod routes;
pub mod serve;

pub use routes::{collect_routes, format_routes, RouteEntry, RoutesCommand};
pub use serve::ServeCommand;

use std::sync::Arc;

use crate::command::CommandRegistry;
use crate::AppFactory;

/// Registers all built-in management commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry, factory: &AppFactory) {
    registry.register(Box::new(ServeCommand::new(Arc::clone(factory))));
    registry.register(Box::new(RoutesCommand::new(Arc::clone(factory))));
}
