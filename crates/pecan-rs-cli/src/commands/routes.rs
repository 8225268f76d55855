//! The `routes` management command.
//!
//! Walks the controller tree and prints every path a request can resolve
//! to. Exposed handlers are listed by name; the dynamic hooks get a
//! placeholder segment: `*` for `_default`, `<lookup>` for `_lookup` and
//! `...` for `_route`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use pecan_rs_core::{PecanError, Settings};
use pecan_rs_http::routing::{ControllerNode, ExposedHandler};

use crate::command::ManagementCommand;
use crate::AppFactory;

/// One row of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub path: String,
    pub handler: String,
    /// Default content type; `None` for `_lookup` and `_route` rows.
    pub content_type: Option<String>,
    pub formats: Vec<String>,
    /// Methods with a dedicated callable. Empty means every method.
    pub methods: Vec<String>,
}

impl RouteEntry {
    fn for_handler(path: String, handler: &ExposedHandler) -> Self {
        Self {
            path,
            handler: handler.name().to_string(),
            content_type: Some(handler.exposure().default_metadata().content_type.clone()),
            formats: handler
                .exposure()
                .formats()
                .into_iter()
                .map(str::to_string)
                .collect(),
            methods: handler
                .methods()
                .into_iter()
                .map(|method| method.as_str().to_string())
                .collect(),
        }
    }

    fn for_hook(path: String, hook: &str) -> Self {
        Self {
            path,
            handler: hook.to_string(),
            content_type: None,
            formats: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// Lists the routes of the tree under `root`, depth first, children after
/// the node's own handlers.
pub fn collect_routes(root: &Arc<ControllerNode>) -> Vec<RouteEntry> {
    let mut routes = Vec::new();
    collect_into(root, "", &mut routes);
    routes
}

fn collect_into(node: &ControllerNode, prefix: &str, routes: &mut Vec<RouteEntry>) {
    for handler in node.handlers() {
        if !handler.is_exposed() {
            continue;
        }
        let path = if handler.name() == "index" {
            format!("{prefix}/")
        } else {
            format!("{prefix}/{}", handler.name())
        };
        routes.push(RouteEntry::for_handler(path, handler));
    }

    if let Some(default) = node.default_handler() {
        routes.push(RouteEntry::for_handler(format!("{prefix}/*"), default));
    }
    if node.lookup_hook().is_some() {
        routes.push(RouteEntry::for_hook(format!("{prefix}/<lookup>"), "_lookup"));
    }
    if node.route_hook().is_some() {
        routes.push(RouteEntry::for_hook(format!("{prefix}/..."), "_route"));
    }

    for (name, child) in node.children() {
        collect_into(child, &format!("{prefix}/{name}"), routes);
    }
}

/// Renders the route table as aligned text columns.
pub fn format_routes(routes: &[RouteEntry]) -> String {
    let path_width = routes.iter().map(|r| r.path.len()).max().unwrap_or(0);
    let handler_width = routes.iter().map(|r| r.handler.len()).max().unwrap_or(0);

    let mut out = String::new();
    for route in routes {
        let mut line = format!(
            "{:<path_width$}  {:<handler_width$}  {}",
            route.path,
            route.handler,
            route.content_type.as_deref().unwrap_or("-"),
        );
        if !route.formats.is_empty() {
            line.push_str(&format!("  [{}]", route.formats.join(", ")));
        }
        if !route.methods.is_empty() {
            line.push_str(&format!("  ({})", route.methods.join(", ")));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Prints the route table.
pub struct RoutesCommand {
    factory: AppFactory,
}

impl RoutesCommand {
    pub fn new(factory: AppFactory) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl ManagementCommand for RoutesCommand {
    fn name(&self) -> &'static str {
        "routes"
    }

    fn help(&self) -> &'static str {
        "Lists every route of the controller tree"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("Print the routes as JSON"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), PecanError> {
        let app = (self.factory)(settings)?;
        let routes = collect_routes(app.root());
        tracing::debug!(count = routes.len(), "collected routes");

        if matches.get_flag("json") {
            let json = serde_json::to_string_pretty(&routes)
                .map_err(|e| PecanError::SerializationError(e.to_string()))?;
            println!("{json}");
        } else {
            print!("{}", format_routes(&routes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use pecan_rs_core::PecanResult;
    use pecan_rs_http::routing::{ExposureMetadata, HandlerOutput, LookupResult};
    use pecan_rs_http::Application;

    fn handler(name: &str) -> ExposedHandler {
        ExposedHandler::new_sync(name, |_| Ok(HandlerOutput::Empty))
    }

    fn tree() -> Arc<ControllerNode> {
        let student = ControllerNode::builder("student")
            .handler(handler("name"))
            .build()
            .unwrap();
        let students = ControllerNode::builder("students")
            .handler(handler("index"))
            .lookup(move |_, rest| Ok(Some(LookupResult::new(Arc::clone(&student), rest.to_vec()))))
            .build()
            .unwrap();
        let api = ControllerNode::builder("api")
            .route(|ctx, remaining| ctx.default_route(remaining))
            .build()
            .unwrap();

        ControllerNode::builder("root")
            .handler(handler("index"))
            .handler(
                handler("report")
                    .template("report.html")
                    .variant("json", ExposureMetadata::json()),
            )
            .handler(handler("secret").hidden())
            .handler(
                handler("comments").when_sync(Method::POST, |_| Ok(HandlerOutput::Empty)),
            )
            .default(handler("_default"))
            .child("students", students)
            .child("api", api)
            .build()
            .unwrap()
    }

    #[test]
    fn test_collect_routes() {
        let routes = collect_routes(&tree());
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/comments",
                "/",
                "/report",
                "/*",
                "/api/...",
                "/students/",
                "/students/<lookup>",
            ]
        );

        let report = &routes[2];
        assert_eq!(report.content_type.as_deref(), Some("text/html"));
        assert_eq!(report.formats, vec!["json"]);

        let comments = &routes[0];
        assert_eq!(comments.methods, vec!["POST"]);

        let lookup = &routes[6];
        assert_eq!(lookup.handler, "_lookup");
        assert!(lookup.content_type.is_none());
    }

    #[test]
    fn test_format_routes() {
        let routes = vec![
            RouteEntry {
                path: "/".into(),
                handler: "index".into(),
                content_type: Some("text/html".into()),
                formats: Vec::new(),
                methods: Vec::new(),
            },
            RouteEntry {
                path: "/api/...".into(),
                handler: "_route".into(),
                content_type: None,
                formats: Vec::new(),
                methods: Vec::new(),
            },
            RouteEntry {
                path: "/report".into(),
                handler: "report".into(),
                content_type: Some("text/html".into()),
                formats: vec!["json".into(), "xml".into()],
                methods: vec!["GET".into(), "POST".into()],
            },
        ];
        assert_eq!(
            format_routes(&routes),
            "/         index   text/html\n\
             /api/...  _route  -\n\
             /report   report  text/html  [json, xml]  (GET, POST)\n"
        );
    }

    #[tokio::test]
    async fn test_handle_builds_app_from_factory() {
        let factory: AppFactory = Arc::new(|settings: &Settings| -> PecanResult<Application> {
            Ok(Application::new(tree(), settings.clone()))
        });
        let cmd = RoutesCommand::new(factory);
        let matches = cmd
            .add_arguments(clap::Command::new("routes"))
            .try_get_matches_from(["routes", "--json"])
            .unwrap();
        assert!(matches.get_flag("json"));
        assert!(cmd.handle(&matches, &Settings::default()).await.is_ok());
    }
}
