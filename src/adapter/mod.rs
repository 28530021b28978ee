//! Router adapters: turning a router's native route table into canonical routes.
//!
//! Routers disagree on placeholder syntax (`{id}`, `{id:[0-9]+}`, `:id`,
//! `*rest`, `{*rest}`). Each adapter reports its routes as they are written
//! in the router and owns the translation into the canonical `{name}` form;
//! [`merge`] then inserts them into a [`RouteRegistry`].
//!
//! # Supported Routers
//!
//! - Any router that can enumerate its routes at runtime: see [`RouteTable`]
//! - **Axum** source code: see [`axum::AxumSourceAdapter`]
//! - **Actix-Web** source code: see [`actix::ActixSourceAdapter`]
//!
//! # Example
//!
//! ```
//! use openapi_synth::adapter::{merge, PlaceholderSyntax, RouteTable};
//! use openapi_synth::route_registry::{HttpMethod, RouteRegistry};
//!
//! let mut table = RouteTable::new("gin", PlaceholderSyntax::Colon);
//! table.route(HttpMethod::Get, "/topic/:id", "get_topic");
//!
//! let mut registry = RouteRegistry::new();
//! merge(&mut registry, &table).unwrap();
//! assert!(registry.get(HttpMethod::Get, "/topic/{id}").is_some());
//! ```

pub mod actix;
pub mod axum;

use crate::error::Result;
use crate::route_registry::{HttpMethod, PathTemplate, RouteRegistry};
use log::{debug, info};

/// A route as the router reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoute {
    pub method: HttpMethod,
    /// Router-native path pattern
    pub pattern: String,
    /// Name of the handler, when the router knows it
    pub handler: Option<String>,
}

impl RawRoute {
    pub fn new(method: HttpMethod, pattern: &str, handler: Option<&str>) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            handler: handler.map(|h| h.to_string()),
        }
    }
}

/// Read-only view of a router's route table.
pub trait RouterAdapter {
    /// Name used in log output
    fn name(&self) -> &str;

    /// All routes the router exposes, in registration order
    fn list_routes(&self) -> Result<Vec<RawRoute>>;

    /// Translate a router-native pattern into a canonical template
    fn translate(&self, pattern: &str) -> Result<PathTemplate>;
}

/// Placeholder conventions shared by several routers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderSyntax {
    /// `{id}`, `{id:regex}` and `{*rest}` (chi, actix-web, axum 0.8)
    Braces,
    /// `:id` and `*rest` (axum 0.7, gin, httprouter)
    Colon,
}

impl PlaceholderSyntax {
    /// Rewrite a pattern into canonical text without validating it
    pub fn rewrite(&self, pattern: &str) -> String {
        let rewritten = pattern
            .split('/')
            .map(|segment| match self {
                PlaceholderSyntax::Braces => match segment.strip_prefix("{*") {
                    Some(rest) => format!("{{{}", rest),
                    None => segment.to_string(),
                },
                PlaceholderSyntax::Colon => {
                    match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
                        Some(name) if !name.is_empty() => format!("{{{}}}", name),
                        _ => segment.to_string(),
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{}", rewritten)
        }
    }

    /// Translate a pattern into a canonical template
    pub fn translate(&self, pattern: &str) -> Result<PathTemplate> {
        PathTemplate::parse(&self.rewrite(pattern))
    }
}

/// In-memory route table for routers that can enumerate their routes
#[derive(Debug, Clone)]
pub struct RouteTable {
    name: String,
    syntax: PlaceholderSyntax,
    routes: Vec<RawRoute>,
}

impl RouteTable {
    pub fn new(name: &str, syntax: PlaceholderSyntax) -> Self {
        Self {
            name: name.to_string(),
            syntax,
            routes: Vec::new(),
        }
    }

    /// Record a route as written in the router
    pub fn route(&mut self, method: HttpMethod, pattern: &str, handler: &str) -> &mut Self {
        self.routes.push(RawRoute::new(method, pattern, Some(handler)));
        self
    }
}

impl RouterAdapter for RouteTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_routes(&self) -> Result<Vec<RawRoute>> {
        Ok(self.routes.clone())
    }

    fn translate(&self, pattern: &str) -> Result<PathTemplate> {
        self.syntax.translate(pattern)
    }
}

/// Insert every route of `adapter` into `registry`.
///
/// Additive and idempotent: routes already present keep their documentation.
/// New routes take the handler name as their operation ID. Returns the number
/// of routes added.
pub fn merge(registry: &mut RouteRegistry, adapter: &dyn RouterAdapter) -> Result<usize> {
    let routes = adapter.list_routes()?;
    info!("Merging {} routes from {}", routes.len(), adapter.name());

    let mut added = 0;
    for raw in routes {
        let template = adapter.translate(&raw.pattern)?;
        debug!("{} {} -> {}", raw.method, raw.pattern, template);
        let canonical = template.as_str().to_string();

        if registry.insert_if_absent(raw.method, template) {
            added += 1;
            if let Some(handler) = raw.handler {
                let route = registry.route_mut(raw.method, &canonical)?;
                route.metadata.operation_id.get_or_insert(handler);
            }
        }
    }

    info!("Added {} new routes from {}", added, adapter.name());
    Ok(added)
}

/// Join a prefix and a path with exactly one slash between them
pub(crate) fn combine_paths(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        return path.to_string();
    }

    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::route_registry::{ResponseModel, RouteMetadata};

    #[test]
    fn test_braces_translation() {
        let template = PlaceholderSyntax::Braces
            .translate("/topic/{id:[0-9]+}/files/{*path}")
            .unwrap();
        assert_eq!(template.as_str(), "/topic/{id}/files/{path}");
        assert_eq!(template.param_names(), vec!["id", "path"]);
        assert_eq!(template.params()[0].pattern.as_deref(), Some("[0-9]+"));
    }

    #[test]
    fn test_colon_translation() {
        let template = PlaceholderSyntax::Colon
            .translate("/users/:id/files/*rest")
            .unwrap();
        assert_eq!(template.as_str(), "/users/{id}/files/{rest}");
    }

    #[test]
    fn test_translation_adds_leading_slash() {
        let template = PlaceholderSyntax::Colon.translate("health").unwrap();
        assert_eq!(template.as_str(), "/health");
    }

    #[test]
    fn test_duplicate_placeholder_from_adapter() {
        let result = PlaceholderSyntax::Colon.translate("/a/:id/b/:id");
        assert!(matches!(result, Err(Error::DuplicatePathParameter { .. })));
    }

    #[test]
    fn test_combine_paths() {
        assert_eq!(combine_paths("", "/users"), "/users");
        assert_eq!(combine_paths("/api/", "/users"), "/api/users");
        assert_eq!(combine_paths("/api", "/"), "/api");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut table = RouteTable::new("chi", PlaceholderSyntax::Braces);
        table
            .route(HttpMethod::Get, "/topic/{id}", "get_topic")
            .route(HttpMethod::Get, "/topics", "list_topics")
            .route(HttpMethod::Post, "/topics", "create_topic");

        let mut registry = RouteRegistry::new();
        assert_eq!(merge(&mut registry, &table).unwrap(), 3);
        registry
            .with_response(
                HttpMethod::Get,
                "/topics",
                200,
                ResponseModel {
                    schema: None,
                    description: "topics".to_string(),
                },
            )
            .unwrap();

        assert_eq!(merge(&mut registry, &table).unwrap(), 0);
        assert_eq!(registry.len(), 3);
        let route = registry.get(HttpMethod::Get, "/topics").unwrap();
        assert_eq!(route.metadata.responses.len(), 1);
        assert_eq!(route.metadata.operation_id.as_deref(), Some("list_topics"));
    }

    #[test]
    fn test_merge_keeps_declared_operation_id() {
        let mut registry = RouteRegistry::new();
        let mut metadata = RouteMetadata::default();
        metadata.operation_id = Some("topicById".to_string());
        registry
            .upsert(HttpMethod::Get, "/topic/{id}", metadata)
            .unwrap();

        let mut table = RouteTable::new("chi", PlaceholderSyntax::Braces);
        table.route(HttpMethod::Get, "/topic/{id}", "get_topic");
        merge(&mut registry, &table).unwrap();

        let route = registry.get(HttpMethod::Get, "/topic/{id}").unwrap();
        assert_eq!(route.metadata.operation_id.as_deref(), Some("topicById"));
    }
}
