use crate::error::{Error, Result};
use crate::schema::Schema;
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeMap;
use std::str::FromStr;

/// HTTP methods a route may be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP DELETE method
    Delete,
    /// HTTP PATCH method
    Patch,
    /// HTTP OPTIONS method
    Options,
    /// HTTP HEAD method
    Head,
    /// HTTP TRACE method
    Trace,
}

impl HttpMethod {
    /// Upper-case method name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(method: &str) -> Result<Self> {
        match method.to_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            "trace" => Ok(HttpMethod::Trace),
            _ => Err(Error::InvalidArgument(format!("unknown HTTP method: {}", method))),
        }
    }
}

/// A route pattern in canonical `{name}` syntax.
///
/// Placeholders may carry a regular-expression constraint (`{id:[0-9]+}`);
/// the constraint is kept on the parameter and dropped from the canonical text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    path: String,
    params: Vec<TemplateParam>,
}

/// A placeholder found in a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParam {
    pub name: String,
    pub pattern: Option<String>,
}

impl PathTemplate {
    /// Parse a template written in canonical syntax
    pub fn parse(template: &str) -> Result<Self> {
        let mut path = String::with_capacity(template.len());
        let mut params: Vec<TemplateParam> = Vec::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                path.push(c);
                continue;
            }

            // Regex constraints may contain braces of their own, e.g. `{id:[0-9]{4}}`.
            let mut depth = 1;
            let mut inner = String::new();
            for c in chars.by_ref() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                inner.push(c);
            }
            if depth != 0 {
                return Err(Error::InvalidArgument(format!(
                    "unclosed placeholder in path template {}",
                    template
                )));
            }

            let (name, pattern) = match inner.split_once(':') {
                Some((name, pattern)) => (name.trim(), Some(pattern.to_string())),
                None => (inner.trim(), None),
            };
            if name.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "empty placeholder in path template {}",
                    template
                )));
            }
            if params.iter().any(|p| p.name == name) {
                return Err(Error::DuplicatePathParameter {
                    path: template.to_string(),
                    name: name.to_string(),
                });
            }

            path.push('{');
            path.push_str(name);
            path.push('}');
            params.push(TemplateParam {
                name: name.to_string(),
                pattern,
            });
        }

        Ok(Self { path, params })
    }

    /// Canonical template text
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Placeholders in left-to-right order
    pub fn params(&self) -> &[TemplateParam] {
        &self.params
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Documentation of a path parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParam {
    pub description: Option<String>,
    /// Regular expression the segment must match
    pub pattern: Option<String>,
    /// Schema override; path parameters are strings unless documented otherwise
    pub schema: Option<Schema>,
}

/// Documentation of a query parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParam {
    pub description: Option<String>,
    pub required: bool,
    pub allow_empty: bool,
    /// Schema override; defaults to string
    pub schema: Option<Schema>,
    pub pattern: Option<String>,
}

/// A documented request body
#[derive(Debug, Clone, PartialEq)]
pub struct RequestModel {
    pub schema: Schema,
    pub description: String,
}

/// A documented response; `schema` is `None` for bodiless responses
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseModel {
    pub schema: Option<Schema>,
    pub description: String,
}

/// Everything documented about one route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMetadata {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Path parameters in template order
    pub path_params: IndexMap<String, PathParam>,
    pub query_params: IndexMap<String, QueryParam>,
    pub request: Option<RequestModel>,
    /// Responses by status code
    pub responses: BTreeMap<u16, ResponseModel>,
}

/// A route identified by method and template
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: HttpMethod,
    pub template: PathTemplate,
    pub metadata: RouteMetadata,
}

impl Route {
    fn new(method: HttpMethod, template: PathTemplate) -> Self {
        let mut route = Self {
            method,
            template,
            metadata: RouteMetadata::default(),
        };
        route.sync_path_params();
        route
    }

    /// Make sure every template placeholder has a path parameter entry, in
    /// template order, and drop entries the template does not name.
    fn sync_path_params(&mut self) {
        let mut synced = IndexMap::new();
        for param in self.template.params() {
            let mut documented = self
                .metadata
                .path_params
                .shift_remove(&param.name)
                .unwrap_or_default();
            if documented.pattern.is_none() {
                documented.pattern = param.pattern.clone();
            }
            synced.insert(param.name.clone(), documented);
        }
        self.metadata.path_params = synced;
    }
}

/// Route registry - the ordered mapping from (method, template) to metadata
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: IndexMap<(HttpMethod, String), Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route or overwrite the metadata of an existing one
    pub fn upsert(&mut self, method: HttpMethod, template: &str, metadata: RouteMetadata) -> Result<()> {
        let template = PathTemplate::parse(template)?;
        for name in metadata.path_params.keys() {
            if !template.params().iter().any(|p| &p.name == name) {
                return Err(Error::InvalidArgument(format!(
                    "path parameter {} is not part of {}",
                    name, template
                )));
            }
        }

        debug!("Upserting route: {} {}", method, template);
        let key = (method, template.as_str().to_string());
        let mut route = Route::new(method, template);
        route.metadata = metadata;
        route.sync_path_params();
        self.routes.insert(key, route);
        Ok(())
    }

    /// Insert a route unless it is already present.
    ///
    /// Existing documentation is left untouched; placeholder constraints
    /// missing from it are filled in. Returns whether a route was added.
    pub fn insert_if_absent(&mut self, method: HttpMethod, template: PathTemplate) -> bool {
        let key = (method, template.as_str().to_string());
        match self.routes.get_mut(&key) {
            Some(route) => {
                debug!("Route already registered: {} {}", method, template);
                route.template = template;
                route.sync_path_params();
                false
            }
            None => {
                debug!("Adding route: {} {}", method, template);
                self.routes.insert(key, Route::new(method, template));
                true
            }
        }
    }

    /// Look up a route, failing with `RouteNotFound` when absent
    pub fn route_mut(&mut self, method: HttpMethod, template: &str) -> Result<&mut Route> {
        let canonical = PathTemplate::parse(template)?;
        self.routes
            .get_mut(&(method, canonical.as_str().to_string()))
            .ok_or_else(|| Error::RouteNotFound {
                method: method.to_string(),
                path: canonical.as_str().to_string(),
            })
    }

    pub fn get(&self, method: HttpMethod, template: &str) -> Option<&Route> {
        let canonical = PathTemplate::parse(template).ok()?;
        self.routes.get(&(method, canonical.as_str().to_string()))
    }

    /// Document the request body of a registered route
    pub fn with_request(&mut self, method: HttpMethod, template: &str, model: RequestModel) -> Result<()> {
        let route = self.route_mut(method, template)?;
        route.metadata.request = Some(model);
        Ok(())
    }

    /// Document one response of a registered route
    pub fn with_response(
        &mut self,
        method: HttpMethod,
        template: &str,
        status: u16,
        model: ResponseModel,
    ) -> Result<()> {
        if !(100..=599).contains(&status) {
            return Err(Error::InvalidArgument(format!("invalid status code: {}", status)));
        }
        let route = self.route_mut(method, template)?;
        route.metadata.responses.insert(status, model);
        Ok(())
    }

    /// Routes in first-registration order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template_without_params() {
        let template = PathTemplate::parse("/topics").unwrap();
        assert_eq!(template.as_str(), "/topics");
        assert!(template.params().is_empty());
    }

    #[test]
    fn test_parse_template_params_in_order() {
        let template = PathTemplate::parse("/users/{user_id}/posts/{post_id}").unwrap();
        assert_eq!(template.param_names(), vec!["user_id", "post_id"]);
    }

    #[test]
    fn test_parse_template_with_pattern() {
        let template = PathTemplate::parse("/items/{id:[0-9]{4}}/raw").unwrap();
        assert_eq!(template.as_str(), "/items/{id}/raw");
        assert_eq!(template.params()[0].pattern.as_deref(), Some("[0-9]{4}"));
    }

    #[test]
    fn test_parse_template_duplicate_param() {
        let result = PathTemplate::parse("/a/{id}/b/{id}");
        match result {
            Err(Error::DuplicatePathParameter { name, .. }) => assert_eq!(name, "id"),
            other => panic!("expected duplicate parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_template_unclosed() {
        assert!(matches!(
            PathTemplate::parse("/a/{id"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            PathTemplate::parse("/a/{}"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_http_method_from_str() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("CONNECTX".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut registry = RouteRegistry::new();
        let mut metadata = RouteMetadata::default();
        metadata.summary = Some("first".to_string());
        registry.upsert(HttpMethod::Get, "/topics", metadata).unwrap();

        let mut metadata = RouteMetadata::default();
        metadata.summary = Some("second".to_string());
        registry.upsert(HttpMethod::Get, "/topics", metadata).unwrap();

        assert_eq!(registry.len(), 1);
        let route = registry.get(HttpMethod::Get, "/topics").unwrap();
        assert_eq!(route.metadata.summary.as_deref(), Some("second"));
    }

    #[test]
    fn test_upsert_rejects_unknown_path_param() {
        let mut registry = RouteRegistry::new();
        let mut metadata = RouteMetadata::default();
        metadata
            .path_params
            .insert("name".to_string(), PathParam::default());
        let result = registry.upsert(HttpMethod::Get, "/topic/{id}", metadata);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_path_params_follow_template() {
        let mut registry = RouteRegistry::new();
        registry
            .upsert(HttpMethod::Get, "/topic/{id}", RouteMetadata::default())
            .unwrap();
        let route = registry.get(HttpMethod::Get, "/topic/{id}").unwrap();
        let names: Vec<_> = route.metadata.path_params.keys().cloned().collect();
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn test_response_on_unknown_route() {
        let mut registry = RouteRegistry::new();
        registry
            .upsert(HttpMethod::Get, "/topics", RouteMetadata::default())
            .unwrap();
        let result = registry.with_response(
            HttpMethod::Get,
            "/items",
            200,
            ResponseModel {
                schema: None,
                description: "items".to_string(),
            },
        );
        match result {
            Err(Error::RouteNotFound { method, path }) => {
                assert_eq!(method, "GET");
                assert_eq!(path, "/items");
            }
            other => panic!("expected route not found, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_if_absent_keeps_documentation() {
        let mut registry = RouteRegistry::new();
        let template = PathTemplate::parse("/topic/{id}").unwrap();
        assert!(registry.insert_if_absent(HttpMethod::Get, template.clone()));
        registry
            .with_response(
                HttpMethod::Get,
                "/topic/{id}",
                200,
                ResponseModel {
                    schema: Some(Schema::reference("Topic")),
                    description: "topic".to_string(),
                },
            )
            .unwrap();

        let constrained = PathTemplate::parse("/topic/{id:[0-9]+}").unwrap();
        assert!(!registry.insert_if_absent(HttpMethod::Get, constrained));

        assert_eq!(registry.len(), 1);
        let route = registry.get(HttpMethod::Get, "/topic/{id}").unwrap();
        assert_eq!(route.metadata.responses.len(), 1);
        assert_eq!(
            route.metadata.path_params["id"].pattern.as_deref(),
            Some("[0-9]+")
        );
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let mut registry = RouteRegistry::new();
        for (method, path) in [
            (HttpMethod::Post, "/topics"),
            (HttpMethod::Get, "/topic/{id}"),
            (HttpMethod::Get, "/topics"),
        ] {
            registry.upsert(method, path, RouteMetadata::default()).unwrap();
        }
        let order: Vec<_> = registry
            .iter()
            .map(|r| format!("{} {}", r.method, r.template))
            .collect();
        assert_eq!(order, vec!["POST /topics", "GET /topic/{id}", "GET /topics"]);
    }
}
