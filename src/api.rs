//! The setup-time API description.
//!
//! An [`Api`] owns the route and schema registries. Routes come in from a
//! router adapter ([`Api::merge`]) or are declared by hand ([`Api::upsert`]);
//! documentation is then attached through [`RouteBuilder`], and
//! [`Api::spec`] assembles the final document.
//!
//! ```
//! use openapi_synth::api::Api;
//! use openapi_synth::shape::{FieldDef, Reflect, Shape};
//!
//! struct Topic {
//!     topic: String,
//! }
//!
//! impl Reflect for Topic {
//!     fn shape() -> Shape {
//!         Shape::structure::<Self>(vec![FieldDef::new::<String>("topic")])
//!     }
//! }
//!
//! # fn main() -> openapi_synth::error::Result<()> {
//! let mut api = Api::new("Messaging API", "1.0.0");
//! api.set_strip_pkg_paths(vec![module_path!().to_string()]);
//! api.upsert(openapi_synth::route_registry::HttpMethod::Get, "/topic/{id}")?
//!     .has_response::<Topic>(200, "topic response")?;
//!
//! let spec = api.spec()?;
//! assert!(spec.component("Topic").is_some());
//! # Ok(())
//! # }
//! ```

use crate::adapter::{self, RouterAdapter};
use crate::error::{Error, Result};
use crate::openapi_builder::{assemble, Info, OpenApiDocument};
use crate::route_registry::{
    HttpMethod, PathParam, PathTemplate, QueryParam, RequestModel, ResponseModel, Route,
    RouteRegistry,
};
use crate::schema::Schema;
use crate::schema_generator::SchemaGenerator;
use crate::schema_registry::{SchemaHook, SchemaRegistry};
use crate::shape::{Reflect, TypeKind};
use log::{debug, info};
use serde_json::Value;

/// Options applied to a model when it is registered explicitly
#[derive(Default)]
pub struct ModelOpts {
    description: Option<String>,
    enum_values: Vec<Value>,
    nullable: bool,
    hooks: Vec<SchemaHook>,
}

impl ModelOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Restrict the model to a fixed set of values
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = values;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Run `hook` against the model's schema at assembly time
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Schema) + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }
}

/// An API under construction
pub struct Api {
    info: Info,
    routes: RouteRegistry,
    schemas: SchemaRegistry,
}

impl Api {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            info: Info::new(title, version),
            routes: RouteRegistry::new(),
            schemas: SchemaRegistry::new(),
        }
    }

    /// Module prefixes stripped from type names when naming components.
    ///
    /// Names are fixed when a type is first registered, so set this before
    /// documenting any route.
    pub fn set_strip_pkg_paths(&mut self, prefixes: Vec<String>) {
        self.schemas.set_strip_pkg_paths(prefixes);
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut Info {
        &mut self.info
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Import the routes of a router. Routes already present keep their
    /// documentation.
    pub fn merge(&mut self, adapter: &dyn RouterAdapter) -> Result<usize> {
        adapter::merge(&mut self.routes, adapter)
    }

    /// Declare a route by hand, keeping its documentation if it already exists
    pub fn upsert(&mut self, method: HttpMethod, template: &str) -> Result<RouteBuilder<'_>> {
        let template = PathTemplate::parse(template)?;
        let canonical = template.as_str().to_string();
        self.routes.insert_if_absent(method, template);
        self.route(method, &canonical)
    }

    /// Document a registered route
    pub fn route(&mut self, method: HttpMethod, template: &str) -> Result<RouteBuilder<'_>> {
        let route = self.routes.route_mut(method, template)?;
        Ok(RouteBuilder {
            route,
            schemas: &mut self.schemas,
        })
    }

    pub fn get(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Get, template)
    }

    pub fn post(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Post, template)
    }

    pub fn put(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Put, template)
    }

    pub fn patch(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Patch, template)
    }

    pub fn delete(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Delete, template)
    }

    pub fn head(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Head, template)
    }

    pub fn options(&mut self, template: &str) -> Result<RouteBuilder<'_>> {
        self.route(HttpMethod::Options, template)
    }

    /// Register `T` as a named component and return its name.
    ///
    /// Non-struct types (for example a string-backed enum) are registered
    /// under their own name instead of being inlined.
    pub fn register_model<T: Reflect + ?Sized>(&mut self, opts: ModelOpts) -> Result<String> {
        let shape = T::shape();
        if matches!(shape.kind, TypeKind::Unit) {
            return Err(Error::InvalidArgument(format!(
                "{} has no schema and cannot be registered",
                shape.type_name
            )));
        }

        let checkpoint = self.schemas.len();
        let schema = SchemaGenerator::new(&mut self.schemas).generate(&shape)?;
        let name = match schema.reference_name() {
            Some(name) => name.to_string(),
            None => match self.schemas.register(shape.id, shape.type_name, schema) {
                Ok(name) => name,
                Err(e) => {
                    self.schemas.truncate(checkpoint);
                    return Err(e);
                }
            },
        };
        info!("Registered model {} as {}", shape.type_name, name);

        let ModelOpts {
            description,
            enum_values,
            nullable,
            hooks,
        } = opts;
        if description.is_some() || !enum_values.is_empty() || nullable {
            self.schemas.customize(&name, move |schema| {
                if let Some(description) = &description {
                    schema.description = Some(description.clone());
                }
                if !enum_values.is_empty() {
                    schema.enum_values = enum_values.clone();
                }
                if nullable {
                    schema.nullable = true;
                }
            })?;
        }
        for hook in hooks {
            self.schemas.customize(&name, hook)?;
        }

        Ok(name)
    }

    /// Attach a customization hook to a registered component
    pub fn customize<F>(&mut self, name: &str, hook: F) -> Result<()>
    where
        F: Fn(&mut Schema) + 'static,
    {
        self.schemas.customize(name, hook)
    }

    /// Assemble the document for everything registered so far
    pub fn spec(&self) -> Result<OpenApiDocument> {
        debug!("Building spec for {} {}", self.info.title, self.info.version);
        Ok(assemble(&self.routes, &self.schemas, &self.info))
    }
}

/// Attaches documentation to one route.
///
/// Every method consumes the builder and hands it back, so calls chain with
/// `?`.
pub struct RouteBuilder<'a> {
    route: &'a mut Route,
    schemas: &'a mut SchemaRegistry,
}

impl<'a> RouteBuilder<'a> {
    /// Document the request body as `T`
    pub fn has_request<T: Reflect + ?Sized>(self, description: &str) -> Result<Self> {
        let schema = SchemaGenerator::new(&mut *self.schemas).generate_for::<T>()?;
        self.route.metadata.request = Some(RequestModel {
            schema,
            description: description.to_string(),
        });
        Ok(self)
    }

    /// Document the response for `status` as `T`; `()` documents an empty body
    pub fn has_response<T: Reflect + ?Sized>(self, status: u16, description: &str) -> Result<Self> {
        if !(100..=599).contains(&status) {
            return Err(Error::InvalidArgument(format!("invalid status code: {}", status)));
        }

        let shape = T::shape();
        let schema = match shape.kind {
            TypeKind::Unit => None,
            _ => Some(SchemaGenerator::new(&mut *self.schemas).generate(&shape)?),
        };
        self.route.metadata.responses.insert(
            status,
            ResponseModel {
                schema,
                description: description.to_string(),
            },
        );
        Ok(self)
    }

    /// Document a placeholder of the route's template
    pub fn has_path_parameter(self, name: &str, mut param: PathParam) -> Result<Self> {
        let Some(placeholder) = self.route.template.params().iter().find(|p| p.name == name) else {
            return Err(Error::InvalidArgument(format!(
                "path parameter {} is not part of {}",
                name, self.route.template
            )));
        };
        if param.pattern.is_none() {
            param.pattern = placeholder.pattern.clone();
        }
        self.route.metadata.path_params.insert(name.to_string(), param);
        Ok(self)
    }

    pub fn has_query_parameter(self, name: &str, param: QueryParam) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("empty query parameter name".to_string()));
        }
        self.route.metadata.query_params.insert(name.to_string(), param);
        Ok(self)
    }

    pub fn has_description(self, description: &str) -> Result<Self> {
        self.route.metadata.description = Some(description.to_string());
        Ok(self)
    }

    pub fn has_summary(self, summary: &str) -> Result<Self> {
        self.route.metadata.summary = Some(summary.to_string());
        Ok(self)
    }

    pub fn has_operation_id(self, operation_id: &str) -> Result<Self> {
        self.route.metadata.operation_id = Some(operation_id.to_string());
        Ok(self)
    }

    pub fn has_tags(self, tags: &[&str]) -> Result<Self> {
        self.route.metadata.tags = tags.iter().map(|t| t.to_string()).collect();
        Ok(self)
    }

    pub fn has_deprecated(self, deprecated: bool) -> Result<Self> {
        self.route.metadata.deprecated = deprecated;
        Ok(self)
    }
}
