//! openapi-synth - OpenAPI documents from live routers and typed models.
//!
//! The routes of a document come from the router itself, so the document
//! cannot list a route the router does not serve, and documentation cannot be
//! attached to one. Request and response models are described by their Rust
//! types through the [`shape::Reflect`] trait.
//!
//! # Architecture
//!
//! 1. [`shape`] - Runtime type metadata for models
//! 2. [`schema_generator`] - Converts type metadata to schemas, breaking cycles
//! 3. [`schema_registry`] - Named, deduplicated components and their hooks
//! 4. [`route_registry`] - Routes keyed by method and path template
//! 5. [`adapter`] - Router adapters and the merge into the route registry
//! 6. [`openapi_builder`] - Assembles the OpenAPI document
//! 7. [`api`] - The setup-time facade tying the above together
//! 8. [`serializer`] - Serializes the document to YAML or JSON
//!
//! [`source`] and [`cli`] read axum and actix-web routers from source code for
//! the command-line tool.
//!
//! # Example Usage
//!
//! ```
//! use openapi_synth::adapter::{PlaceholderSyntax, RouteTable};
//! use openapi_synth::api::Api;
//! use openapi_synth::route_registry::HttpMethod;
//! use openapi_synth::shape::{FieldDef, Reflect, Shape};
//!
//! struct TopicsPostResponse {
//!     id: String,
//! }
//!
//! impl Reflect for TopicsPostResponse {
//!     fn shape() -> Shape {
//!         Shape::structure::<Self>(vec![FieldDef::new::<String>("id")])
//!     }
//! }
//!
//! # fn main() -> openapi_synth::error::Result<()> {
//! let mut router = RouteTable::new("chi", PlaceholderSyntax::Braces);
//! router.route(HttpMethod::Post, "/topics", "create_topic");
//!
//! let mut api = Api::new("Messaging API", "1.0.0");
//! api.set_strip_pkg_paths(vec![module_path!().to_string()]);
//! api.merge(&router)?;
//! api.post("/topics")?
//!     .has_response::<TopicsPostResponse>(200, "topic response")?;
//!
//! let spec = api.spec()?;
//! assert!(spec.component("TopicsPostResponse").is_some());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod api;
pub mod cli;
pub mod error;
pub mod openapi_builder;
pub mod route_registry;
pub mod schema;
pub mod schema_generator;
pub mod schema_registry;
pub mod serializer;
pub mod shape;
pub mod source;
