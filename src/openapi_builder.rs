//! Assembly of the final OpenAPI document.
//!
//! [`assemble`] walks the route registry and the schema registry and renders
//! them into the OpenAPI 3.0 object model. Paths keep the order in which
//! their first route was registered; components keep registration order.

use crate::route_registry::{HttpMethod, Route, RouteRegistry};
use crate::schema::{Schema, SchemaNode, COMPONENT_REF_PREFIX};
use crate::schema_registry::SchemaRegistry;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAPI version emitted in every document
pub const OPENAPI_VERSION: &str = "3.0.0";

const JSON_MEDIA_TYPE: &str = "application/json";

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Info {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
        }
    }
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// PATCH operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// OPTIONS operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// TRACE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    /// The operation registered under `method`
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Mutable access for post-assembly customization
    pub fn operation_mut(&mut self, method: HttpMethod) -> Option<&mut Operation> {
        self.slot(method).as_mut()
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    /// Parameters: path parameters first, then query parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code, or `default`
    pub responses: IndexMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query)
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: SchemaObject,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "allowEmptyValue", skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: SchemaObject,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<IndexMap<String, SchemaObject>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
    /// Components (schemas, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiDocument {
    /// The operation documented for `method` on `path`
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.operation(method))
    }

    /// A named component schema
    pub fn component(&self, name: &str) -> Option<&SchemaObject> {
        self.components
            .as_ref()
            .and_then(|c| c.schemas.as_ref())
            .and_then(|schemas| schemas.get(name))
    }
}

/// OpenAPI Schema object as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Component reference
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Schema type (e.g., "object", "string", "integer", "array")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Array element schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaObject>>,
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaObject>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl From<&Schema> for SchemaObject {
    fn from(schema: &Schema) -> Self {
        let mut object = SchemaObject {
            format: schema.format.clone(),
            description: schema.description.clone(),
            minimum: schema.minimum,
            maximum: schema.maximum,
            min_length: schema.min_length,
            max_length: schema.max_length,
            pattern: schema.pattern.clone(),
            nullable: schema.nullable.then_some(true),
            example: schema.example.clone(),
            ..Default::default()
        };
        if !schema.enum_values.is_empty() {
            object.enum_values = Some(schema.enum_values.clone());
        }

        match &schema.node {
            SchemaNode::Primitive(kind) => {
                object.schema_type = Some(kind.as_str().to_string());
            }
            SchemaNode::Array(items) => {
                object.schema_type = Some("array".to_string());
                object.items = Some(Box::new(SchemaObject::from(items.as_ref())));
            }
            SchemaNode::Object(obj) => {
                object.schema_type = Some("object".to_string());
                if !obj.properties.is_empty() {
                    object.properties = Some(
                        obj.properties
                            .iter()
                            .map(|(name, prop)| (name.clone(), SchemaObject::from(prop)))
                            .collect(),
                    );
                }
                if !obj.required.is_empty() {
                    object.required = Some(obj.required.clone());
                }
                object.additional_properties = obj
                    .additional_properties
                    .as_ref()
                    .map(|value| Box::new(SchemaObject::from(value.as_ref())));
            }
            SchemaNode::Reference(name) => {
                object.reference = Some(format!("{}{}", COMPONENT_REF_PREFIX, name));
            }
        }

        object
    }
}

/// Assemble the document for everything registered so far.
///
/// Never fails: every inconsistency is rejected when it is registered.
pub fn assemble(routes: &RouteRegistry, schemas: &SchemaRegistry, info: &Info) -> OpenApiDocument {
    debug!(
        "Assembling OpenAPI document: {} routes, {} schemas",
        routes.len(),
        schemas.len()
    );

    let mut paths: IndexMap<String, PathItem> = IndexMap::new();
    for route in routes.iter() {
        let operation = build_operation(route);
        let path_item = paths.entry(route.template.as_str().to_string()).or_default();
        *path_item.slot(route.method) = Some(operation);
    }

    let finalized = schemas.finalize();
    let components = if finalized.is_empty() {
        None
    } else {
        Some(Components {
            schemas: Some(
                finalized
                    .iter()
                    .map(|(name, schema)| (name.clone(), SchemaObject::from(schema)))
                    .collect(),
            ),
        })
    };

    OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: info.clone(),
        paths,
        components,
    }
}

fn build_operation(route: &Route) -> Operation {
    let metadata = &route.metadata;
    debug!("Building operation: {} {}", route.method, route.template);

    let mut parameters = Vec::new();
    for (name, param) in &metadata.path_params {
        let mut schema = param.schema.clone().unwrap_or_else(Schema::string);
        if schema.pattern.is_none() {
            schema.pattern = param.pattern.clone();
        }
        parameters.push(Parameter {
            name: name.clone(),
            location: "path".to_string(),
            required: true,
            schema: SchemaObject::from(&schema),
            description: param.description.clone(),
            allow_empty_value: None,
        });
    }
    for (name, param) in &metadata.query_params {
        let mut schema = param.schema.clone().unwrap_or_else(Schema::string);
        if schema.pattern.is_none() {
            schema.pattern = param.pattern.clone();
        }
        parameters.push(Parameter {
            name: name.clone(),
            location: "query".to_string(),
            required: param.required,
            schema: SchemaObject::from(&schema),
            description: param.description.clone(),
            allow_empty_value: param.allow_empty.then_some(true),
        });
    }

    let request_body = metadata.request.as_ref().map(|request| RequestBody {
        description: Some(request.description.clone()).filter(|d| !d.is_empty()),
        required: true,
        content: json_content(&request.schema),
    });

    let mut responses = IndexMap::new();
    if metadata.responses.is_empty() {
        responses.insert(
            "default".to_string(),
            Response {
                description: "Undocumented response".to_string(),
                content: None,
            },
        );
    }
    for (status, response) in &metadata.responses {
        responses.insert(
            status.to_string(),
            Response {
                description: response.description.clone(),
                content: response.schema.as_ref().map(json_content),
            },
        );
    }

    Operation {
        summary: metadata.summary.clone(),
        description: metadata.description.clone(),
        operation_id: metadata.operation_id.clone(),
        tags: (!metadata.tags.is_empty()).then(|| metadata.tags.clone()),
        deprecated: metadata.deprecated.then_some(true),
        parameters: (!parameters.is_empty()).then_some(parameters),
        request_body,
        responses,
    }
}

fn json_content(schema: &Schema) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(
        JSON_MEDIA_TYPE.to_string(),
        MediaType {
            schema: SchemaObject::from(schema),
        },
    );
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_registry::{QueryParam, RequestModel, ResponseModel, RouteMetadata};
    use crate::schema::ObjectSchema;
    use std::any::TypeId;

    struct Topic;
    struct ErrorBody;

    fn topic_schema() -> Schema {
        let mut object = ObjectSchema::default();
        object.properties.insert("topic".to_string(), Schema::string());
        object.required.push("topic".to_string());
        Schema::object(object)
    }

    fn response(schema: Option<Schema>, description: &str) -> ResponseModel {
        ResponseModel {
            schema,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_empty_document() {
        let doc = assemble(
            &RouteRegistry::new(),
            &SchemaRegistry::new(),
            &Info::new("Empty", "0.1.0"),
        );
        assert_eq!(doc.openapi, "3.0.0");
        assert_eq!(doc.info.title, "Empty");
        assert!(doc.paths.is_empty());
        assert!(doc.components.is_none());
    }

    #[test]
    fn test_paths_keep_registration_order() {
        let mut routes = RouteRegistry::new();
        for (method, path) in [
            (HttpMethod::Get, "/topics"),
            (HttpMethod::Get, "/topic/{id}"),
            (HttpMethod::Post, "/topics"),
        ] {
            routes.upsert(method, path, RouteMetadata::default()).unwrap();
        }

        let doc = assemble(&routes, &SchemaRegistry::new(), &Info::new("API", "1.0.0"));
        let paths: Vec<_> = doc.paths.keys().cloned().collect();
        assert_eq!(paths, vec!["/topics", "/topic/{id}"]);
        assert!(doc.operation("/topics", HttpMethod::Post).is_some());
        assert!(doc.operation("/topics", HttpMethod::Delete).is_none());
    }

    #[test]
    fn test_undocumented_route_gets_default_response() {
        let mut routes = RouteRegistry::new();
        routes
            .upsert(HttpMethod::Get, "/health", RouteMetadata::default())
            .unwrap();

        let doc = assemble(&routes, &SchemaRegistry::new(), &Info::new("API", "1.0.0"));
        let operation = doc.operation("/health", HttpMethod::Get).unwrap();
        let keys: Vec<_> = operation.responses.keys().cloned().collect();
        assert_eq!(keys, vec!["default"]);
        assert_eq!(operation.responses["default"].description, "Undocumented response");
    }

    #[test]
    fn test_shared_model_emitted_once() {
        let mut schemas = SchemaRegistry::new();
        let name = schemas
            .register(TypeId::of::<Topic>(), "Topic", topic_schema())
            .unwrap();

        let mut routes = RouteRegistry::new();
        for path in ["/topics", "/topic/{id}"] {
            routes
                .upsert(HttpMethod::Get, path, RouteMetadata::default())
                .unwrap();
            routes
                .with_response(
                    HttpMethod::Get,
                    path,
                    200,
                    response(Some(Schema::reference(&name)), "topic"),
                )
                .unwrap();
        }

        let doc = assemble(&routes, &schemas, &Info::new("API", "1.0.0"));
        let components = doc.components.as_ref().unwrap().schemas.as_ref().unwrap();
        assert_eq!(components.len(), 1);

        for path in ["/topics", "/topic/{id}"] {
            let operation = doc.operation(path, HttpMethod::Get).unwrap();
            let content = operation.responses["200"].content.as_ref().unwrap();
            assert_eq!(
                content["application/json"].schema.reference.as_deref(),
                Some("#/components/schemas/Topic")
            );
        }
    }

    #[test]
    fn test_parameters_path_then_query() {
        let mut metadata = RouteMetadata::default();
        metadata.query_params.insert(
            "verbose".to_string(),
            QueryParam {
                allow_empty: true,
                ..Default::default()
            },
        );
        let mut routes = RouteRegistry::new();
        routes
            .upsert(HttpMethod::Get, "/topic/{id:[0-9]+}", metadata)
            .unwrap();

        let doc = assemble(&routes, &SchemaRegistry::new(), &Info::new("API", "1.0.0"));
        let parameters = doc
            .operation("/topic/{id}", HttpMethod::Get)
            .unwrap()
            .parameters
            .as_ref()
            .unwrap();

        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].name, "id");
        assert_eq!(parameters[0].location, "path");
        assert!(parameters[0].required);
        assert_eq!(parameters[0].schema.schema_type.as_deref(), Some("string"));
        assert_eq!(parameters[0].schema.pattern.as_deref(), Some("[0-9]+"));
        assert_eq!(parameters[1].name, "verbose");
        assert_eq!(parameters[1].location, "query");
        assert!(!parameters[1].required);
        assert_eq!(parameters[1].allow_empty_value, Some(true));
    }

    #[test]
    fn test_request_body_and_bodiless_response() {
        let mut routes = RouteRegistry::new();
        routes
            .upsert(HttpMethod::Delete, "/topic/{id}", RouteMetadata::default())
            .unwrap();
        routes
            .with_request(
                HttpMethod::Delete,
                "/topic/{id}",
                RequestModel {
                    schema: topic_schema(),
                    description: "topic to delete".to_string(),
                },
            )
            .unwrap();
        routes
            .with_response(HttpMethod::Delete, "/topic/{id}", 204, response(None, "deleted"))
            .unwrap();

        let doc = assemble(&routes, &SchemaRegistry::new(), &Info::new("API", "1.0.0"));
        let operation = doc.operation("/topic/{id}", HttpMethod::Delete).unwrap();

        let body = operation.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.description.as_deref(), Some("topic to delete"));
        assert_eq!(
            body.content["application/json"].schema.required,
            Some(vec!["topic".to_string()])
        );
        assert!(operation.responses["204"].content.is_none());
    }

    #[test]
    fn test_responses_sorted_by_status() {
        let mut routes = RouteRegistry::new();
        routes
            .upsert(HttpMethod::Get, "/topics", RouteMetadata::default())
            .unwrap();
        for status in [500, 200, 404] {
            routes
                .with_response(HttpMethod::Get, "/topics", status, response(None, "r"))
                .unwrap();
        }

        let doc = assemble(&routes, &SchemaRegistry::new(), &Info::new("API", "1.0.0"));
        let keys: Vec<_> = doc
            .operation("/topics", HttpMethod::Get)
            .unwrap()
            .responses
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["200", "404", "500"]);
    }

    #[test]
    fn test_customization_hooks_are_applied() {
        let mut object = ObjectSchema::default();
        object.properties.insert("statusCode".to_string(), Schema::integer());
        let mut schemas = SchemaRegistry::new();
        schemas
            .register(TypeId::of::<ErrorBody>(), "ErrorBody", Schema::object(object))
            .unwrap();
        schemas
            .customize("ErrorBody", |schema| {
                if let Some(status) = schema.property_mut("statusCode") {
                    status.with_min(100.0).with_max(600.0);
                }
            })
            .unwrap();

        let doc = assemble(&RouteRegistry::new(), &schemas, &Info::new("API", "1.0.0"));
        let error = doc.component("ErrorBody").unwrap();
        let status = &error.properties.as_ref().unwrap()["statusCode"];
        assert_eq!(status.minimum, Some(100.0));
        assert_eq!(status.maximum, Some(600.0));
    }

    #[test]
    fn test_schema_object_serialization() {
        let mut object = ObjectSchema::default();
        object
            .properties
            .insert("items".to_string(), Schema::array(Schema::reference("Topic")));
        object.additional_properties = Some(Box::new(Schema::integer()));
        let json = serde_json::to_value(SchemaObject::from(&Schema::object(object))).unwrap();

        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["items"]["type"], "array");
        assert_eq!(
            json["properties"]["items"]["items"]["$ref"],
            "#/components/schemas/Topic"
        );
        assert_eq!(json["additionalProperties"]["type"], "integer");
        assert!(json.get("required").is_none());
        assert!(json.get("nullable").is_none());
    }
}
