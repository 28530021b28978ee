use indexmap::IndexMap;
use serde_json::Value;

/// Prefix of every component reference in the assembled document
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// A schema fragment: one structural node plus the annotations customization
/// hooks may attach to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// The structural shape
    pub node: SchemaNode,
    pub description: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "double")
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub enum_values: Vec<Value>,
    pub nullable: bool,
    pub example: Option<Value>,
}

/// Tagged structural node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Primitive(PrimitiveKind),
    Array(Box<Schema>),
    Object(ObjectSchema),
    /// Name of a registered component
    Reference(String),
}

/// Primitive schema kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    Number,
    String,
}

/// Object shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Properties in declaration order
    pub properties: IndexMap<String, Schema>,
    /// Required property names in declaration order
    pub required: Vec<String>,
    /// Value shape of string-keyed maps
    pub additional_properties: Option<Box<Schema>>,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
        }
    }
}

impl Schema {
    /// Create an unannotated schema from a node
    pub fn new(node: SchemaNode) -> Self {
        Self {
            node,
            description: None,
            format: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            enum_values: Vec::new(),
            nullable: false,
            example: None,
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(SchemaNode::Primitive(kind))
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        Self::primitive(PrimitiveKind::Integer)
    }

    pub fn array(items: Schema) -> Self {
        Self::new(SchemaNode::Array(Box::new(items)))
    }

    pub fn object(object: ObjectSchema) -> Self {
        Self::new(SchemaNode::Object(object))
    }

    /// A reference to the named component
    pub fn reference(name: &str) -> Self {
        Self::new(SchemaNode::Reference(name.to_string()))
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn with_min(&mut self, minimum: f64) -> &mut Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_max(&mut self, maximum: f64) -> &mut Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn with_enum(&mut self, values: Vec<Value>) -> &mut Self {
        self.enum_values = values;
        self
    }

    /// The referenced component name, if this is a reference
    pub fn reference_name(&self) -> Option<&str> {
        match &self.node {
            SchemaNode::Reference(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.node {
            SchemaNode::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Mutable access to a named property of an object schema
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Schema> {
        match &mut self.node {
            SchemaNode::Object(object) => object.properties.get_mut(name),
            _ => None,
        }
    }
}
