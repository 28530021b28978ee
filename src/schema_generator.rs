use crate::error::{Error, Result};
use crate::schema::{ObjectSchema, PrimitiveKind, Schema};
use crate::schema_registry::SchemaRegistry;
use crate::shape::{PrimitiveType, Reflect, Shape, StructDef, TypeKind};
use log::debug;
use std::any::TypeId;

/// Schema generator - converts type metadata to schemas
///
/// Every struct reached during generation is stored in the [`SchemaRegistry`]
/// and returned as a reference, so two models sharing a type share one
/// component. Types already on the expansion stack are referenced instead of
/// expanded, which makes self-referential types terminate.
pub struct SchemaGenerator<'r> {
    /// Registry receiving every discovered struct
    registry: &'r mut SchemaRegistry,
    /// Structs currently being expanded: (identity, component name, type name)
    expanding: Vec<(TypeId, String, &'static str)>,
    /// Structs currently being flattened into a parent
    flattening: Vec<TypeId>,
}

impl<'r> SchemaGenerator<'r> {
    /// Create a new SchemaGenerator writing into `registry`
    pub fn new(registry: &'r mut SchemaRegistry) -> Self {
        Self {
            registry,
            expanding: Vec::new(),
            flattening: Vec::new(),
        }
    }

    /// Generate a schema for `T`
    pub fn generate_for<T: Reflect + ?Sized>(&mut self) -> Result<Schema> {
        self.generate(&T::shape())
    }

    /// Generate a schema for a shape.
    ///
    /// On failure every component registered during the call is removed again.
    pub fn generate(&mut self, shape: &Shape) -> Result<Schema> {
        debug!("Generating schema for type: {}", shape.type_name);
        let checkpoint = self.registry.len();
        let path = short_type_name(shape.type_name);
        let result = self.generate_at(shape, &path);
        if result.is_err() {
            self.registry.truncate(checkpoint);
        }
        result
    }

    fn generate_at(&mut self, shape: &Shape, path: &str) -> Result<Schema> {
        // Registered types are referenced whatever their kind.
        if let Some(name) = self.registry.name_of(shape.id) {
            debug!("Schema for {} already exists", shape.type_name);
            return Ok(Schema::reference(name));
        }

        match &shape.kind {
            TypeKind::Primitive(prim) => Ok(primitive_to_schema(*prim)),
            TypeKind::Option(inner) | TypeKind::Pointer(inner) => self.generate_at(&inner(), path),
            TypeKind::Seq(element) => {
                let items = self.generate_at(&element(), &format!("{}[]", path))?;
                Ok(Schema::array(items))
            }
            TypeKind::Map(value) => {
                let value = self.generate_at(&value(), path)?;
                Ok(Schema::object(ObjectSchema {
                    additional_properties: Some(Box::new(value)),
                    ..ObjectSchema::default()
                }))
            }
            TypeKind::Struct(def) => self.generate_struct(shape, def, path),
            TypeKind::Unit => Err(Error::UnsupportedType {
                path: path.to_string(),
                kind: "unit".to_string(),
            }),
            TypeKind::Unsupported(kind) => Err(Error::UnsupportedType {
                path: path.to_string(),
                kind: kind.to_string(),
            }),
        }
    }

    /// Generate a struct's component (once) and return a reference to it
    fn generate_struct(&mut self, shape: &Shape, def: &StructDef, path: &str) -> Result<Schema> {
        if let Some((_, name, _)) = self.expanding.iter().find(|(id, _, _)| *id == shape.id) {
            debug!("Circular reference detected for type: {}", shape.type_name);
            return Ok(Schema::reference(name));
        }

        let name = self.registry.derive_name(shape.type_name);
        self.registry
            .check_collision(&name, shape.id, shape.type_name)?;
        if let Some((_, _, other)) = self.expanding.iter().find(|(_, n, _)| *n == name) {
            return Err(Error::SchemaNameCollision {
                name,
                existing: other.to_string(),
                incoming: shape.type_name.to_string(),
            });
        }

        debug!("Generating struct schema for: {}", shape.type_name);
        self.expanding.push((shape.id, name, shape.type_name));
        let mut object = ObjectSchema::default();
        let result = self.collect_fields(def, path, true, &mut object);
        self.expanding.pop();
        result?;

        let name = self
            .registry
            .register(shape.id, shape.type_name, Schema::object(object))?;
        Ok(Schema::reference(&name))
    }

    /// Add a struct's fields to `object`
    fn collect_fields(
        &mut self,
        def: &StructDef,
        path: &str,
        may_require: bool,
        object: &mut ObjectSchema,
    ) -> Result<()> {
        for field in &def.fields {
            if field.attrs.skip {
                continue;
            }

            let field_path = format!("{}.{}", path, field.name);
            let field_shape = (field.shape)();

            if field.attrs.flatten {
                let may_require = may_require && !field.attrs.optional;
                self.flatten_into(&field_shape, &field_path, may_require, object)?;
                continue;
            }

            let field_name = field.serialized_name().to_string();
            let schema = self.generate_at(&field_shape, &field_path)?;
            object.properties.insert(field_name.clone(), schema);

            if may_require && !field.attrs.optional && !is_optional(&field_shape) {
                object.required.push(field_name);
            }
        }
        Ok(())
    }

    /// Merge the fields of an embedded struct into the parent object
    fn flatten_into(
        &mut self,
        shape: &Shape,
        path: &str,
        may_require: bool,
        object: &mut ObjectSchema,
    ) -> Result<()> {
        match &shape.kind {
            TypeKind::Option(inner) => self.flatten_into(&inner(), path, false, object),
            TypeKind::Pointer(inner) => self.flatten_into(&inner(), path, may_require, object),
            TypeKind::Struct(def) => {
                let recursive = self.flattening.contains(&shape.id)
                    || self.expanding.iter().any(|(id, _, _)| *id == shape.id);
                if recursive {
                    return Err(Error::UnsupportedType {
                        path: path.to_string(),
                        kind: format!("recursively flattened {}", shape.type_name),
                    });
                }

                debug!("Flattening {} into parent", shape.type_name);
                self.flattening.push(shape.id);
                let result = self.collect_fields(def, path, may_require, object);
                self.flattening.pop();
                result
            }
            _ => Err(Error::UnsupportedType {
                path: path.to_string(),
                kind: format!("flattened non-struct {}", shape.type_name),
            }),
        }
    }
}

/// Whether a field of this shape may be absent
fn is_optional(shape: &Shape) -> bool {
    match &shape.kind {
        TypeKind::Option(_) => true,
        TypeKind::Pointer(inner) => is_optional(&inner()),
        _ => false,
    }
}

/// Convert a primitive type to a schema
fn primitive_to_schema(primitive: PrimitiveType) -> Schema {
    let (kind, format) = match primitive {
        PrimitiveType::String | PrimitiveType::Char => (PrimitiveKind::String, None),
        PrimitiveType::I8 | PrimitiveType::I16 | PrimitiveType::I32 => {
            (PrimitiveKind::Integer, Some("int32"))
        }
        PrimitiveType::I64 | PrimitiveType::I128 => (PrimitiveKind::Integer, Some("int64")),
        PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 => {
            (PrimitiveKind::Integer, Some("int32"))
        }
        PrimitiveType::U64 | PrimitiveType::U128 => (PrimitiveKind::Integer, Some("int64")),
        PrimitiveType::F32 => (PrimitiveKind::Number, Some("float")),
        PrimitiveType::F64 => (PrimitiveKind::Number, Some("double")),
        PrimitiveType::Bool => (PrimitiveKind::Boolean, None),
    };

    let schema = Schema::primitive(kind);
    match format {
        Some(format) => schema.with_format(format),
        None => schema,
    }
}

/// `app::models::Page<app::models::Topic>` -> `Page`
fn short_type_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
