use crate::error::{Error, Result};
use crate::schema::Schema;
use indexmap::IndexMap;
use log::debug;
use std::any::TypeId;
use std::collections::HashMap;

/// Customization callback run against a component before it is emitted
pub type SchemaHook = Box<dyn Fn(&mut Schema)>;

/// A schema stored once under a stable name
#[derive(Debug, Clone)]
pub struct NamedSchema {
    /// Component name
    pub name: String,
    /// Identity of the originating type
    pub type_id: TypeId,
    /// Fully-qualified name of the originating type
    pub type_name: String,
    /// The schema body as generated
    pub schema: Schema,
}

/// Schema registry - deduplicates named schemas by type identity
///
/// Names are derived from the fully-qualified type name with the configured
/// module prefixes stripped. Components keep their registration order.
#[derive(Default)]
pub struct SchemaRegistry {
    /// Module prefixes removed from type names before naming
    strip_pkg_paths: Vec<String>,
    /// Registered components, in registration order
    schemas: IndexMap<String, NamedSchema>,
    /// Component name of every registered type
    names: HashMap<TypeId, String>,
    /// Customization hooks, in registration order
    hooks: Vec<(String, SchemaHook)>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        debug!("Initializing SchemaRegistry");
        Self::default()
    }

    /// Replace the list of module prefixes stripped from type names
    pub fn set_strip_pkg_paths(&mut self, prefixes: Vec<String>) {
        self.strip_pkg_paths = prefixes;
    }

    pub fn strip_pkg_paths(&self) -> &[String] {
        &self.strip_pkg_paths
    }

    /// Derive the component name of a fully-qualified type name.
    ///
    /// Every path inside the name, generic arguments included, loses its
    /// longest matching prefix; the remaining separators collapse into `_`.
    pub fn derive_name(&self, type_name: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut token = String::new();
        let mut in_lifetime = false;

        for c in type_name.chars() {
            let ident_char = c.is_alphanumeric() || c == '_';
            if in_lifetime && ident_char {
                continue;
            }
            in_lifetime = false;

            if ident_char || c == ':' {
                token.push(c);
            } else {
                // Lifetimes (`'a`, `'static`) carry no naming information.
                in_lifetime = c == '\'';
                self.push_token(&mut parts, &token);
                token.clear();
            }
        }
        self.push_token(&mut parts, &token);

        parts.join("_")
    }

    fn push_token(&self, parts: &mut Vec<String>, token: &str) {
        let stripped = self.strip_prefix(token);
        let collapsed = stripped
            .split("::")
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        if !collapsed.is_empty() {
            parts.push(collapsed);
        }
    }

    /// Remove the longest configured prefix that ends on a `::` boundary
    fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        let mut best: Option<&'a str> = None;
        let mut best_len = 0;

        for prefix in &self.strip_pkg_paths {
            let prefix = prefix.trim_end_matches("::");
            if prefix.is_empty() || prefix.len() <= best_len {
                continue;
            }
            if let Some(rest) = path.strip_prefix(prefix) {
                if let Some(rest) = rest.strip_prefix("::") {
                    best = Some(rest);
                    best_len = prefix.len();
                }
            }
        }

        best.unwrap_or(path)
    }

    /// Component name of a registered type
    pub fn name_of(&self, type_id: TypeId) -> Option<&str> {
        self.names.get(&type_id).map(|s| s.as_str())
    }

    /// Fail if `name` already belongs to a different type
    pub fn check_collision(&self, name: &str, type_id: TypeId, type_name: &str) -> Result<()> {
        match self.schemas.get(name) {
            Some(existing) if existing.type_id != type_id => Err(Error::SchemaNameCollision {
                name: name.to_string(),
                existing: existing.type_name.clone(),
                incoming: type_name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Register a schema for a type, returning its component name.
    ///
    /// Registering the same type again returns the existing name and keeps the
    /// first body.
    pub fn register(&mut self, type_id: TypeId, type_name: &str, schema: Schema) -> Result<String> {
        if let Some(name) = self.names.get(&type_id) {
            debug!("Schema for {} already registered as {}", type_name, name);
            return Ok(name.clone());
        }

        let name = self.derive_name(type_name);
        self.check_collision(&name, type_id, type_name)?;

        debug!("Registering schema {} for {}", name, type_name);
        self.names.insert(type_id, name.clone());
        self.schemas.insert(
            name.clone(),
            NamedSchema {
                name: name.clone(),
                type_id,
                type_name: type_name.to_string(),
                schema,
            },
        );

        Ok(name)
    }

    /// Drop every component registered after the first `len`, together with
    /// their hooks
    pub fn truncate(&mut self, len: usize) {
        if len >= self.schemas.len() {
            return;
        }
        for (name, named) in self.schemas.drain(len..) {
            debug!("Discarding schema {} for {}", name, named.type_name);
            self.names.remove(&named.type_id);
            self.hooks.retain(|(hooked, _)| *hooked != name);
        }
    }

    /// Attach a customization hook to a registered component
    pub fn customize<F>(&mut self, name: &str, hook: F) -> Result<()>
    where
        F: Fn(&mut Schema) + 'static,
    {
        if !self.schemas.contains_key(name) {
            return Err(Error::SchemaNotFound(name.to_string()));
        }
        debug!("Adding customization hook for {}", name);
        self.hooks.push((name.to_string(), Box::new(hook)));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NamedSchema> {
        self.schemas.get(name)
    }

    /// Registered components in registration order
    pub fn iter(&self) -> impl Iterator<Item = &NamedSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Component bodies with every hook applied, in registration order
    pub fn finalize(&self) -> IndexMap<String, Schema> {
        let mut schemas: IndexMap<String, Schema> = self
            .schemas
            .iter()
            .map(|(name, named)| (name.clone(), named.schema.clone()))
            .collect();

        for (name, hook) in &self.hooks {
            if let Some(schema) = schemas.get_mut(name) {
                debug!("Applying customization hook to {}", name);
                hook(schema);
            }
        }

        schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectSchema;

    mod a {
        pub struct Topic;
    }

    mod b {
        pub struct Topic;
    }

    fn registry_with_prefixes(prefixes: &[&str]) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.set_strip_pkg_paths(prefixes.iter().map(|p| p.to_string()).collect());
        registry
    }

    #[test]
    fn test_derive_name_without_prefixes() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.derive_name("app::models::Topic"), "app_models_Topic");
    }

    #[test]
    fn test_derive_name_strips_prefix() {
        let registry = registry_with_prefixes(&["app::models"]);
        assert_eq!(registry.derive_name("app::models::Topic"), "Topic");
        assert_eq!(registry.derive_name("app::other::Topic"), "app_other_Topic");
    }

    #[test]
    fn test_derive_name_prefers_longest_prefix() {
        let registry = registry_with_prefixes(&["app", "app::models"]);
        assert_eq!(registry.derive_name("app::models::Topic"), "Topic");
        assert_eq!(registry.derive_name("app::errors::Error"), "errors_Error");
    }

    #[test]
    fn test_derive_name_respects_segment_boundaries() {
        let registry = registry_with_prefixes(&["app"]);
        assert_eq!(registry.derive_name("apple::Topic"), "apple_Topic");
    }

    #[test]
    fn test_derive_name_generic_arguments() {
        let registry = registry_with_prefixes(&["app::models"]);
        assert_eq!(
            registry.derive_name("app::models::Page<app::models::Topic>"),
            "Page_Topic"
        );
    }

    #[test]
    fn test_derive_name_drops_lifetimes() {
        let registry = registry_with_prefixes(&["app::models"]);
        assert_eq!(registry.derive_name("&'static str"), "str");
        assert_eq!(
            registry.derive_name("app::models::Page<'a, app::models::Topic>"),
            "Page_Topic"
        );
    }

    #[test]
    fn test_truncate_forgets_components() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(TypeId::of::<a::Topic>(), "a::Topic", Schema::string())
            .unwrap();
        let name = registry
            .register(TypeId::of::<b::Topic>(), "b::Topic", Schema::string())
            .unwrap();
        registry.customize(&name, |_| {}).unwrap();

        registry.truncate(1);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("b_Topic").is_none());
        assert!(registry.name_of(TypeId::of::<b::Topic>()).is_none());
        assert!(registry.name_of(TypeId::of::<a::Topic>()).is_some());
        assert!(registry.hooks.is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = SchemaRegistry::new();
        let id = TypeId::of::<a::Topic>();
        let first = registry
            .register(id, "a::Topic", Schema::object(ObjectSchema::default()))
            .unwrap();
        let second = registry.register(id, "a::Topic", Schema::string()).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&first).unwrap().schema.as_object().is_some());
    }

    #[test]
    fn test_register_collision() {
        let mut registry = registry_with_prefixes(&["a", "b"]);
        registry
            .register(TypeId::of::<a::Topic>(), "a::Topic", Schema::string())
            .unwrap();
        let result = registry.register(TypeId::of::<b::Topic>(), "b::Topic", Schema::string());

        match result {
            Err(Error::SchemaNameCollision {
                name,
                existing,
                incoming,
            }) => {
                assert_eq!(name, "Topic");
                assert_eq!(existing, "a::Topic");
                assert_eq!(incoming, "b::Topic");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn test_customize_unknown_schema() {
        let mut registry = SchemaRegistry::new();
        let result = registry.customize("Missing", |_| {});
        assert!(matches!(result, Err(Error::SchemaNotFound(_))));
    }

    #[test]
    fn test_hooks_apply_in_registration_order() {
        let mut registry = SchemaRegistry::new();
        let name = registry
            .register(TypeId::of::<a::Topic>(), "Topic", Schema::string())
            .unwrap();
        registry
            .customize(&name, |s| s.description = Some("first".to_string()))
            .unwrap();
        registry
            .customize(&name, |s| {
                let previous = s.description.clone().unwrap_or_default();
                s.description = Some(format!("{} then second", previous));
            })
            .unwrap();

        let schemas = registry.finalize();
        assert_eq!(
            schemas["Topic"].description.as_deref(),
            Some("first then second")
        );
        // The stored body stays untouched.
        assert!(registry.get("Topic").unwrap().schema.description.is_none());
    }
}
