/// Result type alias for the synthesis core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised while populating the registries.
///
/// All of these are setup-time failures: the document is either complete and
/// consistent or the caller aborts startup.
#[derive(Debug)]
pub enum Error {
    /// Reflection reached a kind that has no schema representation
    UnsupportedType { path: String, kind: String },
    /// Two distinct types simplify to the same component name
    SchemaNameCollision {
        name: String,
        existing: String,
        incoming: String,
    },
    /// Documentation attached to a route the router does not expose
    RouteNotFound { method: String, path: String },
    /// A path template names the same placeholder twice
    DuplicatePathParameter { path: String, name: String },
    /// Customization requested for a component that was never registered
    SchemaNotFound(String),
    InvalidArgument(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnsupportedType { path, kind } => {
                write!(f, "unsupported type at {}: {} cannot be described by a schema", path, kind)
            }
            Error::SchemaNameCollision {
                name,
                existing,
                incoming,
            } => write!(
                f,
                "schema name collision: {} is derived from both {} and {}",
                name, existing, incoming
            ),
            Error::RouteNotFound { method, path } => {
                write!(f, "route not found: {} {}", method, path)
            }
            Error::DuplicatePathParameter { path, name } => {
                write!(f, "duplicate path parameter {} in {}", name, path)
            }
            Error::SchemaNotFound(name) => write!(f, "schema not found: {}", name),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_type_names_member_path() {
        let err = Error::UnsupportedType {
            path: "Topic.handler".to_string(),
            kind: "function".to_string(),
        };
        assert!(err.to_string().contains("Topic.handler"));
        assert!(err.to_string().contains("function"));
    }

    #[test]
    fn test_collision_names_both_types() {
        let err = Error::SchemaNameCollision {
            name: "Topic".to_string(),
            existing: "a::Topic".to_string(),
            incoming: "b::Topic".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a::Topic"));
        assert!(msg.contains("b::Topic"));
    }
}
