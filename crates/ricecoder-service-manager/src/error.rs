//! Error types for registration and resolution

use thiserror::Error;

/// Errors that can occur while registering or resolving dependencies
#[derive(Debug, Error)]
pub enum DIError {
    #[error("Identifier \"{id}\" does not exist in the container")]
    UnknownIdentifier { id: String },

    #[error("Dependency \"{id}\" already exists in the container")]
    DuplicateDependency { id: String },

    #[error("Class \"{class}\" is not instantiable")]
    NotInstantiable { class: String },

    #[error("Class \"{class}\" is not described in the class catalog")]
    UnknownClass { class: String },

    #[error("Failed to resolve the class {class} because param {parameter} is missing a type hint")]
    MissingTypeHint { class: String, parameter: String },

    #[error("Failed to resolve the class {class} because of union type of param {parameter} ({})", types.join("|"))]
    UnsupportedUnionType {
        class: String,
        parameter: String,
        types: Vec<String>,
    },

    #[error("Failed to resolve the class {class} because param {parameter} has unresolvable type {type_name}")]
    UnresolvableParameter {
        class: String,
        parameter: String,
        type_name: String,
    },

    #[error("Dependency \"{id}\" cannot be resolved: {message}")]
    ResolutionError { id: String, message: String },

    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    #[error("Failed to construct class {class}")]
    ConstructionFailed {
        class: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Service type mismatch for \"{id}\": expected {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    #[error("Identifiers must be non-empty strings")]
    InvalidIdentifier,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DIResult<T> = Result<T, DIError>;

impl DIError {
    pub(crate) fn unknown(id: &str) -> Self {
        DIError::UnknownIdentifier { id: id.to_string() }
    }

    pub(crate) fn unresolvable(id: &str, message: impl Into<String>) -> Self {
        DIError::ResolutionError {
            id: id.to_string(),
            message: message.into(),
        }
    }
}

pub(crate) fn ensure_identifier(id: &str) -> DIResult<()> {
    if id.is_empty() {
        return Err(DIError::InvalidIdentifier);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = DIError::CyclicDependency {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
    }

    #[test]
    fn test_missing_type_hint_names_parameter() {
        let err = DIError::MissingTypeHint {
            class: "Mailer".into(),
            parameter: "transport".into(),
        };
        assert!(err.to_string().contains("param transport is missing a type hint"));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        assert!(matches!(ensure_identifier(""), Err(DIError::InvalidIdentifier)));
        assert!(ensure_identifier("logger").is_ok());
    }
}
