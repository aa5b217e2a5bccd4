//! Error types for argument binding.

use girder_core::TypeInfo;
use thiserror::Error;

/// Result type for route compilation.
pub type BindingResult<T> = Result<T, ConfigurationError>;

/// A handler that cannot be bound. Raised while compiling a route, never
/// while serving a request.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Cannot bind parameter {index} of {method}: {kind}")]
pub struct ConfigurationError {
    pub method: String,
    pub index: usize,
    pub kind: ConfigurationErrorKind,
}

impl ConfigurationError {
    pub fn new(method: impl Into<String>, index: usize, kind: ConfigurationErrorKind) -> Self {
        Self {
            method: method.into(),
            index,
            kind,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationErrorKind {
    /// Two parameters would both take the request body.
    #[error("parameter {first} already binds the request body")]
    AmbiguousBody { first: usize },

    #[error("no body parser registered for {0}")]
    NoBodyParser(TypeInfo),

    #[error("validator {validator} checks {validated}, which is neither {extracted} nor {declared}")]
    ValidatorMismatch {
        validator: &'static str,
        validated: TypeInfo,
        extracted: TypeInfo,
        declared: TypeInfo,
    },

    #[error("no parser converts {extracted} into {declared}")]
    NoParser { extracted: TypeInfo, declared: TypeInfo },

    #[error("extractor produces {extracted}, which cannot bind to {declared}")]
    TypeMismatch { extracted: TypeInfo, declared: TypeInfo },

    #[error("extractor could not be built: {0}")]
    Factory(String),

    #[error("annotation targets a parameter, but the method takes only {count}")]
    NoSuchParameter { count: usize },
}

/// Request-time failure of a single extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot read request body: {0}")]
    Body(#[from] girder_core::Error),

    #[error("Cannot access upload {field}: {message}")]
    Upload { field: String, message: String },

    #[error("Attribute {name} is not a {expected}")]
    Attribute { name: String, expected: &'static str },
}

/// Why a compiled handler could not be called.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The request did not supply a usable value for a parameter.
    #[error("Cannot bind argument {index} of {method}: {reason}")]
    Binding {
        method: String,
        index: usize,
        reason: String,
    },

    /// The assembled arguments did not fit the handler. Always a framework
    /// bug.
    #[error("Invocation fault in {method}: {reason}")]
    Fault { method: String, reason: String },
}

impl InvocationError {
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::Binding { .. })
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    /// HTTP status the outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Binding { .. } => 400,
            Self::Fault { .. } => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_method_and_index() {
        let err = ConfigurationError::new(
            "UserController::create",
            2,
            ConfigurationErrorKind::AmbiguousBody { first: 1 },
        );
        let message = err.to_string();
        assert!(message.contains("UserController::create"));
        assert!(message.contains("parameter 2"));
        assert!(message.contains("parameter 1 already binds"));
    }

    #[test]
    fn test_invocation_error_classification() {
        let binding = InvocationError::Binding {
            method: "m".into(),
            index: 0,
            reason: "missing".into(),
        };
        let fault = InvocationError::Fault {
            method: "m".into(),
            reason: "arity".into(),
        };
        assert!(binding.is_binding() && !binding.is_fault());
        assert!(fault.is_fault());
        assert_eq!(binding.status_code(), 400);
        assert_eq!(fault.status_code(), 500);
    }
}
