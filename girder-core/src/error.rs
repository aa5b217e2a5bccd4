// Error types for the Girder framework

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Dependency injection error: {0}")]
    DependencyInjection(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) | Error::Deserialization(_) | Error::Validation(_) => 400,
            Error::UnsupportedMediaType(_) => 415,
            Error::Serialization(_)
            | Error::ProviderNotFound(_)
            | Error::DependencyInjection(_)
            | Error::Internal(_)
            | Error::Io(_) => 500,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::Deserialization("x".into()).status_code(), 400);
        assert_eq!(Error::UnsupportedMediaType("x".into()).status_code(), 415);
        assert_eq!(Error::ProviderNotFound("x".into()).status_code(), 500);
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::Validation("x".into()).is_client_error());
        assert!(!Error::Validation("x".into()).is_server_error());

        let io = Error::from(std::io::Error::other("disk"));
        assert!(io.is_server_error());
        assert_eq!(io.to_string(), "IO error: disk");
    }
}
