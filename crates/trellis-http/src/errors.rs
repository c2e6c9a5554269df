//! Pipeline error types.

use thiserror::Error;

/// Result type for pipeline operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors produced while driving the pipeline.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Routing failed: {message}")]
    RoutingFailed { message: String },

    #[error("Action selection failed: {message}")]
    SelectionFailed { message: String },

    #[error("Ambiguous action match: {message}")]
    AmbiguousMatch { message: String },

    #[error("Invalid action descriptor: {message}")]
    InvalidDescriptor { message: String },

    #[error("Invocation failed: {message}")]
    InvocationFailed { message: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Internal pipeline error: {message}")]
    InternalError { message: String },
}

impl HttpError {
    pub fn routing<T: Into<String>>(message: T) -> Self {
        HttpError::RoutingFailed {
            message: message.into(),
        }
    }

    pub fn selection<T: Into<String>>(message: T) -> Self {
        HttpError::SelectionFailed {
            message: message.into(),
        }
    }

    pub fn ambiguous<T: Into<String>>(message: T) -> Self {
        HttpError::AmbiguousMatch {
            message: message.into(),
        }
    }

    pub fn invalid_descriptor<T: Into<String>>(message: T) -> Self {
        HttpError::InvalidDescriptor {
            message: message.into(),
        }
    }

    pub fn invocation<T: Into<String>>(message: T) -> Self {
        HttpError::InvocationFailed {
            message: message.into(),
        }
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HttpError::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        HttpError::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_matching_variants() {
        assert!(matches!(
            HttpError::routing("boom"),
            HttpError::RoutingFailed { .. }
        ));
        assert_eq!(
            HttpError::selection("no registry").to_string(),
            "Action selection failed: no registry"
        );
    }
}
