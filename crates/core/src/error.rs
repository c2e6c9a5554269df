use thiserror::Error;

/// Core errors shared across the harness crates.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Service resolution failed: {service}")]
    ServiceResolutionFailed { service: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl CoreError {
    pub fn config<T: Into<String>>(message: T) -> Self {
        CoreError::ConfigError {
            message: message.into(),
        }
    }

    pub fn service_resolution<T: Into<String>>(service: T) -> Self {
        CoreError::ServiceResolutionFailed {
            service: service.into(),
        }
    }

    pub fn invalid_state<T: Into<String>>(message: T) -> Self {
        CoreError::InvalidState {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = CoreError::service_resolution("Router");
        assert_eq!(err.to_string(), "Service resolution failed: Router");

        let err = CoreError::config("missing environment");
        assert!(err.to_string().contains("missing environment"));
    }
}
