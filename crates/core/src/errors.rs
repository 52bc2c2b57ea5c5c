use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("conversation must contain at least one turn")]
    EmptyConversation,
    #[error("conversation must contain at least one non-blank user turn")]
    MissingUserTurn,
}

/// Failures that reach a caller. Catalog and model failures are absorbed by
/// the pipeline, so only input validation is left.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        match self {
            Self::Domain(error) => InterfaceError::BadRequest {
                message: error.to_string(),
                correlation_id: correlation_id.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface =
            ApplicationError::from(DomainError::MissingUserTurn).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("user turn")
        ));
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface =
            ApplicationError::from(DomainError::EmptyConversation).into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
        assert_eq!(interface.correlation_id(), "req-2");
    }
}
