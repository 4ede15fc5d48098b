use thiserror::Error;

use crate::catalog::CatalogError;
use crate::domain::product::ProductId;
use crate::recommendations::SuggestionError;
use crate::scan::VerificationError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("product `{0}` was not found")]
    ProductNotFound(ProductId),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound(id) => Self::Domain(DomainError::ProductNotFound(id)),
            CatalogError::Fetch(message) => Self::Persistence(message),
        }
    }
}

impl From<SuggestionError> for ApplicationError {
    fn from(value: SuggestionError) -> Self {
        Self::Integration(value.to_string())
    }
}

impl From<VerificationError> for ApplicationError {
    fn from(value: VerificationError) -> Self {
        Self::Domain(DomainError::Verification(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => crate::scan::NOT_FOUND_MESSAGE,
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::ProductNotFound(id)) => {
                Self::NotFound { message: format!("product `{id}`"), correlation_id }
            }
            ApplicationError::Domain(DomainError::Verification(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::BadRequest {
                message: "domain validation failed".to_owned(),
                correlation_id,
            },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::CatalogError;
    use crate::domain::product::ProductId;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::recommendations::SuggestionError;
    use crate::scan::VerificationError;

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::InvariantViolation(
            "cart item `X1` has a negative price -50.00".to_owned(),
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
    }

    #[test]
    fn bad_request_has_user_safe_message() {
        let interface = ApplicationError::from(VerificationError::Mismatch {
            expected: ProductId::new("P100"),
            scanned: "P200".to_owned(),
        })
        .into_interface("req-2");

        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn missing_product_maps_to_not_found() {
        let interface = ApplicationError::from(CatalogError::NotFound(ProductId::new("P404")))
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.user_message(), "Product not found.");
        assert_eq!(interface.correlation_id(), "req-3");
    }

    #[test]
    fn fetch_and_suggestion_failures_map_to_service_unavailable() {
        for error in [
            ApplicationError::from(CatalogError::Fetch("database lock timeout".to_owned())),
            ApplicationError::from(SuggestionError::Request("timed out".to_owned())),
        ] {
            let interface = error.into_interface("req-4");
            assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
            assert_eq!(
                interface.user_message(),
                "The service is temporarily unavailable. Please retry shortly."
            );
        }
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("invalid api key".to_owned()).into_interface("req-5");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
