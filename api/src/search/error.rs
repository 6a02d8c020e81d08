use super::schema::SemanticType;
use super::types::SearchFilterOperator;
use poem::{error::ResponseError, http::StatusCode};
use thiserror::Error;

/// Errors raised while decoding or compiling a search expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("Malformed search payload: {0}")]
    MalformedPayload(String),

    #[error("Field '{segment}' of '{member}' does not exist on {entity}")]
    FieldNotFound {
        member: String,
        segment: String,
        entity: &'static str,
    },

    #[error("Invalid field path '{member}': {reason}")]
    InvalidPath { member: String, reason: String },

    #[error("Field path '{member}' crosses a second collection at '{segment}'; only one collection level is supported")]
    NestedCollection { member: String, segment: String },

    #[error("Operator '{operator}' on '{member}' requires {expected}, got {actual} value(s)")]
    InvalidValueCount {
        member: String,
        operator: SearchFilterOperator,
        expected: &'static str,
        actual: usize,
    },

    #[error("Value '{value}' for '{member}' is not a valid {expected}")]
    InvalidValue {
        member: String,
        value: String,
        expected: String,
    },

    #[error("Operator '{operator}' is not supported for '{member}' of type {leaf_type}")]
    UnsupportedOperator {
        member: String,
        operator: SearchFilterOperator,
        leaf_type: SemanticType,
    },

    #[error("No search strategy registered for type {leaf_type} (field '{member}')")]
    UnregisteredType {
        member: String,
        leaf_type: SemanticType,
    },
}

impl SearchError {
    /// Client errors map to 400; everything else is a server configuration defect
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SearchError::UnregisteredType { .. })
    }

    /// Field path the error refers to, when there is one
    pub fn member(&self) -> Option<&str> {
        match self {
            SearchError::MalformedPayload(_) => None,
            SearchError::FieldNotFound { member, .. }
            | SearchError::InvalidPath { member, .. }
            | SearchError::NestedCollection { member, .. }
            | SearchError::InvalidValueCount { member, .. }
            | SearchError::InvalidValue { member, .. }
            | SearchError::UnsupportedOperator { member, .. }
            | SearchError::UnregisteredType { member, .. } => Some(member),
        }
    }
}

impl ResponseError for SearchError {
    fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
