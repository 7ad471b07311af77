use thiserror::Error;

use crate::types::CategoryTag;

#[derive(Debug, Error)]
pub enum SipPlannerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("No fund could be resolved for category {0}")]
    UnresolvableCategory(CategoryTag),

    #[error("NAV provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SipPlannerError {
    fn from(e: serde_json::Error) -> Self {
        SipPlannerError::SerializationError(e.to_string())
    }
}
