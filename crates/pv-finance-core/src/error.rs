use thiserror::Error;

/// Errors raised by the pv-finance engine.
///
/// Malformed raw inputs are never errors: normalization clamps them and
/// records a correction instead.
#[derive(Debug, Error)]
pub enum PvFinanceError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Decimal overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PvFinanceError {
    fn from(e: serde_json::Error) -> Self {
        PvFinanceError::SerializationError(e.to_string())
    }
}
