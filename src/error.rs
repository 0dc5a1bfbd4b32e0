use crate::types::TypeIdentifier;
use thiserror::Error;

/// Failure of a single value conversion.
///
/// Every variant is recoverable: one bad column never poisons the rest of
/// the row, the caller decides whether it becomes a row error, a NULL or a
/// statement failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Text or bytes do not match any grammar accepted for the type
    #[error("invalid input syntax for type {type_id}: \"{input}\"")]
    Format { type_id: TypeIdentifier, input: String },

    /// Well-formed value outside the type's representable range
    #[error("value \"{value}\" is out of range for type {type_id}")]
    Range { type_id: TypeIdentifier, value: String },

    #[error("time zone \"{0}\" not recognized")]
    UnknownTimezone(String),

    /// Native value variant does not belong to the requested type
    #[error("cannot encode {found} value as type {expected}")]
    TypeMismatch { expected: TypeIdentifier, found: &'static str },
}

impl CodecError {
    pub fn format(type_id: TypeIdentifier, input: impl Into<String>) -> Self {
        CodecError::Format { type_id, input: input.into() }
    }

    pub fn range(type_id: TypeIdentifier, value: impl ToString) -> Self {
        CodecError::Range { type_id, value: value.to_string() }
    }

    /// Get the PostgreSQL SQLSTATE for this error
    pub fn sqlstate(&self) -> &'static str {
        match self {
            CodecError::Format { type_id, .. } if type_id.is_temporal() => "22007", // invalid_datetime_format
            CodecError::Format { .. } => "22P02", // invalid_text_representation
            CodecError::Range { type_id, .. } if type_id.is_temporal() => "22008", // datetime_field_overflow
            CodecError::Range { .. } => "22003", // numeric_value_out_of_range
            CodecError::UnknownTimezone(_) => "22023", // invalid_parameter_value
            CodecError::TypeMismatch { .. } => "42804", // datatype_mismatch
        }
    }
}

/// Failure while building a registry from configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timezone table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid UTC offset \"{offset}\" for time zone {name}")]
    InvalidOffset { name: String, offset: String },

    #[error("Unknown session time zone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid date order: {0}")]
    InvalidDateOrder(String),
}
