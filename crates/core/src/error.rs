//! Error types for the xbase codec
//!
//! A single error enum covers every layer (header, descriptors, records,
//! memo sidecars). Variants carry enough context to name the offending field
//! or byte so read and write failures surface their precise cause.

use thiserror::Error;

/// All codec errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Bytes are not a valid representation (bad version byte, bad numeric
    /// or date text, bad deletion flag, truncated header)
    #[error("format error in {context}: {message}")]
    Format {
        /// Where the malformed data was found (e.g. "header", field name)
        context: String,
        /// What was wrong with it
        message: String,
    },

    /// A record buffer ended before all fields could be sliced
    #[error("truncated record: expected {expected} bytes, have {available}")]
    TruncatedRecord {
        /// Bytes required by the record length
        expected: usize,
        /// Bytes actually available
        available: usize,
    },

    /// An encoded value does not fit its field
    #[error("value for field {field} needs {actual} bytes, field length is {declared}")]
    FieldOverflow {
        /// Field name
        field: String,
        /// Declared field length
        declared: usize,
        /// Length the encoded value would need
        actual: usize,
    },

    /// Record values and schema fields disagree
    #[error("schema consistency: {0}")]
    SchemaConsistency(String),

    /// Value type cannot be stored in the field
    #[error("field {field} expects {expected}, got {actual}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Type family the field accepts
        expected: &'static str,
        /// Runtime type of the value
        actual: &'static str,
    },

    /// Numeric value cannot be represented by the field's binary width
    #[error("value {value} out of range for field {field}")]
    ValueOutOfRange {
        /// Field name
        field: String,
        /// Offending value, rendered
        value: String,
    },

    /// Field type tag byte is not part of the format
    #[error("unknown field type tag 0x{0:02X}")]
    UnknownFieldType(u8),

    /// Field name is empty, too long, contains NUL, or is not Latin-1
    #[error("invalid field name {0:?}")]
    InvalidFieldName(String),

    /// Field length is not allowed for the field type
    #[error("invalid length {length} for {field_type} field {field}")]
    InvalidFieldLength {
        /// Field name
        field: String,
        /// Field type name
        field_type: &'static str,
        /// Rejected length
        length: usize,
    },

    /// Two fields share a name (ignoring case)
    #[error("duplicate field {0}")]
    DuplicateField(String),

    /// Name-keyed assignment to a field that does not exist
    #[error("unknown field {0}")]
    UnknownField(String),

    /// Version cannot express something the table needs
    #[error("{version} does not support {feature}")]
    UnsupportedFeature {
        /// Version name
        version: String,
        /// Missing capability
        feature: &'static str,
    },

    /// Memo payloads would be dropped because no memo target was given
    #[error("table has memo payloads but no memo target was supplied")]
    MemoTargetRequired,

    /// Text cannot be represented in the table's encoding
    #[error("field {field}: cannot encode text as {encoding}")]
    Encoding {
        /// Field name
        field: String,
        /// Encoding name
        encoding: &'static str,
    },

    /// Memo sidecar is malformed
    #[error("memo error: {0}")]
    Memo(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a format error
    pub fn format(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Format {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Build a memo error
    pub fn memo(message: impl Into<String>) -> Self {
        Error::Memo(message.into())
    }

    /// Check if this is a format error.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format { .. })
    }

    /// Check if this is a truncated-record error.
    pub fn is_truncated_record(&self) -> bool {
        matches!(self, Error::TruncatedRecord { .. })
    }

    /// Check if this is a field overflow error.
    pub fn is_field_overflow(&self) -> bool {
        matches!(self, Error::FieldOverflow { .. })
    }

    /// Check if this error indicates a programming mistake while building a
    /// table rather than bad input data.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::SchemaConsistency(_)
                | Error::UnknownFieldType(_)
                | Error::InvalidFieldName(_)
                | Error::InvalidFieldLength { .. }
                | Error::DuplicateField(_)
                | Error::UnknownField(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_overflow_names_field_and_lengths() {
        let err = Error::FieldOverflow {
            field: "FULLNAME".to_string(),
            declared: 5,
            actual: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("FULLNAME"));
        assert!(msg.contains('5'));
        assert!(msg.contains('8'));
        assert!(err.is_field_overflow());
        assert!(!err.is_format());
    }

    #[test]
    fn test_unknown_field_type_renders_hex() {
        let err = Error::UnknownFieldType(0x5A);
        assert_eq!(err.to_string(), "unknown field type tag 0x5A");
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
