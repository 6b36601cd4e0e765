//! Error types for the m3g library.

use thiserror::Error;

/// Main error type for m3g operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not start with the M3G file identifier
    #[error("Invalid M3G file: bad file identifier")]
    MalformedHeader,

    /// Section uses a compression scheme this library does not know
    #[error("Unknown compression scheme: {0}")]
    UnknownCompressionScheme(u8),

    /// Section checksum does not match the bytes on the wire
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Input ended in the middle of a value
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Object tag outside the closed set of known kinds
    #[error("Unknown object type: {0}")]
    UnknownObjectType(u8),

    /// Enumerated field holds a value outside its legal constant set
    #[error("Invalid value {value} for field {field}")]
    InvalidEnumValue { field: &'static str, value: u32 },

    /// Reference index does not point at an existing table entry
    #[error("Dangling reference in field {field}: index {index}")]
    DanglingReference { field: &'static str, index: u32 },

    /// Reference resolves to an object of the wrong kind
    #[error("Field {field} expects {expected}, got {actual}")]
    WrongReferentKind {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// Reference resolves through an external reference nobody supplied
    #[error("Unresolved external reference: {0}")]
    UnresolvedExternalReference(String),

    /// Structurally invalid data on either the read or the write path
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an invalid enum value error for a named field.
    pub fn bad_enum(field: &'static str, value: impl Into<u32>) -> Self {
        Self::InvalidEnumValue {
            field,
            value: value.into(),
        }
    }
}

/// Result type alias for m3g operations.
pub type Result<T> = std::result::Result<T, Error>;
