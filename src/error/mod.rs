//! Error types for the NTNDArray codec library.

use thiserror::Error;

use crate::array::ScalarType;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Main error type for codec dispatch and decompression.
///
/// Every variant carries enough context (codec name, sizes, element type)
/// for the caller to log the failed frame and move on.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The record has no decodable scalar array.
    #[error("Missing payload: {0}")]
    MissingPayload(String),

    /// Codec name not in the supported set.
    #[error(
        "Unknown compression={name} compressedSize={compressed_size} uncompressedSize={uncompressed_size}"
    )]
    UnknownCodec {
        /// Codec name as delivered.
        name: String,
        /// Declared compressed size in bytes.
        compressed_size: i64,
        /// Declared uncompressed size in bytes.
        uncompressed_size: i64,
    },

    /// Codec does not support the declared element type.
    #[error("{codec} compression not supported for element type {element_type}")]
    UnsupportedTypeForCodec {
        /// Codec name.
        codec: String,
        /// Declared element type.
        element_type: ScalarType,
    },

    /// The primitive produced a different number of bytes than declared.
    #[error("{codec} decompress produced {actual} bytes, expected uncompressedSize={expected}")]
    DecompressSizeMismatch {
        /// Codec name.
        codec: String,
        /// Declared uncompressed size in bytes.
        expected: usize,
        /// Bytes reported by the primitive.
        actual: usize,
    },

    /// Opaque failure surfaced by a decompression primitive.
    #[error("{codec} primitive failed: {message}")]
    PrimitiveFailure {
        /// Codec name.
        codec: String,
        /// Failure detail from the primitive.
        message: String,
    },

    /// Record failed size or parameter validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Build a [`CodecError::PrimitiveFailure`] from any displayable error.
    pub fn primitive(codec: &str, err: impl std::fmt::Display) -> Self {
        CodecError::PrimitiveFailure {
            codec: codec.to_string(),
            message: err.to_string(),
        }
    }

    /// Whether the error came from validating the record rather than from decoding.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CodecError::MissingPayload(_)
                | CodecError::UnknownCodec { .. }
                | CodecError::UnsupportedTypeForCodec { .. }
                | CodecError::InvalidRecord(_)
        )
    }
}

impl From<toml::de::Error> for CodecError {
    fn from(err: toml::de::Error) -> Self {
        CodecError::Config(err.to_string())
    }
}
