//! Decompression primitive trait definitions.

use crate::array::ScalarType;
use crate::error::Result;

/// Information about a primitive implementation.
#[derive(Debug, Clone)]
pub struct CodecInfo {
    /// Codec name as it appears in the NTNDArray codec field.
    pub name: &'static str,
    /// Library or algorithm family backing the primitive.
    pub library: &'static str,
    /// Whether the returned byte count is meaningful enough to validate.
    pub reports_size: bool,
}

/// Per-call parameters derived from the codec descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    /// Element type of the decompressed data.
    pub element_type: ScalarType,
    /// Bytes per element.
    pub element_size: usize,
    /// Elements per bitshuffle block; 0 selects the library default.
    pub block_size: usize,
}

/// A decompression primitive.
///
/// `src` holds exactly the compressed bytes of one frame and `dst` is the
/// destination, sized to the declared uncompressed size. Implementations
/// return the number of bytes they wrote into `dst`.
pub trait Decompressor: Send + Sync {
    /// Describe the primitive.
    fn info(&self) -> CodecInfo;

    /// Decompress `src` into `dst`.
    fn decompress(&self, src: &[u8], dst: &mut [u8], params: &DecodeParams) -> Result<usize>;
}
