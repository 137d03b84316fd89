//! Raw LZ4 block primitive.

use crate::error::{CodecError, Result};

use super::traits::{CodecInfo, DecodeParams, Decompressor};

/// LZ4 block codec (no size prefix, no frame).
///
/// The destination size is taken from the record, so the block is decoded
/// straight into the output buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Primitive;

impl Lz4Primitive {
    /// Compress `raw` into a single LZ4 block.
    pub fn compress(raw: &[u8]) -> Vec<u8> {
        lz4_flex::block::compress(raw)
    }
}

impl Decompressor for Lz4Primitive {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "lz4",
            library: "lz4_flex",
            reports_size: false,
        }
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8], _params: &DecodeParams) -> Result<usize> {
        lz4_flex::block::decompress_into(src, dst).map_err(|e| CodecError::primitive("lz4", e))
    }
}
