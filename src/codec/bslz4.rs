//! Bitshuffle + LZ4 primitive.
//!
//! Stream layout, for `n` elements of `elem_size` bytes split into blocks:
//!
//! ```text
//! [u32 BE compressed len][LZ4 block of bit-shuffled bytes]   × full blocks
//! [u32 BE compressed len][LZ4 block]                         last block, n' = rem - rem % 8
//! [raw bytes]                                                trailing n % 8 elements
//! ```

use crate::error::{CodecError, Result};

use super::bitshuffle::{bitshuffle, bitunshuffle};
use super::traits::{CodecInfo, DecodeParams, Decompressor};

const TARGET_BLOCK_BYTES: usize = 8192;
const BLOCK_MULTIPLE: usize = 8;
const MIN_BLOCK_ELEMENTS: usize = 128;

/// Default elements per block for a given element size.
pub fn default_block_size(elem_size: usize) -> usize {
    let block = TARGET_BLOCK_BYTES / elem_size.max(1);
    let block = block / BLOCK_MULTIPLE * BLOCK_MULTIPLE;
    block.max(MIN_BLOCK_ELEMENTS)
}

fn resolve_block_size(block_size: usize, elem_size: usize) -> Result<usize> {
    match block_size {
        0 => Ok(default_block_size(elem_size)),
        b if b % BLOCK_MULTIPLE == 0 => Ok(b),
        b => Err(CodecError::primitive(
            "bslz4",
            format!("block size {} is not a multiple of {}", b, BLOCK_MULTIPLE),
        )),
    }
}

/// Bitshuffle/LZ4 codec as used by areaDetector's `bslz4` compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bslz4Primitive;

impl Bslz4Primitive {
    /// Compress `raw` (whole elements of `elem_size` bytes).
    pub fn compress(raw: &[u8], elem_size: usize, block_size: usize) -> Result<Vec<u8>> {
        if elem_size == 0 || raw.len() % elem_size != 0 {
            return Err(CodecError::primitive(
                "bslz4",
                format!("{} bytes is not a whole number of {}-byte elements", raw.len(), elem_size),
            ));
        }
        let block = resolve_block_size(block_size, elem_size)?;
        let n = raw.len() / elem_size;
        let mut out = Vec::with_capacity(raw.len() / 2 + 16);
        let mut shuffled = vec![0u8; block * elem_size];

        for (start, count) in block_spans(n, block) {
            let bytes = &raw[start * elem_size..(start + count) * elem_size];
            let tmp = &mut shuffled[..bytes.len()];
            bitshuffle(bytes, tmp, elem_size);
            let compressed = lz4_flex::block::compress(tmp);
            out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
            out.extend_from_slice(&compressed);
        }

        let leftover = n % BLOCK_MULTIPLE;
        out.extend_from_slice(&raw[(n - leftover) * elem_size..]);
        Ok(out)
    }
}

/// Element spans `(start, count)` of every LZ4-compressed block.
fn block_spans(n: usize, block: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(n / block + 1);
    let full = n / block;
    for b in 0..full {
        spans.push((b * block, block));
    }
    let rem = n % block;
    let last = rem - rem % BLOCK_MULTIPLE;
    if last > 0 {
        spans.push((full * block, last));
    }
    spans
}

impl Decompressor for Bslz4Primitive {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "bslz4",
            library: "bitshuffle/lz4_flex",
            reports_size: false,
        }
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8], params: &DecodeParams) -> Result<usize> {
        let elem_size = params.element_size;
        if elem_size == 0 {
            return Err(CodecError::primitive("bslz4", "element size is zero"));
        }
        let block = resolve_block_size(params.block_size, elem_size)?;
        let n = dst.len() / elem_size;
        let mut pos = 0usize;
        let mut unpacked = vec![0u8; block * elem_size];

        for (start, count) in block_spans(n, block) {
            let header = src
                .get(pos..pos + 4)
                .ok_or_else(|| CodecError::primitive("bslz4", "truncated block header"))?;
            let nbytes = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
            pos += 4;
            let body = src.get(pos..pos + nbytes).ok_or_else(|| {
                CodecError::primitive(
                    "bslz4",
                    format!("block at element {} claims {} bytes past end of input", start, nbytes),
                )
            })?;
            pos += nbytes;

            let expected = count * elem_size;
            let tmp = &mut unpacked[..expected];
            let written = lz4_flex::block::decompress_into(body, tmp)
                .map_err(|e| CodecError::primitive("bslz4", e))?;
            if written != expected {
                return Err(CodecError::primitive(
                    "bslz4",
                    format!("block at element {} decoded {} of {} bytes", start, written, expected),
                ));
            }
            bitunshuffle(tmp, &mut dst[start * elem_size..start * elem_size + expected], elem_size);
        }

        let leftover = (n % BLOCK_MULTIPLE) * elem_size;
        if leftover > 0 {
            let tail = src
                .get(pos..pos + leftover)
                .ok_or_else(|| CodecError::primitive("bslz4", "truncated trailing elements"))?;
            let at = (n * elem_size) - leftover;
            dst[at..at + leftover].copy_from_slice(tail);
        }

        Ok(n * elem_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ScalarType;

    fn params(element_type: ScalarType, block_size: usize) -> DecodeParams {
        DecodeParams {
            element_type,
            element_size: element_type.element_size().unwrap(),
            block_size,
        }
    }

    #[test]
    fn test_default_block_size() {
        assert_eq!(default_block_size(1), 8192);
        assert_eq!(default_block_size(2), 4096);
        assert_eq!(default_block_size(4), 2048);
        assert_eq!(default_block_size(8), 1024);
        assert_eq!(default_block_size(128), 128);
    }

    #[test]
    fn test_block_spans_cover_all_but_trailing_elements() {
        let spans = block_spans(300, 128);
        assert_eq!(spans, vec![(0, 128), (128, 128), (256, 40)]);
        // 300 = 296 blocked + 4 raw
        let spans = block_spans(301, 128);
        assert_eq!(spans.last(), Some(&(256, 40)));
    }

    #[test]
    fn test_round_trip_with_partial_block_and_leftover() {
        let values: Vec<u16> = (0..1003u32).map(|i| (i * 7 % 4000) as u16).collect();
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();

        let compressed = Bslz4Primitive::compress(&raw, 2, 256).unwrap();
        let mut dst = vec![0u8; raw.len()];
        let written = Bslz4Primitive
            .decompress(&compressed, &mut dst, &params(ScalarType::UInt16, 256))
            .unwrap();
        assert_eq!(written, raw.len());
        assert_eq!(dst, raw);
    }

    #[test]
    fn test_default_block_size_round_trip_f64() {
        let values: Vec<f64> = (0..5000).map(|i| (i as f64).sin()).collect();
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();

        let compressed = Bslz4Primitive::compress(&raw, 8, 0).unwrap();
        let mut dst = vec![0u8; raw.len()];
        Bslz4Primitive
            .decompress(&compressed, &mut dst, &params(ScalarType::Float64, 0))
            .unwrap();
        assert_eq!(dst, raw);
    }

    #[test]
    fn test_truncated_stream_fails() {
        let raw = vec![5u8; 2048];
        let compressed = Bslz4Primitive::compress(&raw, 1, 0).unwrap();
        let mut dst = vec![0u8; raw.len()];
        let err = Bslz4Primitive
            .decompress(&compressed[..compressed.len() - 2], &mut dst, &params(ScalarType::UInt8, 0))
            .unwrap_err();
        assert!(matches!(err, CodecError::PrimitiveFailure { .. }));
    }

    #[test]
    fn test_known_stream_u16_with_trailing_elements() {
        // Eleven u16 elements: eight bit-transposed into one literal-only LZ4
        // block (token 0xF0, extra length byte 0x01: sixteen literals), then
        // three raw elements.
        let mut stream = vec![0x00, 0x00, 0x00, 0x12, 0xF0, 0x01];
        stream.extend_from_slice(&[
            0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80,
        ]);
        stream.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

        let mut dst = vec![0u8; 22];
        let written = Bslz4Primitive
            .decompress(&stream, &mut dst, &params(ScalarType::UInt16, 0))
            .unwrap();
        assert_eq!(written, 22);
        assert_eq!(
            dst,
            [
                0x01, 0x01, 0x02, 0x00, 0x04, 0x00, 0x08, 0x00, 0x10, 0x00, 0x20, 0x00, 0x40, 0x00, 0x80, 0xFF,
                0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
            ]
        );
    }

    #[test]
    fn test_known_stream_u8_two_blocks() {
        // Block size 8: block one is eight 0x01 (plane 0 all ones), block two
        // is 0..8 (planes 0xAA, 0xCC, 0xF0), then one raw trailing byte.
        let stream = [
            0x00, 0x00, 0x00, 0x09, 0x80, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x09, 0x80, 0xAA, 0xCC, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x42,
        ];
        let mut dst = vec![0u8; 17];
        Bslz4Primitive
            .decompress(&stream, &mut dst, &params(ScalarType::UInt8, 8))
            .unwrap();
        assert_eq!(
            dst,
            [1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 2, 3, 4, 5, 6, 7, 0x42]
        );
    }

    #[test]
    fn test_block_size_must_be_multiple_of_eight() {
        let mut dst = vec![0u8; 64];
        let err = Bslz4Primitive
            .decompress(&[], &mut dst, &params(ScalarType::UInt8, 12))
            .unwrap_err();
        assert!(err.to_string().contains("multiple of 8"));
    }
}
