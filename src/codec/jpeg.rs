//! JPEG primitive.
//!
//! areaDetector compresses 8-bit mono or RGB frames with libjpeg. The
//! decoder returns interleaved samples in the order they were encoded, so an
//! `RGB1` frame comes back as `[r, g, b, r, g, b, ...]`.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};

use crate::error::{CodecError, Result};

use super::traits::{CodecInfo, DecodeParams, Decompressor};

/// Default encoder quality.
pub const DEFAULT_QUALITY: u8 = 90;

/// JPEG codec for `ubyte` frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegPrimitive;

impl JpegPrimitive {
    /// Encode `raw` as a `width` x `height` JPEG with 1 (gray) or 3 (RGB)
    /// interleaved components.
    pub fn compress(raw: &[u8], width: u32, height: u32, components: u8, quality: u8) -> Result<Vec<u8>> {
        let color = match components {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            n => {
                return Err(CodecError::primitive(
                    "jpeg",
                    format!("{} components per pixel cannot be encoded", n),
                ))
            }
        };
        let expected = width as usize * height as usize * components as usize;
        if raw.len() != expected {
            return Err(CodecError::primitive(
                "jpeg",
                format!("{} bytes do not fill a {}x{}x{} image", raw.len(), width, height, components),
            ));
        }

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode(raw, width, height, color)
            .map_err(|e| CodecError::primitive("jpeg", e))?;

        log::debug!(
            "JPEG encoded {}x{}x{} frame to {} bytes (quality {})",
            width,
            height,
            components,
            out.len(),
            quality
        );
        Ok(out)
    }
}

impl Decompressor for JpegPrimitive {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "jpeg",
            library: "image",
            reports_size: false,
        }
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8], _params: &DecodeParams) -> Result<usize> {
        let decoded = image::load_from_memory_with_format(src, ImageFormat::Jpeg)
            .map_err(|e| CodecError::primitive("jpeg", e))?
            .into_bytes();
        if decoded.len() > dst.len() {
            return Err(CodecError::primitive(
                "jpeg",
                format!("image holds {} samples, destination has room for {}", decoded.len(), dst.len()),
            ));
        }
        dst[..decoded.len()].copy_from_slice(&decoded);
        Ok(decoded.len())
    }
}
