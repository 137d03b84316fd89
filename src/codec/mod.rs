//! Codec dispatch table and decompression primitives.
//!
//! The set of codecs is closed: [`CodecKind`] names each one together with
//! the element types it accepts, and a [`PrimitiveSet`] binds each kind to a
//! [`Decompressor`]. Bundled primitives:
//! - `blosc`: c-blosc 1.x frames (LZ4, zlib, zstd inner codecs)
//! - `jpeg`: baseline JPEG via `image`
//! - `lz4`: raw LZ4 blocks via `lz4_flex`
//! - `bslz4`: bitshuffle + LZ4 block streams

pub mod bitshuffle;
mod blosc;
mod bslz4;
mod jpeg;
mod lz4;
mod traits;

pub use blosc::{BloscCompressor, BloscHeader, BloscOptions, BloscPrimitive, Shuffle};
pub use bslz4::{default_block_size, Bslz4Primitive};
pub use jpeg::{JpegPrimitive, DEFAULT_QUALITY};
pub use lz4::Lz4Primitive;
pub use traits::{CodecInfo, DecodeParams, Decompressor};

use std::fmt;

use crate::array::ScalarType;
use crate::error::{CodecError, Result};
use crate::ntnd::{ColorLayout, ImageShape};

/// Compression codecs an NTNDArray may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    /// c-blosc frame.
    Blosc,
    /// Baseline JPEG.
    Jpeg,
    /// Raw LZ4 block.
    Lz4,
    /// Bitshuffle + LZ4.
    Bslz4,
}

impl CodecKind {
    /// All codecs, in dispatch-table order.
    pub const ALL: [CodecKind; 4] = [CodecKind::Blosc, CodecKind::Jpeg, CodecKind::Lz4, CodecKind::Bslz4];

    /// Look up a codec by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "blosc" => Some(CodecKind::Blosc),
            "jpeg" => Some(CodecKind::Jpeg),
            "lz4" => Some(CodecKind::Lz4),
            "bslz4" => Some(CodecKind::Bslz4),
            _ => None,
        }
    }

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::Blosc => "blosc",
            CodecKind::Jpeg => "jpeg",
            CodecKind::Lz4 => "lz4",
            CodecKind::Bslz4 => "bslz4",
        }
    }

    /// Whether frames of `element_type` can be decoded with this codec.
    pub fn supports(&self, element_type: ScalarType) -> bool {
        match self {
            CodecKind::Jpeg => element_type == ScalarType::UInt8,
            CodecKind::Blosc | CodecKind::Lz4 | CodecKind::Bslz4 => element_type.is_numeric(),
        }
    }

    /// Whether the primitive's byte count must equal the declared size.
    pub fn checks_output_size(&self) -> bool {
        matches!(self, CodecKind::Blosc)
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One [`Decompressor`] per codec.
pub struct PrimitiveSet {
    blosc: Box<dyn Decompressor>,
    jpeg: Box<dyn Decompressor>,
    lz4: Box<dyn Decompressor>,
    bslz4: Box<dyn Decompressor>,
}

impl Default for PrimitiveSet {
    fn default() -> Self {
        Self {
            blosc: Box::new(BloscPrimitive),
            jpeg: Box::new(JpegPrimitive),
            lz4: Box::new(Lz4Primitive),
            bslz4: Box::new(Bslz4Primitive),
        }
    }
}

impl PrimitiveSet {
    /// Replace the primitive used for `kind`.
    pub fn with(mut self, kind: CodecKind, primitive: Box<dyn Decompressor>) -> Self {
        *self.slot_mut(kind) = primitive;
        self
    }

    /// The primitive bound to `kind`.
    pub fn get(&self, kind: CodecKind) -> &dyn Decompressor {
        match kind {
            CodecKind::Blosc => self.blosc.as_ref(),
            CodecKind::Jpeg => self.jpeg.as_ref(),
            CodecKind::Lz4 => self.lz4.as_ref(),
            CodecKind::Bslz4 => self.bslz4.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: CodecKind) -> &mut Box<dyn Decompressor> {
        match kind {
            CodecKind::Blosc => &mut self.blosc,
            CodecKind::Jpeg => &mut self.jpeg,
            CodecKind::Lz4 => &mut self.lz4,
            CodecKind::Bslz4 => &mut self.bslz4,
        }
    }
}

impl fmt::Debug for PrimitiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(CodecKind::ALL.iter().map(|k| (k.name(), self.get(*k).info().library)))
            .finish()
    }
}

/// Encoder settings for producing compressed frames.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    /// Element type of the raw bytes.
    pub element_type: ScalarType,
    /// Image shape; required by `jpeg`.
    pub shape: Option<ImageShape>,
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Elements per bslz4 block (0 = default).
    pub block_size: usize,
    /// Frame options for `blosc`.
    pub blosc: BloscOptions,
}

impl EncodeParams {
    /// Defaults for `element_type`.
    pub fn new(element_type: ScalarType) -> Self {
        Self {
            element_type,
            shape: None,
            quality: DEFAULT_QUALITY,
            block_size: 0,
            blosc: BloscOptions::default(),
        }
    }

    /// Set the image shape.
    pub fn with_shape(mut self, shape: ImageShape) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Compress `raw` (elements in the byte order the decoder will use) with `kind`.
pub fn encode(kind: CodecKind, raw: &[u8], params: &EncodeParams) -> Result<Vec<u8>> {
    if !kind.supports(params.element_type) {
        return Err(CodecError::UnsupportedTypeForCodec {
            codec: kind.name().to_string(),
            element_type: params.element_type,
        });
    }
    let elem_size = params.element_type.element_size().unwrap_or(1);

    let encoded = match kind {
        CodecKind::Lz4 => Lz4Primitive::compress(raw),
        CodecKind::Bslz4 => Bslz4Primitive::compress(raw, elem_size, params.block_size)?,
        CodecKind::Blosc => BloscPrimitive::compress(raw, elem_size, &params.blosc)?,
        CodecKind::Jpeg => {
            let shape = params
                .shape
                .ok_or_else(|| CodecError::InvalidRecord("jpeg encoding needs image dimensions".into()))?;
            if !matches!(shape.layout, ColorLayout::Mono | ColorLayout::Rgb1) {
                return Err(CodecError::InvalidRecord(format!(
                    "jpeg encoding needs interleaved color, got {:?}",
                    shape.layout
                )));
            }
            let to_u32 = |v: usize| {
                u32::try_from(v).map_err(|_| CodecError::InvalidRecord(format!("image extent {} too large", v)))
            };
            JpegPrimitive::compress(raw, to_u32(shape.nx)?, to_u32(shape.ny)?, shape.nz as u8, params.quality)?
        }
    };

    log::debug!(
        "{} encoded {} bytes of {} to {} bytes",
        kind,
        raw.len(),
        params.element_type,
        encoded.len()
    );
    Ok(encoded)
}
