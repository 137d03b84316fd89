//! NTNDArray record model.
//!
//! This is the subset of the areaDetector NTNDArray structure that the codec
//! layer reads and writes: the dimension list, the codec descriptor, the two
//! size fields, and the `value` union holding the payload.

use crate::array::{ScalarArray, ScalarType};
use crate::error::{CodecError, Result};

/// One entry of the NTNDArray `dimension` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Number of elements along this axis.
    pub size: usize,
    /// Offset relative to the detector origin.
    pub offset: usize,
    /// Unbinned size.
    pub full_size: usize,
    /// Binning factor.
    pub binning: usize,
    /// Whether the axis is reversed.
    pub reverse: bool,
}

impl Dimension {
    /// A plain axis of `size` elements.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            offset: 0,
            full_size: size,
            binning: 1,
            reverse: false,
        }
    }
}

/// The `codec` field: codec name plus the original element type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodecDescriptor {
    /// Codec name; empty means the payload is not compressed.
    pub name: String,
    /// pvData ordinal of the decompressed element type.
    pub parameters: Option<i32>,
}

impl CodecDescriptor {
    /// Descriptor for an uncompressed payload.
    pub fn none() -> Self {
        Self::default()
    }

    /// Descriptor for `name` decoding to `element_type`.
    pub fn new(name: impl Into<String>, element_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            parameters: Some(element_type.code()),
        }
    }

    /// Whether a codec is applied to the payload.
    pub fn is_compressed(&self) -> bool {
        !self.name.is_empty()
    }

    /// Resolve the element type carried in `parameters`.
    pub fn element_type(&self) -> Result<ScalarType> {
        let code = self.parameters.ok_or_else(|| {
            CodecError::InvalidRecord(format!(
                "codec {} carries no element type parameter",
                self.name
            ))
        })?;
        ScalarType::from_code(code).ok_or_else(|| {
            CodecError::InvalidRecord(format!(
                "codec {} element type code {} is not a pvData scalar type",
                self.name, code
            ))
        })
    }
}

/// How color samples are laid out in the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayout {
    /// Single plane.
    Mono,
    /// Pixel interleaved, color is dimension 0.
    Rgb1,
    /// Row interleaved, color is dimension 1.
    Rgb2,
    /// Plane interleaved, color is dimension 2.
    Rgb3,
}

/// Image extents derived from the dimension list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    /// Width.
    pub nx: usize,
    /// Height.
    pub ny: usize,
    /// Color planes (1 or 3).
    pub nz: usize,
    /// Which dimension carries color.
    pub layout: ColorLayout,
}

/// A (possibly compressed) NTNDArray as delivered by a monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct NtndArray {
    /// Array extents; the first two are X and Y.
    pub dimension: Vec<Dimension>,
    /// Codec applied to `value`.
    pub codec: CodecDescriptor,
    /// Bytes in `value` as delivered.
    pub compressed_size: i64,
    /// Bytes after decompression.
    pub uncompressed_size: i64,
    /// Payload; replaced by the typed result on successful decompression.
    pub value: Option<ScalarArray>,
}

impl NtndArray {
    /// An uncompressed record holding `value`.
    pub fn uncompressed(dims: &[usize], value: ScalarArray) -> Self {
        let size = (value.len() * value.scalar_type().element_size().unwrap_or(1)) as i64;
        Self {
            dimension: dims.iter().map(|&d| Dimension::new(d)).collect(),
            codec: CodecDescriptor::none(),
            compressed_size: size,
            uncompressed_size: size,
            value: Some(value),
        }
    }

    /// A record carrying `compressed` bytes produced by `codec`.
    pub fn compressed(
        dims: &[usize],
        codec: &str,
        element_type: ScalarType,
        compressed: Vec<u8>,
        uncompressed_size: usize,
    ) -> Self {
        Self {
            dimension: dims.iter().map(|&d| Dimension::new(d)).collect(),
            codec: CodecDescriptor::new(codec, element_type),
            compressed_size: compressed.len() as i64,
            uncompressed_size: uncompressed_size as i64,
            value: Some(ScalarArray::UInt8(compressed)),
        }
    }

    /// Product of the dimension sizes (0 when there are no dimensions), or
    /// `None` if it overflows `usize`.
    pub fn num_elements(&self) -> Option<usize> {
        if self.dimension.is_empty() {
            return Some(0);
        }
        self.dimension
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(d.size))
    }

    /// `num_elements × element size` for `element_type`.
    pub fn expected_uncompressed_size(&self, element_type: ScalarType) -> Result<usize> {
        let size = element_type.element_size().ok_or_else(|| {
            CodecError::InvalidRecord(format!("element type {} is not numeric", element_type))
        })?;
        self.num_elements()
            .and_then(|n| n.checked_mul(size))
            .ok_or_else(|| {
                CodecError::InvalidRecord(format!(
                    "dimensions {:?} of {} overflow the address space",
                    self.dimension.iter().map(|d| d.size).collect::<Vec<_>>(),
                    element_type
                ))
            })
    }

    /// Verify that `uncompressed_size` agrees with the dimensions and element type.
    pub fn check_uncompressed_size(&self) -> Result<()> {
        let element_type = if self.codec.is_compressed() {
            self.codec.element_type()?
        } else {
            self.value
                .as_ref()
                .map(|v| v.scalar_type())
                .ok_or_else(|| CodecError::MissingPayload("value not found".into()))?
        };
        let expected = self.expected_uncompressed_size(element_type)?;
        if usize::try_from(self.uncompressed_size).ok() != Some(expected) {
            return Err(CodecError::InvalidRecord(format!(
                "uncompressedSize={} but dimensions describe {} bytes of {}",
                self.uncompressed_size, expected, element_type
            )));
        }
        Ok(())
    }

    /// Image extents and color layout.
    ///
    /// In a 3-D array the first axis of size 3 is the color plane.
    pub fn image_shape(&self) -> Result<ImageShape> {
        let sizes: Vec<usize> = self.dimension.iter().map(|d| d.size).collect();
        let shape = match sizes.as_slice() {
            [nx] => ImageShape {
                nx: *nx,
                ny: 1,
                nz: 1,
                layout: ColorLayout::Mono,
            },
            [nx, ny] => ImageShape {
                nx: *nx,
                ny: *ny,
                nz: 1,
                layout: ColorLayout::Mono,
            },
            [3, nx, ny] => ImageShape {
                nx: *nx,
                ny: *ny,
                nz: 3,
                layout: ColorLayout::Rgb1,
            },
            [nx, 3, ny] => ImageShape {
                nx: *nx,
                ny: *ny,
                nz: 3,
                layout: ColorLayout::Rgb2,
            },
            [nx, ny, 3] => ImageShape {
                nx: *nx,
                ny: *ny,
                nz: 3,
                layout: ColorLayout::Rgb3,
            },
            [_, _, _] => {
                return Err(CodecError::InvalidRecord(format!(
                    "3-D array {:?} has no axis of size 3",
                    sizes
                )))
            }
            _ => {
                return Err(CodecError::InvalidRecord(format!(
                    "{} dimensions; expected 1, 2 or 3",
                    sizes.len()
                )))
            }
        };
        Ok(shape)
    }
}
