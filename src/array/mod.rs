//! Scalar element types and typed numeric arrays.
//!
//! [`ScalarType`] mirrors the pvData scalar-type ordinals that NTNDArray
//! producers put in the codec `parameters` field. [`ScalarArray`] is the
//! typed union that carries both the wire payload and the decoded result.

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};
use serde::Serialize;

use crate::config::Endianness;
use crate::error::{CodecError, Result};

/// pvData scalar type, identified on the wire by its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// pvBoolean (0)
    Boolean,
    /// pvByte (1)
    Int8,
    /// pvShort (2)
    Int16,
    /// pvInt (3)
    Int32,
    /// pvLong (4)
    Int64,
    /// pvUByte (5)
    UInt8,
    /// pvUShort (6)
    UInt16,
    /// pvUInt (7)
    UInt32,
    /// pvULong (8)
    UInt64,
    /// pvFloat (9)
    Float32,
    /// pvDouble (10)
    Float64,
    /// pvString (11)
    String,
}

impl ScalarType {
    /// All scalar types in ordinal order.
    pub const ALL: [ScalarType; 12] = [
        ScalarType::Boolean,
        ScalarType::Int8,
        ScalarType::Int16,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::UInt8,
        ScalarType::UInt16,
        ScalarType::UInt32,
        ScalarType::UInt64,
        ScalarType::Float32,
        ScalarType::Float64,
        ScalarType::String,
    ];

    /// Resolve a pvData ordinal as carried in the codec parameters.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// The pvData ordinal of this type.
    pub fn code(&self) -> i32 {
        match self {
            ScalarType::Boolean => 0,
            ScalarType::Int8 => 1,
            ScalarType::Int16 => 2,
            ScalarType::Int32 => 3,
            ScalarType::Int64 => 4,
            ScalarType::UInt8 => 5,
            ScalarType::UInt16 => 6,
            ScalarType::UInt32 => 7,
            ScalarType::UInt64 => 8,
            ScalarType::Float32 => 9,
            ScalarType::Float64 => 10,
            ScalarType::String => 11,
        }
    }

    /// Size in bytes of one element, or `None` for non-numeric types.
    pub fn element_size(&self) -> Option<usize> {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => Some(1),
            ScalarType::Int16 | ScalarType::UInt16 => Some(2),
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => Some(4),
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => Some(8),
            ScalarType::Boolean | ScalarType::String => None,
        }
    }

    /// Whether decoded bytes can be reinterpreted as this type.
    pub fn is_numeric(&self) -> bool {
        self.element_size().is_some()
    }

    /// Short lowercase name ("uint16", "float32", ...).
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt8 => "uint8",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = CodecError;

    /// Accepts the short names as well as the pvData spellings
    /// (`byte`, `ubyte`, `short`, `ushort`, `int`, `uint`, `long`, `ulong`,
    /// `float`, `double`).
    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.trim().to_lowercase().as_str() {
            "boolean" | "bool" => ScalarType::Boolean,
            "int8" | "byte" | "i8" => ScalarType::Int8,
            "int16" | "short" | "i16" => ScalarType::Int16,
            "int32" | "int" | "i32" => ScalarType::Int32,
            "int64" | "long" | "i64" => ScalarType::Int64,
            "uint8" | "ubyte" | "u8" => ScalarType::UInt8,
            "uint16" | "ushort" | "u16" => ScalarType::UInt16,
            "uint32" | "uint" | "u32" => ScalarType::UInt32,
            "uint64" | "ulong" | "u64" => ScalarType::UInt64,
            "float32" | "float" | "f32" => ScalarType::Float32,
            "float64" | "double" | "f64" => ScalarType::Float64,
            "string" => ScalarType::String,
            other => {
                return Err(CodecError::InvalidRecord(format!(
                    "unknown element type '{}'",
                    other
                )))
            }
        };
        Ok(ty)
    }
}

/// Typed numeric array: the NTNDArray `value` union restricted to numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarArray {
    /// Signed 8-bit samples.
    Int8(Vec<i8>),
    /// Unsigned 8-bit samples.
    UInt8(Vec<u8>),
    /// Signed 16-bit samples.
    Int16(Vec<i16>),
    /// Unsigned 16-bit samples.
    UInt16(Vec<u16>),
    /// Signed 32-bit samples.
    Int32(Vec<i32>),
    /// Unsigned 32-bit samples.
    UInt32(Vec<u32>),
    /// Signed 64-bit samples.
    Int64(Vec<i64>),
    /// Unsigned 64-bit samples.
    UInt64(Vec<u64>),
    /// 32-bit float samples.
    Float32(Vec<f32>),
    /// 64-bit float samples.
    Float64(Vec<f64>),
}

impl ScalarArray {
    /// Element type tag of this array.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarArray::Int8(_) => ScalarType::Int8,
            ScalarArray::UInt8(_) => ScalarType::UInt8,
            ScalarArray::Int16(_) => ScalarType::Int16,
            ScalarArray::UInt16(_) => ScalarType::UInt16,
            ScalarArray::Int32(_) => ScalarType::Int32,
            ScalarArray::UInt32(_) => ScalarType::UInt32,
            ScalarArray::Int64(_) => ScalarType::Int64,
            ScalarArray::UInt64(_) => ScalarType::UInt64,
            ScalarArray::Float32(_) => ScalarType::Float32,
            ScalarArray::Float64(_) => ScalarType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ScalarArray::Int8(v) => v.len(),
            ScalarArray::UInt8(v) => v.len(),
            ScalarArray::Int16(v) => v.len(),
            ScalarArray::UInt16(v) => v.len(),
            ScalarArray::Int32(v) => v.len(),
            ScalarArray::UInt32(v) => v.len(),
            ScalarArray::Int64(v) => v.len(),
            ScalarArray::UInt64(v) => v.len(),
            ScalarArray::Float32(v) => v.len(),
            ScalarArray::Float64(v) => v.len(),
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the first `dst.len()` elements into `dst`, converting each to a byte.
    ///
    /// Compressed payloads travel as byte arrays, so for `Int8`/`UInt8` this is a
    /// plain copy. Wider types are narrowed element by element, which is the
    /// pvData `toByteArray` convention.
    pub fn copy_to_bytes(&self, dst: &mut [u8]) -> Result<()> {
        let count = dst.len();
        if count > self.len() {
            return Err(CodecError::InvalidRecord(format!(
                "payload has {} elements, cannot copy {}",
                self.len(),
                count
            )));
        }
        match self {
            ScalarArray::UInt8(v) => dst.copy_from_slice(&v[..count]),
            ScalarArray::Int8(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::Int16(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::UInt16(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::Int32(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::UInt32(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::Int64(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::UInt64(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::Float32(v) => narrow(&v[..count], dst, |x| x as u8),
            ScalarArray::Float64(v) => narrow(&v[..count], dst, |x| x as u8),
        }
        Ok(())
    }

    /// Reinterpret `bytes` as elements of `element_type` in the given byte order.
    ///
    /// This is a byte-for-byte reinterpretation, not a numeric conversion.
    /// `bytes.len()` must be an exact multiple of the element size.
    pub fn from_bytes(bytes: &[u8], element_type: ScalarType, order: Endianness) -> Result<Self> {
        let size = element_type.element_size().ok_or_else(|| {
            CodecError::InvalidRecord(format!(
                "element type {} cannot hold numeric data",
                element_type
            ))
        })?;
        if bytes.len() % size != 0 {
            return Err(CodecError::InvalidRecord(format!(
                "{} bytes is not a whole number of {} elements",
                bytes.len(),
                element_type
            )));
        }
        let array = match order.resolve() {
            Endianness::Big => decode_with::<BigEndian>(bytes, element_type),
            Endianness::Little => decode_with::<LittleEndian>(bytes, element_type),
            Endianness::Native => decode_with::<NativeEndian>(bytes, element_type),
        };
        Ok(array)
    }

    /// Serialize the elements to bytes in the given byte order.
    pub fn to_bytes(&self, order: Endianness) -> Vec<u8> {
        match order.resolve() {
            Endianness::Big => encode_with::<BigEndian>(self),
            Endianness::Little => encode_with::<LittleEndian>(self),
            Endianness::Native => encode_with::<NativeEndian>(self),
        }
    }

    /// Borrow as `u8` samples.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            ScalarArray::UInt8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `u16` samples.
    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            ScalarArray::UInt16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as `f32` samples.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            ScalarArray::Float32(v) => Some(v),
            _ => None,
        }
    }
}

fn narrow<T: Copy>(src: &[T], dst: &mut [u8], f: impl Fn(T) -> u8) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = f(s);
    }
}

fn decode_with<B: ByteOrder>(bytes: &[u8], element_type: ScalarType) -> ScalarArray {
    match element_type {
        ScalarType::Int8 => ScalarArray::Int8(bytes.iter().map(|&b| b as i8).collect()),
        ScalarType::UInt8 | ScalarType::Boolean | ScalarType::String => {
            ScalarArray::UInt8(bytes.to_vec())
        }
        ScalarType::Int16 => {
            let mut out = vec![0i16; bytes.len() / 2];
            B::read_i16_into(bytes, &mut out);
            ScalarArray::Int16(out)
        }
        ScalarType::UInt16 => {
            let mut out = vec![0u16; bytes.len() / 2];
            B::read_u16_into(bytes, &mut out);
            ScalarArray::UInt16(out)
        }
        ScalarType::Int32 => {
            let mut out = vec![0i32; bytes.len() / 4];
            B::read_i32_into(bytes, &mut out);
            ScalarArray::Int32(out)
        }
        ScalarType::UInt32 => {
            let mut out = vec![0u32; bytes.len() / 4];
            B::read_u32_into(bytes, &mut out);
            ScalarArray::UInt32(out)
        }
        ScalarType::Int64 => {
            let mut out = vec![0i64; bytes.len() / 8];
            B::read_i64_into(bytes, &mut out);
            ScalarArray::Int64(out)
        }
        ScalarType::UInt64 => {
            let mut out = vec![0u64; bytes.len() / 8];
            B::read_u64_into(bytes, &mut out);
            ScalarArray::UInt64(out)
        }
        ScalarType::Float32 => {
            let mut out = vec![0f32; bytes.len() / 4];
            B::read_f32_into(bytes, &mut out);
            ScalarArray::Float32(out)
        }
        ScalarType::Float64 => {
            let mut out = vec![0f64; bytes.len() / 8];
            B::read_f64_into(bytes, &mut out);
            ScalarArray::Float64(out)
        }
    }
}

fn encode_with<B: ByteOrder>(array: &ScalarArray) -> Vec<u8> {
    let mut out = vec![0u8; array.len() * array.scalar_type().element_size().unwrap_or(1)];
    match array {
        ScalarArray::Int8(v) => {
            for (d, &s) in out.iter_mut().zip(v) {
                *d = s as u8;
            }
        }
        ScalarArray::UInt8(v) => out.copy_from_slice(v),
        ScalarArray::Int16(v) => B::write_i16_into(v, &mut out),
        ScalarArray::UInt16(v) => B::write_u16_into(v, &mut out),
        ScalarArray::Int32(v) => B::write_i32_into(v, &mut out),
        ScalarArray::UInt32(v) => B::write_u32_into(v, &mut out),
        ScalarArray::Int64(v) => B::write_i64_into(v, &mut out),
        ScalarArray::UInt64(v) => B::write_u64_into(v, &mut out),
        ScalarArray::Float32(v) => B::write_f32_into(v, &mut out),
        ScalarArray::Float64(v) => B::write_f64_into(v, &mut out),
    }
    out
}

impl From<Vec<u8>> for ScalarArray {
    fn from(v: Vec<u8>) -> Self {
        ScalarArray::UInt8(v)
    }
}

impl From<Vec<i8>> for ScalarArray {
    fn from(v: Vec<i8>) -> Self {
        ScalarArray::Int8(v)
    }
}

impl From<Vec<u16>> for ScalarArray {
    fn from(v: Vec<u16>) -> Self {
        ScalarArray::UInt16(v)
    }
}

impl From<Vec<i16>> for ScalarArray {
    fn from(v: Vec<i16>) -> Self {
        ScalarArray::Int16(v)
    }
}

impl From<Vec<u32>> for ScalarArray {
    fn from(v: Vec<u32>) -> Self {
        ScalarArray::UInt32(v)
    }
}

impl From<Vec<i32>> for ScalarArray {
    fn from(v: Vec<i32>) -> Self {
        ScalarArray::Int32(v)
    }
}

impl From<Vec<u64>> for ScalarArray {
    fn from(v: Vec<u64>) -> Self {
        ScalarArray::UInt64(v)
    }
}

impl From<Vec<i64>> for ScalarArray {
    fn from(v: Vec<i64>) -> Self {
        ScalarArray::Int64(v)
    }
}

impl From<Vec<f32>> for ScalarArray {
    fn from(v: Vec<f32>) -> Self {
        ScalarArray::Float32(v)
    }
}

impl From<Vec<f64>> for ScalarArray {
    fn from(v: Vec<f64>) -> Self {
        ScalarArray::Float64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_codes_follow_pvdata_ordinals() {
        for (code, ty) in ScalarType::ALL.iter().enumerate() {
            assert_eq!(ScalarType::from_code(code as i32), Some(*ty));
            assert_eq!(ty.code(), code as i32);
        }
        assert_eq!(ScalarType::from_code(12), None);
        assert_eq!(ScalarType::from_code(-1), None);
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(ScalarType::Int8.element_size(), Some(1));
        assert_eq!(ScalarType::UInt16.element_size(), Some(2));
        assert_eq!(ScalarType::Float32.element_size(), Some(4));
        assert_eq!(ScalarType::Float64.element_size(), Some(8));
        assert_eq!(ScalarType::UInt64.element_size(), Some(8));
        assert!(!ScalarType::String.is_numeric());
        assert!(!ScalarType::Boolean.is_numeric());
    }

    #[test]
    fn test_parse_pvdata_spellings() {
        assert_eq!("ushort".parse::<ScalarType>().unwrap(), ScalarType::UInt16);
        assert_eq!("Float32".parse::<ScalarType>().unwrap(), ScalarType::Float32);
        assert_eq!("double".parse::<ScalarType>().unwrap(), ScalarType::Float64);
        assert!("complex".parse::<ScalarType>().is_err());
    }

    #[test]
    fn test_reinterpret_little_endian_u16() {
        let bytes = [0x34, 0x12, 0x78, 0x56];
        let array = ScalarArray::from_bytes(&bytes, ScalarType::UInt16, Endianness::Little).unwrap();
        assert_eq!(array, ScalarArray::UInt16(vec![0x1234, 0x5678]));
    }

    #[test]
    fn test_reinterpret_big_endian_i32() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFE];
        let array = ScalarArray::from_bytes(&bytes, ScalarType::Int32, Endianness::Big).unwrap();
        assert_eq!(array, ScalarArray::Int32(vec![-2]));
    }

    #[test]
    fn test_reinterpret_is_not_numeric_conversion() {
        let bytes = 1.5f32.to_ne_bytes();
        let array = ScalarArray::from_bytes(&bytes, ScalarType::Float32, Endianness::Native).unwrap();
        assert_eq!(array.as_f32(), Some(&[1.5f32][..]));

        let as_int = ScalarArray::from_bytes(&bytes, ScalarType::UInt32, Endianness::Native).unwrap();
        assert_eq!(as_int, ScalarArray::UInt32(vec![1.5f32.to_bits()]));
    }

    #[test]
    fn test_reinterpret_rejects_partial_elements() {
        let err = ScalarArray::from_bytes(&[1, 2, 3], ScalarType::UInt16, Endianness::Native);
        assert!(matches!(err, Err(CodecError::InvalidRecord(_))));
    }

    #[test]
    fn test_to_bytes_inverts_from_bytes() {
        let array = ScalarArray::Float64(vec![0.25, -3.0, 1e10]);
        for order in [Endianness::Little, Endianness::Big, Endianness::Native] {
            let bytes = array.to_bytes(order);
            assert_eq!(bytes.len(), 24);
            let back = ScalarArray::from_bytes(&bytes, ScalarType::Float64, order).unwrap();
            assert_eq!(back, array);
        }
    }

    #[test]
    fn test_copy_to_bytes_narrows_elements() {
        let payload = ScalarArray::Int16(vec![1, 2, 0x1FF, -1]);
        let mut dst = [0u8; 4];
        payload.copy_to_bytes(&mut dst).unwrap();
        assert_eq!(dst, [1, 2, 0xFF, 0xFF]);

        let mut too_long = [0u8; 5];
        assert!(payload.copy_to_bytes(&mut too_long).is_err());
    }
}
