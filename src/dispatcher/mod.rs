//! Codec dispatcher.
//!
//! A [`CodecDispatcher`] turns a compressed [`NtndArray`] into a typed one in
//! place: validate the record, grow the transfer buffers, stage the payload,
//! call the codec's primitive and reinterpret the output bytes as elements of
//! the declared type.
//!
//! One dispatcher serves one stream. Its buffers are overwritten by every
//! call, so callers decoding several streams concurrently use one instance
//! per stream.

use std::time::Instant;

use serde::Serialize;

use crate::array::{ScalarArray, ScalarType};
use crate::buffer::TransferBuffers;
use crate::codec::{CodecKind, DecodeParams, Decompressor, PrimitiveSet};
use crate::config::DispatcherConfig;
use crate::error::{CodecError, Result};
use crate::ntnd::NtndArray;

/// Name reported for frames that carry no compression.
pub const NO_CODEC: &str = "none";

/// Outcome of one decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeSummary {
    /// Codec name, or `"none"` for uncompressed frames.
    pub codec: String,
    /// Element type of the decoded value, when known.
    pub element_type: Option<ScalarType>,
    /// Bytes delivered.
    pub compressed_size: usize,
    /// Bytes after decoding.
    pub uncompressed_size: usize,
    /// `uncompressed_size / compressed_size`.
    pub compression_ratio: f64,
    /// Time spent decoding in microseconds.
    pub decode_time_us: u64,
}

/// Decompresses NTNDArray records through a fixed set of primitives.
#[derive(Debug)]
pub struct CodecDispatcher {
    config: DispatcherConfig,
    buffers: TransferBuffers,
    primitives: PrimitiveSet,
    last_codec_name: String,
    compress_ratio: f64,
}

impl CodecDispatcher {
    /// Create a dispatcher with default settings and the bundled primitives.
    pub fn new() -> Self {
        Self::from_parts(DispatcherConfig::default(), PrimitiveSet::default())
    }

    /// Create a dispatcher with the given settings.
    pub fn with_config(config: DispatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, PrimitiveSet::default()))
    }

    fn from_parts(config: DispatcherConfig, primitives: PrimitiveSet) -> Self {
        Self {
            buffers: TransferBuffers::new(config.initial_buffer_size),
            config,
            primitives,
            last_codec_name: NO_CODEC.to_string(),
            compress_ratio: 1.0,
        }
    }

    /// Settings in effect.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Decompress `record` in place.
    ///
    /// On success `record.value` holds the typed array. On failure the record
    /// is left exactly as it was.
    pub fn decompress(&mut self, record: &mut NtndArray) -> Result<()> {
        self.decompress_with_summary(record).map(|_| ())
    }

    /// Decompress `record` in place and describe what was done.
    pub fn decompress_with_summary(&mut self, record: &mut NtndArray) -> Result<DecodeSummary> {
        let start = Instant::now();
        let name = record.codec.name.as_str();

        if name.is_empty() {
            self.last_codec_name = NO_CODEC.to_string();
            self.compress_ratio = 1.0;
            let size = record.uncompressed_size.max(0) as usize;
            return Ok(DecodeSummary {
                codec: NO_CODEC.to_string(),
                element_type: record.value.as_ref().map(|v| v.scalar_type()),
                compressed_size: size,
                uncompressed_size: size,
                compression_ratio: 1.0,
                decode_time_us: 0,
            });
        }

        let payload = match record.value.as_ref() {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(CodecError::MissingPayload(format!(
                    "{} frame has no value",
                    name
                )))
            }
        };

        let kind = CodecKind::from_name(name).ok_or_else(|| CodecError::UnknownCodec {
            name: name.to_string(),
            compressed_size: record.compressed_size,
            uncompressed_size: record.uncompressed_size,
        })?;

        let element_type = record.codec.element_type()?;
        if !kind.supports(element_type) {
            return Err(CodecError::UnsupportedTypeForCodec {
                codec: kind.name().to_string(),
                element_type,
            });
        }
        let element_size = element_type.element_size().ok_or_else(|| {
            CodecError::InvalidRecord(format!("{} has no fixed element size", element_type))
        })?;

        let (compressed, uncompressed) = frame_sizes(record, payload.len(), element_size)?;

        self.buffers.reserve(compressed, uncompressed);
        payload.copy_to_bytes(&mut self.buffers.staging[..compressed])?;
        self.buffers.load_input(compressed);

        let params = DecodeParams {
            element_type,
            element_size,
            block_size: match kind {
                CodecKind::Bslz4 => self.config.bslz4_block_size,
                _ => 0,
            },
        };
        let produced = self.primitives.get(kind).decompress(
            self.buffers.input.slice(compressed),
            self.buffers.output.slice_mut(uncompressed),
            &params,
        )?;

        if produced != uncompressed {
            if kind.checks_output_size() {
                return Err(CodecError::DecompressSizeMismatch {
                    codec: kind.name().to_string(),
                    expected: uncompressed,
                    actual: produced,
                });
            }
            log::warn!(
                "{} produced {} bytes for uncompressedSize={}",
                kind,
                produced,
                uncompressed
            );
            // Bytes past the reported count still hold the previous frame.
            if produced < uncompressed {
                self.buffers.output.slice_mut(uncompressed)[produced..].fill(0);
            }
        }

        let value = ScalarArray::from_bytes(
            self.buffers.output.slice(uncompressed),
            element_type,
            self.config.byte_order,
        )?;
        record.value = Some(value);

        let ratio = uncompressed as f64 / compressed as f64;
        self.last_codec_name = kind.name().to_string();
        self.compress_ratio = ratio;

        let elapsed = start.elapsed();
        log::debug!(
            "{} decoded {} -> {} bytes of {} (ratio {:.2}:1) in {:?}",
            kind,
            compressed,
            uncompressed,
            element_type,
            ratio,
            elapsed
        );

        Ok(DecodeSummary {
            codec: kind.name().to_string(),
            element_type: Some(element_type),
            compressed_size: compressed,
            uncompressed_size: uncompressed,
            compression_ratio: ratio,
            decode_time_us: elapsed.as_micros() as u64,
        })
    }

    /// Codec of the last successful decode (`"none"` for uncompressed frames).
    pub fn last_codec_name(&self) -> &str {
        &self.last_codec_name
    }

    /// Compression ratio of the last successful decode (1.0 when uncompressed).
    pub fn compress_ratio(&self) -> f64 {
        self.compress_ratio
    }

    /// Input buffer capacity in bytes.
    pub fn input_capacity(&self) -> usize {
        self.buffers.input.capacity()
    }

    /// Output buffer capacity in bytes.
    pub fn output_capacity(&self) -> usize {
        self.buffers.output.capacity()
    }

    /// Staging array length in bytes.
    pub fn staging_len(&self) -> usize {
        self.buffers.staging.len()
    }
}

impl Default for CodecDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the declared sizes against the payload and element size.
fn frame_sizes(record: &NtndArray, payload_len: usize, element_size: usize) -> Result<(usize, usize)> {
    let compressed = usize::try_from(record.compressed_size).map_err(|_| {
        CodecError::InvalidRecord(format!("compressedSize={} is negative", record.compressed_size))
    })?;
    let uncompressed = usize::try_from(record.uncompressed_size).map_err(|_| {
        CodecError::InvalidRecord(format!(
            "uncompressedSize={} is negative",
            record.uncompressed_size
        ))
    })?;

    if compressed == 0 {
        return Err(CodecError::MissingPayload(format!(
            "{} frame declares compressedSize=0",
            record.codec.name
        )));
    }
    if compressed > payload_len {
        return Err(CodecError::InvalidRecord(format!(
            "compressedSize={} exceeds the {} delivered elements",
            compressed, payload_len
        )));
    }
    if uncompressed == 0 || uncompressed % element_size != 0 {
        return Err(CodecError::InvalidRecord(format!(
            "uncompressedSize={} is not a positive multiple of the {}-byte element size",
            uncompressed, element_size
        )));
    }
    Ok((compressed, uncompressed))
}

/// Builder for dispatchers with custom settings or primitives.
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    primitives: PrimitiveSet,
}

impl DispatcherBuilder {
    /// Start from default settings and the bundled primitives.
    pub fn new() -> Self {
        Self {
            config: DispatcherConfig::default(),
            primitives: PrimitiveSet::default(),
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial transfer buffer size.
    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.config.initial_buffer_size = size;
        self
    }

    /// Replace the primitive for one codec.
    pub fn primitive(mut self, kind: CodecKind, primitive: Box<dyn Decompressor>) -> Self {
        self.primitives = self.primitives.with(kind, primitive);
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Result<CodecDispatcher> {
        self.config.validate()?;
        Ok(CodecDispatcher::from_parts(self.config, self.primitives))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, CodecInfo, EncodeParams, Lz4Primitive};
    use crate::config::Endianness;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const MIB: usize = 1024 * 1024;

    /// Counts calls and fills the destination with zeros.
    struct Counting(Arc<AtomicUsize>);

    impl Decompressor for Counting {
        fn info(&self) -> CodecInfo {
            CodecInfo {
                name: "counting",
                library: "test",
                reports_size: true,
            }
        }

        fn decompress(&self, _src: &[u8], dst: &mut [u8], _params: &DecodeParams) -> Result<usize> {
            self.0.fetch_add(1, Ordering::SeqCst);
            dst.fill(0);
            Ok(dst.len())
        }
    }

    /// Reports half the destination as written.
    struct ShortCount;

    impl Decompressor for ShortCount {
        fn info(&self) -> CodecInfo {
            CodecInfo {
                name: "blosc",
                library: "test",
                reports_size: true,
            }
        }

        fn decompress(&self, _src: &[u8], dst: &mut [u8], _params: &DecodeParams) -> Result<usize> {
            Ok(dst.len() / 2)
        }
    }

    fn sample(ty: ScalarType, n: usize) -> ScalarArray {
        match ty {
            ScalarType::Int8 => (0..n).map(|i| ((i % 200) as i16 - 100) as i8).collect::<Vec<_>>().into(),
            ScalarType::UInt8 => (0..n).map(|i| (i * 3 % 256) as u8).collect::<Vec<_>>().into(),
            ScalarType::Int16 => (0..n).map(|i| (i as i16).wrapping_mul(-7)).collect::<Vec<_>>().into(),
            ScalarType::UInt16 => (0..n).map(|i| (i % 4096) as u16).collect::<Vec<_>>().into(),
            ScalarType::Int32 => (0..n).map(|i| i as i32 * -1000).collect::<Vec<_>>().into(),
            ScalarType::UInt32 => (0..n).map(|i| (i as u32) << 8).collect::<Vec<_>>().into(),
            ScalarType::Int64 => (0..n).map(|i| i as i64 - 1_000_000).collect::<Vec<_>>().into(),
            ScalarType::UInt64 => (0..n).map(|i| (i as u64) << 33).collect::<Vec<_>>().into(),
            ScalarType::Float32 => (0..n).map(|i| i as f32 * 0.25).collect::<Vec<_>>().into(),
            ScalarType::Float64 => (0..n).map(|i| (i as f64).sqrt()).collect::<Vec<_>>().into(),
            ScalarType::Boolean | ScalarType::String => unreachable!("not numeric"),
        }
    }

    fn compressed_record(kind: CodecKind, dims: &[usize], value: &ScalarArray, order: Endianness) -> NtndArray {
        let raw = value.to_bytes(order);
        let params = EncodeParams::new(value.scalar_type());
        let encoded = encode(kind, &raw, &params).unwrap();
        NtndArray::compressed(dims, kind.name(), value.scalar_type(), encoded, raw.len())
    }

    fn fake_record(codec: &str, ty: ScalarType, compressed: usize, uncompressed: usize) -> NtndArray {
        NtndArray::compressed(&[uncompressed], codec, ty, vec![7u8; compressed], uncompressed)
    }

    #[test]
    fn test_lz4_uint16_constant_frame() {
        let value: ScalarArray = vec![0x1234u16; 64 * 64].into();
        let mut record = compressed_record(CodecKind::Lz4, &[64, 64], &value, Endianness::Native);
        assert_eq!(record.uncompressed_size, 8192);
        record.check_uncompressed_size().unwrap();

        let mut dispatcher = CodecDispatcher::new();
        dispatcher.decompress(&mut record).unwrap();

        let decoded = record.value.as_ref().unwrap().as_u16().unwrap();
        assert_eq!(decoded.len(), 4096);
        assert!(decoded.iter().all(|&v| v == 0x1234));
        assert_eq!(dispatcher.last_codec_name(), "lz4");
        assert!(dispatcher.compress_ratio() > 1.0);
    }

    #[test]
    fn test_lossless_codecs_round_trip_every_numeric_type() {
        let mut dispatcher = CodecDispatcher::new();
        for kind in [CodecKind::Blosc, CodecKind::Lz4, CodecKind::Bslz4] {
            for ty in ScalarType::ALL.into_iter().filter(|t| t.is_numeric()) {
                let value = sample(ty, 1000);
                let mut record = compressed_record(kind, &[40, 25], &value, Endianness::Native);
                record.check_uncompressed_size().unwrap();
                dispatcher
                    .decompress(&mut record)
                    .unwrap_or_else(|e| panic!("{} {}: {}", kind, ty, e));
                assert_eq!(record.value.as_ref(), Some(&value), "{} {}", kind, ty);
            }
        }
    }

    #[test]
    fn test_jpeg_uint8_round_trip_within_tolerance() {
        let original: Vec<u8> = (0..32 * 16).map(|i| (i % 32 * 4) as u8).collect();
        let shape = crate::ntnd::ImageShape {
            nx: 32,
            ny: 16,
            nz: 1,
            layout: crate::ntnd::ColorLayout::Mono,
        };
        let params = EncodeParams::new(ScalarType::UInt8).with_shape(shape);
        let encoded = encode(CodecKind::Jpeg, &original, &params).unwrap();
        let mut record = NtndArray::compressed(&[32, 16], "jpeg", ScalarType::UInt8, encoded, original.len());

        CodecDispatcher::new().decompress(&mut record).unwrap();
        let decoded = record.value.as_ref().unwrap().as_u8().unwrap();
        assert_eq!(decoded.len(), original.len());
        for (a, b) in original.iter().zip(decoded) {
            assert!((*a as i16 - *b as i16).abs() <= 12);
        }
    }

    #[test]
    fn test_big_endian_byte_order() {
        let config = DispatcherConfig {
            byte_order: Endianness::Big,
            ..Default::default()
        };
        let value = sample(ScalarType::Int32, 256);
        let mut record = compressed_record(CodecKind::Lz4, &[256], &value, Endianness::Big);
        CodecDispatcher::with_config(config)
            .unwrap()
            .decompress(&mut record)
            .unwrap();
        assert_eq!(record.value, Some(value));
    }

    #[test]
    fn test_no_codec_is_a_no_op() {
        let value = sample(ScalarType::UInt16, 16);
        let mut record = NtndArray::uncompressed(&[4, 4], value.clone());
        let before = record.clone();
        let mut dispatcher = DispatcherBuilder::new().initial_buffer_size(64).build().unwrap();

        let summary = dispatcher.decompress_with_summary(&mut record).unwrap();
        assert_eq!(record, before);
        assert_eq!(summary.codec, "none");
        assert_eq!(dispatcher.last_codec_name(), "none");
        assert_eq!(dispatcher.compress_ratio(), 1.0);
        assert_eq!(dispatcher.input_capacity(), 64);
        assert_eq!(dispatcher.output_capacity(), 64);
        assert_eq!(dispatcher.staging_len(), 64);
    }

    #[test]
    fn test_missing_payload_for_any_codec() {
        let mut dispatcher = CodecDispatcher::new();
        for codec in ["lz4", "jpeg", "unknown_codec_xyz"] {
            let mut absent = fake_record(codec, ScalarType::UInt8, 4, 4);
            absent.value = None;
            assert!(matches!(
                dispatcher.decompress(&mut absent),
                Err(CodecError::MissingPayload(_))
            ));

            let mut empty = fake_record(codec, ScalarType::UInt8, 4, 4);
            empty.value = Some(ScalarArray::UInt8(Vec::new()));
            assert!(matches!(
                dispatcher.decompress(&mut empty),
                Err(CodecError::MissingPayload(_))
            ));
        }
    }

    #[test]
    fn test_unknown_codec_reports_name_and_sizes() {
        let mut record = fake_record("unknown_codec_xyz", ScalarType::UInt8, 321, 4096);
        let before = record.clone();
        let err = CodecDispatcher::new().decompress(&mut record).unwrap_err();

        assert!(matches!(err, CodecError::UnknownCodec { .. }));
        let msg = err.to_string();
        assert!(msg.contains("unknown_codec_xyz"));
        assert!(msg.contains("321"));
        assert!(msg.contains("4096"));
        assert_eq!(record, before);
    }

    #[test]
    fn test_jpeg_float32_rejected_before_primitive_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = DispatcherBuilder::new()
            .primitive(CodecKind::Jpeg, Box::new(Counting(calls.clone())))
            .build()
            .unwrap();
        let mut record = fake_record("jpeg", ScalarType::Float32, 100, 400);

        let err = dispatcher.decompress(&mut record).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedTypeForCodec {
                element_type: ScalarType::Float32,
                ..
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_string_elements_rejected_by_every_codec() {
        let mut dispatcher = CodecDispatcher::new();
        for kind in CodecKind::ALL {
            let mut record = fake_record(kind.name(), ScalarType::String, 8, 8);
            assert!(matches!(
                dispatcher.decompress(&mut record),
                Err(CodecError::UnsupportedTypeForCodec { .. })
            ));
        }
    }

    #[test]
    fn test_blosc_short_count_is_size_mismatch() {
        let mut dispatcher = DispatcherBuilder::new()
            .primitive(CodecKind::Blosc, Box::new(ShortCount))
            .build()
            .unwrap();
        let mut record = fake_record("blosc", ScalarType::UInt16, 64, 1024);
        let before = record.clone();

        let err = dispatcher.decompress(&mut record).unwrap_err();
        match err {
            CodecError::DecompressSizeMismatch { expected, actual, .. } => {
                assert_eq!(expected, 1024);
                assert_eq!(actual, 512);
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(record, before);
        assert_eq!(dispatcher.last_codec_name(), "none");
    }

    #[test]
    fn test_blosc_frame_size_disagreeing_with_record() {
        let raw: Vec<u8> = (0..100).collect();
        let frame = encode(CodecKind::Blosc, &raw, &EncodeParams::new(ScalarType::UInt8)).unwrap();
        let mut record = NtndArray::compressed(&[120], "blosc", ScalarType::UInt8, frame, 120);
        let err = CodecDispatcher::new().decompress(&mut record).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DecompressSizeMismatch {
                expected: 120,
                actual: 100,
                ..
            }
        ));
    }

    #[test]
    fn test_trusted_codec_short_count_zero_fills_tail() {
        let mut dispatcher = DispatcherBuilder::new()
            .primitive(CodecKind::Lz4, Box::new(ShortCount))
            .build()
            .unwrap();
        let mut record = fake_record("lz4", ScalarType::UInt8, 16, 64);
        dispatcher.decompress(&mut record).unwrap();
        let decoded = record.value.as_ref().unwrap().as_u8().unwrap();
        assert_eq!(decoded.len(), 64);
        assert!(decoded[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_lz4_frame_does_not_leak_previous_frame() {
        let mut dispatcher = CodecDispatcher::new();

        let full = vec![0xAAu8; 64];
        let mut first = NtndArray::compressed(&[64], "lz4", ScalarType::UInt8, Lz4Primitive::compress(&full), 64);
        dispatcher.decompress(&mut first).unwrap();
        assert_eq!(first.value, Some(ScalarArray::UInt8(full)));

        let half = vec![0x11u8; 32];
        let mut second = NtndArray::compressed(&[64], "lz4", ScalarType::UInt8, Lz4Primitive::compress(&half), 64);
        dispatcher.decompress(&mut second).unwrap();
        let decoded = second.value.as_ref().unwrap().as_u8().unwrap();
        assert_eq!(&decoded[..32], &half[..]);
        assert!(decoded[32..].iter().all(|&b| b == 0), "tail {:02x?}", &decoded[32..]);
    }

    #[test]
    fn test_bslz4_partial_element_size_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = DispatcherBuilder::new()
            .primitive(CodecKind::Bslz4, Box::new(Counting(calls.clone())))
            .build()
            .unwrap();
        let mut record = fake_record("bslz4", ScalarType::UInt16, 100, 8191);

        let err = dispatcher.decompress(&mut record).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRecord(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_size_validation() {
        let mut dispatcher = CodecDispatcher::new();

        let mut negative = fake_record("lz4", ScalarType::UInt8, 10, 10);
        negative.uncompressed_size = -1;
        assert!(matches!(
            dispatcher.decompress(&mut negative),
            Err(CodecError::InvalidRecord(_))
        ));

        let mut oversized = fake_record("lz4", ScalarType::UInt8, 10, 10);
        oversized.compressed_size = 11;
        assert!(matches!(
            dispatcher.decompress(&mut oversized),
            Err(CodecError::InvalidRecord(_))
        ));

        let mut no_type = fake_record("lz4", ScalarType::UInt8, 10, 10);
        no_type.codec.parameters = None;
        assert!(matches!(
            dispatcher.decompress(&mut no_type),
            Err(CodecError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_primitive_failure_leaves_record_untouched() {
        let mut record = fake_record("lz4", ScalarType::UInt8, 4, 4096);
        record.value = Some(ScalarArray::UInt8(vec![0xF0, 0xFF, 0xFF, 0xFF]));
        let before = record.clone();
        let err = CodecDispatcher::new().decompress(&mut record).unwrap_err();
        assert!(matches!(err, CodecError::PrimitiveFailure { .. }));
        assert_eq!(record, before);
    }

    #[test]
    fn test_buffer_watermark_is_monotonic() {
        let mut dispatcher = CodecDispatcher::new();
        assert_eq!(dispatcher.output_capacity(), 10 * MIB);

        let mut seen = Vec::new();
        for size in [10 * MIB, 2 * MIB, 50 * MIB, MIB] {
            let raw = vec![0u8; size];
            let encoded = Lz4Primitive::compress(&raw);
            let mut record = NtndArray::compressed(&[size], "lz4", ScalarType::UInt8, encoded, size);
            dispatcher.decompress(&mut record).unwrap();
            seen.push(dispatcher.output_capacity());
        }

        assert_eq!(seen, vec![10 * MIB, 10 * MIB, 50 * MIB, 50 * MIB]);
        assert_eq!(dispatcher.input_capacity(), 10 * MIB);
    }

    #[test]
    fn test_summary_reports_ratio() {
        let value: ScalarArray = vec![0u16; 2048].into();
        let mut record = compressed_record(CodecKind::Bslz4, &[2048], &value, Endianness::Native);
        let compressed = record.compressed_size as usize;

        let summary = CodecDispatcher::new()
            .decompress_with_summary(&mut record)
            .unwrap();
        assert_eq!(summary.codec, "bslz4");
        assert_eq!(summary.element_type, Some(ScalarType::UInt16));
        assert_eq!(summary.compressed_size, compressed);
        assert_eq!(summary.uncompressed_size, 4096);
        assert!((summary.compression_ratio - 4096.0 / compressed as f64).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DispatcherConfig {
            initial_buffer_size: 0,
            ..Default::default()
        };
        assert!(CodecDispatcher::with_config(config).is_err());
    }
}
