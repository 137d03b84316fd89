//! Blosc (c-blosc 1.x frame) primitive.
//!
//! A frame is a 16-byte header followed either by the raw data (memcpy
//! flag) or by a table of block offsets and the compressed blocks. Each
//! block is stored as one stream, or as `typesize` streams when the block
//! was split, and each stream is prefixed by its compressed length. A stream
//! whose length equals its decoded length is stored uncompressed.

use std::io::Read;

use serde::Serialize;

use crate::error::{CodecError, Result};

use super::bitshuffle::{bitshuffle_partial, bitunshuffle_partial, byte_shuffle, byte_unshuffle};
use super::traits::{CodecInfo, DecodeParams, Decompressor};

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 16;

const FORMAT_VERSION: u8 = 2;
const FLAG_SHUFFLE: u8 = 0x01;
const FLAG_MEMCPYED: u8 = 0x02;
const FLAG_BITSHUFFLE: u8 = 0x04;
const FLAG_DELTA: u8 = 0x08;
const FLAG_NOSPLIT: u8 = 0x10;

/// Inner compressor recorded in the top three flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BloscCompressor {
    /// BloscLZ (format 0).
    BloscLz,
    /// LZ4 and LZ4HC (format 1).
    Lz4,
    /// Snappy (format 2).
    Snappy,
    /// zlib (format 3).
    Zlib,
    /// Zstandard (format 4).
    Zstd,
    /// Any other format code.
    Unknown(u8),
}

impl BloscCompressor {
    fn from_format(code: u8) -> Self {
        match code {
            0 => BloscCompressor::BloscLz,
            1 => BloscCompressor::Lz4,
            2 => BloscCompressor::Snappy,
            3 => BloscCompressor::Zlib,
            4 => BloscCompressor::Zstd,
            other => BloscCompressor::Unknown(other),
        }
    }

    fn format(&self) -> u8 {
        match self {
            BloscCompressor::BloscLz => 0,
            BloscCompressor::Lz4 => 1,
            BloscCompressor::Snappy => 2,
            BloscCompressor::Zlib => 3,
            BloscCompressor::Zstd => 4,
            BloscCompressor::Unknown(code) => *code,
        }
    }

    /// Decode one stream into `dst`, returning the bytes produced.
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        match self {
            BloscCompressor::Lz4 => lz4_flex::block::decompress_into(src, dst)
                .map_err(|e| CodecError::primitive("blosc", e)),
            BloscCompressor::Zlib => {
                let mut decoded = Vec::with_capacity(dst.len());
                // One byte past the block is enough to detect an oversized stream.
                flate2::read::ZlibDecoder::new(src)
                    .take(dst.len() as u64 + 1)
                    .read_to_end(&mut decoded)
                    .map_err(|e| CodecError::primitive("blosc", e))?;
                if decoded.len() > dst.len() {
                    return Err(CodecError::primitive(
                        "blosc",
                        format!("zlib stream expands past the {}-byte block", dst.len()),
                    ));
                }
                dst[..decoded.len()].copy_from_slice(&decoded);
                Ok(decoded.len())
            }
            BloscCompressor::Zstd => zstd::bulk::decompress_to_buffer(src, dst)
                .map_err(|e| CodecError::primitive("blosc", e)),
            other => Err(CodecError::primitive(
                "blosc",
                format!("inner compressor {:?} is not available", other),
            )),
        }
    }

    /// Encode one stream.
    fn encode(&self, src: &[u8]) -> Result<Vec<u8>> {
        match self {
            BloscCompressor::Lz4 => Ok(lz4_flex::block::compress(src)),
            BloscCompressor::Zlib => {
                use std::io::Write;
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(src)?;
                Ok(encoder.finish()?)
            }
            BloscCompressor::Zstd => zstd::bulk::compress(src, 3).map_err(CodecError::Io),
            other => Err(CodecError::primitive(
                "blosc",
                format!("inner compressor {:?} is not available", other),
            )),
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloscHeader {
    /// Frame format version.
    pub version: u8,
    /// Inner compressor format version.
    pub versionlz: u8,
    /// Raw flag byte.
    pub flags: u8,
    /// Element size used by the shuffle filters.
    pub typesize: u8,
    /// Uncompressed size of the frame.
    pub nbytes: u32,
    /// Uncompressed size of each block (the last may be shorter).
    pub blocksize: u32,
    /// Total compressed size including this header.
    pub cbytes: u32,
}

impl BloscHeader {
    /// Parse the 16-byte header at the start of `src`.
    pub fn parse(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(CodecError::primitive(
                "blosc",
                format!("{} bytes is shorter than a frame header", src.len()),
            ));
        }
        let word = |at: usize| u32::from_le_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]]);
        Ok(Self {
            version: src[0],
            versionlz: src[1],
            flags: src[2],
            typesize: src[3],
            nbytes: word(4),
            blocksize: word(8),
            cbytes: word(12),
        })
    }

    fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.version;
        buf[1] = self.versionlz;
        buf[2] = self.flags;
        buf[3] = self.typesize;
        buf[4..8].copy_from_slice(&self.nbytes.to_le_bytes());
        buf[8..12].copy_from_slice(&self.blocksize.to_le_bytes());
        buf[12..16].copy_from_slice(&self.cbytes.to_le_bytes());
        buf
    }

    /// Inner compressor.
    pub fn compressor(&self) -> BloscCompressor {
        BloscCompressor::from_format(self.flags >> 5)
    }

    /// Whether the payload is stored uncompressed after the header.
    pub fn is_memcpyed(&self) -> bool {
        self.flags & FLAG_MEMCPYED != 0
    }

    /// Shuffle filter applied before compression.
    pub fn shuffle(&self) -> Shuffle {
        if self.flags & FLAG_SHUFFLE != 0 {
            Shuffle::Byte
        } else if self.flags & FLAG_BITSHUFFLE != 0 {
            Shuffle::Bit
        } else {
            Shuffle::None
        }
    }

    /// Whether the delta filter was applied.
    pub fn has_delta(&self) -> bool {
        self.flags & FLAG_DELTA != 0
    }

    /// Whether full blocks were split into `typesize` streams.
    pub fn is_split(&self) -> bool {
        self.flags & FLAG_NOSPLIT == 0
    }

    /// Number of blocks in the frame.
    pub fn nblocks(&self) -> usize {
        if self.blocksize == 0 {
            return 0;
        }
        (self.nbytes as usize).div_ceil(self.blocksize as usize)
    }
}

/// Shuffle filter of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shuffle {
    /// No filter.
    None,
    /// Byte shuffle.
    Byte,
    /// Bit shuffle.
    Bit,
}

/// Options for [`BloscPrimitive::compress`].
#[derive(Debug, Clone, Copy)]
pub struct BloscOptions {
    /// Inner compressor.
    pub compressor: BloscCompressor,
    /// Shuffle filter.
    pub shuffle: Shuffle,
    /// Bytes per block.
    pub blocksize: usize,
    /// Split full blocks into one stream per byte of the element.
    pub split: bool,
}

impl Default for BloscOptions {
    fn default() -> Self {
        Self {
            compressor: BloscCompressor::Lz4,
            shuffle: Shuffle::Byte,
            blocksize: 64 * 1024,
            split: false,
        }
    }
}

/// Blosc frame decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct BloscPrimitive;

impl BloscPrimitive {
    /// Build a frame from `raw` with elements of `typesize` bytes.
    pub fn compress(raw: &[u8], typesize: usize, options: &BloscOptions) -> Result<Vec<u8>> {
        let typesize_byte = u8::try_from(typesize)
            .ok()
            .filter(|&t| t > 0)
            .ok_or_else(|| CodecError::primitive("blosc", format!("typesize {} out of range", typesize)))?;
        let nbytes = u32::try_from(raw.len())
            .map_err(|_| CodecError::primitive("blosc", "frame larger than 4 GiB"))?;
        let blocksize = options.blocksize.clamp(1, raw.len().max(1));
        let split = options.split && blocksize % typesize == 0;

        let mut flags = options.compressor.format() << 5;
        match options.shuffle {
            Shuffle::Byte => flags |= FLAG_SHUFFLE,
            Shuffle::Bit => flags |= FLAG_BITSHUFFLE,
            Shuffle::None => {}
        }
        if !split {
            flags |= FLAG_NOSPLIT;
        }
        let mut header = BloscHeader {
            version: FORMAT_VERSION,
            versionlz: 1,
            flags,
            typesize: typesize_byte,
            nbytes,
            blocksize: blocksize as u32,
            cbytes: 0,
        };

        let nblocks = header.nblocks();
        let table_end = HEADER_SIZE + 4 * nblocks;
        let mut out = vec![0u8; table_end];
        let mut filtered = vec![0u8; blocksize];

        for (b, block) in raw.chunks(blocksize).enumerate() {
            let start = out.len() as u32;
            out[HEADER_SIZE + 4 * b..HEADER_SIZE + 4 * b + 4].copy_from_slice(&start.to_le_bytes());

            let tmp = &mut filtered[..block.len()];
            match options.shuffle {
                Shuffle::Byte => byte_shuffle(block, tmp, typesize),
                Shuffle::Bit if bit_shuffled(FORMAT_VERSION, block.len(), typesize) => {
                    bitshuffle_partial(block, tmp, typesize)
                }
                Shuffle::Bit | Shuffle::None => tmp.copy_from_slice(block),
            }

            let leftover = block.len() < blocksize;
            let nsplits = if split && !leftover { typesize } else { 1 };
            let neblock = block.len() / nsplits;
            for stream in tmp.chunks(neblock) {
                let compressed = options.compressor.encode(stream)?;
                if compressed.len() >= stream.len() {
                    out.extend_from_slice(&(stream.len() as i32).to_le_bytes());
                    out.extend_from_slice(stream);
                } else {
                    out.extend_from_slice(&(compressed.len() as i32).to_le_bytes());
                    out.extend_from_slice(&compressed);
                }
            }
        }

        if out.len() >= raw.len() + HEADER_SIZE {
            header.flags |= FLAG_MEMCPYED;
            out = Vec::with_capacity(raw.len() + HEADER_SIZE);
            out.extend_from_slice(&[0u8; HEADER_SIZE]);
            out.extend_from_slice(raw);
        }
        header.cbytes = out.len() as u32;
        out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        Ok(out)
    }

    fn decode_block(
        header: &BloscHeader,
        src: &[u8],
        start: usize,
        dst: &mut [u8],
        scratch: &mut [u8],
        leftover: bool,
    ) -> Result<()> {
        let typesize = (header.typesize as usize).max(1);
        let bsize = dst.len();
        let shuffle = header.shuffle();
        let filtered = shuffle == Shuffle::Bit || (shuffle == Shuffle::Byte && typesize > 1);
        let nsplits = if header.is_split() && !leftover { typesize } else { 1 };
        let neblock = bsize / nsplits;
        let compressor = header.compressor();

        let target: &mut [u8] = if filtered { &mut scratch[..bsize] } else { &mut *dst };
        let mut pos = start;
        for s in 0..nsplits {
            let len_bytes = src
                .get(pos..pos + 4)
                .ok_or_else(|| CodecError::primitive("blosc", "truncated stream length"))?;
            let csize = i32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
            pos += 4;
            let csize = usize::try_from(csize)
                .map_err(|_| CodecError::primitive("blosc", format!("negative stream length {}", csize)))?;
            let stream = src
                .get(pos..pos + csize)
                .ok_or_else(|| CodecError::primitive("blosc", "stream runs past end of frame"))?;
            pos += csize;

            let out = &mut target[s * neblock..(s + 1) * neblock];
            if csize == neblock {
                out.copy_from_slice(stream);
            } else {
                let written = compressor.decode(stream, out)?;
                if written != neblock {
                    return Err(CodecError::primitive(
                        "blosc",
                        format!("stream decoded {} of {} bytes", written, neblock),
                    ));
                }
            }
        }

        if filtered {
            match shuffle {
                Shuffle::Byte => byte_unshuffle(&scratch[..bsize], dst, typesize),
                Shuffle::Bit if bit_shuffled(header.version, bsize, typesize) => {
                    bitunshuffle_partial(&scratch[..bsize], dst, typesize)
                }
                Shuffle::Bit | Shuffle::None => dst.copy_from_slice(&scratch[..bsize]),
            }
        }
        Ok(())
    }
}

/// Whether a bit-shuffled block of `bsize` bytes was actually transposed.
///
/// Format version 2 leaves blocks whose element count is not a multiple of 8
/// untouched; later versions transpose the multiple-of-8 prefix and copy the
/// remaining elements.
fn bit_shuffled(version: u8, bsize: usize, typesize: usize) -> bool {
    version > 2 || (bsize / typesize) % 8 == 0
}

impl Decompressor for BloscPrimitive {
    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "blosc",
            library: "c-blosc frame / lz4_flex, flate2, zstd",
            reports_size: true,
        }
    }

    fn decompress(&self, src: &[u8], dst: &mut [u8], _params: &DecodeParams) -> Result<usize> {
        let header = BloscHeader::parse(src)?;
        let nbytes = header.nbytes as usize;
        if header.cbytes as usize > src.len() {
            return Err(CodecError::primitive(
                "blosc",
                format!("frame declares {} bytes, only {} available", header.cbytes, src.len()),
            ));
        }
        if nbytes > dst.len() {
            return Err(CodecError::primitive(
                "blosc",
                format!("frame holds {} bytes, destination has room for {}", nbytes, dst.len()),
            ));
        }
        if nbytes == 0 {
            return Ok(0);
        }

        if header.is_memcpyed() {
            let body = src
                .get(HEADER_SIZE..HEADER_SIZE + nbytes)
                .ok_or_else(|| CodecError::primitive("blosc", "memcpyed frame is truncated"))?;
            dst[..nbytes].copy_from_slice(body);
            return Ok(nbytes);
        }
        if header.has_delta() {
            return Err(CodecError::primitive("blosc", "delta filter is not supported"));
        }

        let blocksize = header.blocksize as usize;
        if blocksize == 0 {
            return Err(CodecError::primitive("blosc", "blocksize is zero"));
        }
        let nblocks = header.nblocks();
        let table = src
            .get(HEADER_SIZE..HEADER_SIZE + 4 * nblocks)
            .ok_or_else(|| CodecError::primitive("blosc", "truncated block table"))?;
        let mut scratch = vec![0u8; blocksize];

        for (b, entry) in table.chunks_exact(4).enumerate() {
            let start = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]) as usize;
            let offset = b * blocksize;
            let bsize = blocksize.min(nbytes - offset);
            let leftover = bsize < blocksize;
            Self::decode_block(
                &header,
                src,
                start,
                &mut dst[offset..offset + bsize],
                &mut scratch,
                leftover,
            )?;
        }

        Ok(nbytes)
    }
}
