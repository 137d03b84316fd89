//! Command-line interface for decoding and producing NTNDArray codec frames.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use crate::array::{ScalarArray, ScalarType};
use crate::codec::{self, BloscCompressor, BloscHeader, CodecKind, EncodeParams, Shuffle, DEFAULT_QUALITY};
use crate::config::DispatcherConfig;
use crate::dispatcher::{CodecDispatcher, DecodeSummary};
use crate::ntnd::NtndArray;

/// NTNDArray codec tool
///
/// Decodes compressed areaDetector frames (blosc, jpeg, lz4, bslz4) into
/// raw typed arrays, and produces compressed frames from raw arrays.
#[derive(Parser, Debug)]
#[command(name = "ntnda-codec")]
#[command(version)]
#[command(about = "Decode and encode compressed areaDetector NTNDArray frames")]
#[command(long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Dispatcher configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a compressed frame into raw typed elements
    Decode {
        /// Compressed frame file
        input: PathBuf,

        /// Output file for the decoded elements
        output: PathBuf,

        /// Codec name as carried by the NTNDArray
        #[arg(long)]
        codec: String,

        /// Element type (uint8, int16, float32, ...)
        #[arg(short, long)]
        element_type: String,

        /// Decoded size in bytes (defaults to product of --dims times element size)
        #[arg(short, long)]
        uncompressed_size: Option<usize>,

        /// Array dimensions, comma separated
        #[arg(short, long, value_delimiter = ',')]
        dims: Vec<usize>,
    },

    /// Compress a raw array into a frame
    Encode {
        /// Raw element file
        input: PathBuf,

        /// Output file for the compressed frame
        output: PathBuf,

        /// Codec to produce
        #[arg(long, value_enum)]
        codec: CodecArg,

        /// Element type of the input
        #[arg(short, long)]
        element_type: String,

        /// Array dimensions, comma separated (required for jpeg)
        #[arg(short, long, value_delimiter = ',')]
        dims: Vec<usize>,

        /// JPEG quality (1-100)
        #[arg(long, default_value_t = DEFAULT_QUALITY)]
        quality: u8,

        /// Shuffle filter for blosc
        #[arg(long, value_enum, default_value = "byte")]
        shuffle: ShuffleArg,

        /// Inner compressor for blosc
        #[arg(long, value_enum, default_value = "lz4")]
        inner: InnerArg,
    },

    /// Show the header of a blosc frame
    Info {
        /// Blosc frame file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Codec argument.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CodecArg {
    /// c-blosc frame
    Blosc,
    /// Baseline JPEG (uint8 only)
    Jpeg,
    /// Raw LZ4 block
    Lz4,
    /// Bitshuffle + LZ4
    Bslz4,
}

impl From<CodecArg> for CodecKind {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Blosc => CodecKind::Blosc,
            CodecArg::Jpeg => CodecKind::Jpeg,
            CodecArg::Lz4 => CodecKind::Lz4,
            CodecArg::Bslz4 => CodecKind::Bslz4,
        }
    }
}

/// Blosc shuffle argument.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ShuffleArg {
    /// No filter
    None,
    /// Byte shuffle
    Byte,
    /// Bit shuffle
    Bit,
}

impl From<ShuffleArg> for Shuffle {
    fn from(arg: ShuffleArg) -> Self {
        match arg {
            ShuffleArg::None => Shuffle::None,
            ShuffleArg::Byte => Shuffle::Byte,
            ShuffleArg::Bit => Shuffle::Bit,
        }
    }
}

/// Blosc inner compressor argument.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum InnerArg {
    /// LZ4
    Lz4,
    /// zlib
    Zlib,
    /// Zstandard
    Zstd,
}

impl From<InnerArg> for BloscCompressor {
    fn from(arg: InnerArg) -> Self {
        match arg {
            InnerArg::Lz4 => BloscCompressor::Lz4,
            InnerArg::Zlib => BloscCompressor::Zlib,
            InnerArg::Zstd => BloscCompressor::Zstd,
        }
    }
}

/// Run the CLI application.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .try_init();
    } else if !cli.quiet {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }

    let config = match &cli.config {
        Some(path) => DispatcherConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => DispatcherConfig::default(),
    };

    match cli.command {
        Commands::Decode {
            input,
            output,
            codec,
            element_type,
            uncompressed_size,
            dims,
        } => {
            let element_type = parse_element_type(&element_type)?;
            let summary = run_decode(
                &input,
                &output,
                &codec,
                element_type,
                uncompressed_size,
                &dims,
                config,
            )?;
            if !cli.quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Commands::Encode {
            input,
            output,
            codec,
            element_type,
            dims,
            quality,
            shuffle,
            inner,
        } => {
            let mut params = EncodeParams::new(parse_element_type(&element_type)?);
            params.quality = quality;
            params.block_size = config.bslz4_block_size;
            params.blosc.shuffle = shuffle.into();
            params.blosc.compressor = inner.into();
            let (raw_len, encoded_len) = run_encode(&input, &output, codec.into(), &dims, params)?;
            if !cli.quiet {
                println!(
                    "Encoded {} bytes to {} bytes ({:.2}:1)",
                    raw_len,
                    encoded_len,
                    raw_len as f64 / encoded_len.max(1) as f64
                );
            }
            Ok(())
        }
        Commands::Info { input, json } => run_info(&input, json),
    }
}

fn parse_element_type(text: &str) -> anyhow::Result<ScalarType> {
    text.parse::<ScalarType>()
        .with_context(|| format!("invalid element type '{}'", text))
}

/// Bytes described by `dims` elements of `element_size` bytes.
fn dims_bytes(dims: &[usize], element_size: usize) -> anyhow::Result<usize> {
    dims.iter()
        .try_fold(element_size, |acc, &d| acc.checked_mul(d))
        .with_context(|| format!("--dims {:?} overflow the address space", dims))
}

/// Decode `input` and write the typed elements to `output`.
fn run_decode(
    input: &Path,
    output: &Path,
    codec: &str,
    element_type: ScalarType,
    uncompressed_size: Option<usize>,
    dims: &[usize],
    config: DispatcherConfig,
) -> anyhow::Result<DecodeSummary> {
    let compressed =
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let uncompressed_size = match (uncompressed_size, dims.is_empty()) {
        (Some(size), _) => size,
        (None, false) => dims_bytes(dims, element_type.element_size().unwrap_or(1))?,
        (None, true) => bail!("either --uncompressed-size or --dims is required"),
    };
    let dims = if dims.is_empty() {
        vec![uncompressed_size / element_type.element_size().unwrap_or(1)]
    } else {
        dims.to_vec()
    };

    let byte_order = config.byte_order;
    let mut dispatcher = CodecDispatcher::with_config(config)?;
    let mut record = NtndArray::compressed(&dims, codec, element_type, compressed, uncompressed_size);
    let summary = dispatcher
        .decompress_with_summary(&mut record)
        .with_context(|| format!("decoding {}", input.display()))?;

    let bytes = record
        .value
        .as_ref()
        .map(|value| value.to_bytes(byte_order))
        .unwrap_or_default();
    std::fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    Ok(summary)
}

/// Encode `input` with `kind` and write the frame to `output`.
fn run_encode(
    input: &Path,
    output: &Path,
    kind: CodecKind,
    dims: &[usize],
    mut params: EncodeParams,
) -> anyhow::Result<(usize, usize)> {
    let raw = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    if !dims.is_empty() {
        let element_size = params.element_type.element_size().unwrap_or(1);
        let expected = dims_bytes(dims, element_size)?;
        if expected != raw.len() {
            bail!(
                "{} holds {} bytes but --dims describe {}",
                input.display(),
                raw.len(),
                expected
            );
        }
        if kind == CodecKind::Jpeg {
            let shaped = NtndArray::uncompressed(dims, ScalarArray::UInt8(Vec::new()));
            params.shape = Some(shaped.image_shape()?);
        }
    }

    let encoded = codec::encode(kind, &raw, &params)
        .with_context(|| format!("encoding {} as {}", input.display(), kind))?;
    std::fs::write(output, &encoded).with_context(|| format!("writing {}", output.display()))?;
    Ok((raw.len(), encoded.len()))
}

/// Print the header of a blosc frame.
fn run_info(input: &Path, json: bool) -> anyhow::Result<()> {
    let frame = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let header = BloscHeader::parse(&frame)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&header)?);
        return Ok(());
    }

    println!("Blosc Frame Information");
    println!("=======================");
    println!("File: {}", input.display());
    println!("  Version: {} (codec format {})", header.version, header.versionlz);
    println!("  Compressor: {:?}", header.compressor());
    println!("  Shuffle: {:?}", header.shuffle());
    println!("  Split Blocks: {}", if header.is_split() { "Yes" } else { "No" });
    println!("  Memcpyed: {}", if header.is_memcpyed() { "Yes" } else { "No" });
    println!("  Type Size: {}", header.typesize);
    println!("  Uncompressed: {} bytes", header.nbytes);
    println!("  Compressed: {} bytes", header.cbytes);
    println!("  Block Size: {} bytes ({} blocks)", header.blocksize, header.nblocks());
    Ok(())
}

fn print_summary(summary: &DecodeSummary) {
    println!("Decode Result:");
    println!("  Codec: {}", summary.codec);
    if let Some(element_type) = summary.element_type {
        println!("  Element Type: {}", element_type);
    }
    println!("  Compressed Size: {} bytes", summary.compressed_size);
    println!("  Uncompressed Size: {} bytes", summary.uncompressed_size);
    println!("  Compression Ratio: {:.2}:1", summary.compression_ratio);
    println!("  Time: {} us", summary.decode_time_us);
}
