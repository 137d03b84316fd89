//! NTNDArray Codec Library
//!
//! Decompression of compressed EPICS areaDetector NTNDArray frames into
//! typed numeric arrays.
//!
//! # Features
//!
//! - **Codec dispatch**: `blosc`, `jpeg`, `lz4` and `bslz4` frames, selected
//!   by the codec name carried in the record
//! - **Growable transfer buffers**: sized once, grown to fit, never shrunk
//! - **Typed output**: decoded bytes reinterpreted as the element type
//!   declared in the codec parameters, in an explicit byte order
//! - **Multi-stream decoding**: one dispatcher per stream on a rayon pool
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ntnda_codec::{CodecDispatcher, NtndArray};
//!
//! let mut dispatcher = CodecDispatcher::new();
//!
//! // `record` arrives from a pvAccess monitor
//! let mut record: NtndArray = receive();
//! match dispatcher.decompress(&mut record) {
//!     Ok(()) => display(record.value.as_ref().unwrap()),
//!     Err(e) => log::warn!("skipping frame: {}", e),
//! }
//! println!("{} {:.2}:1", dispatcher.last_codec_name(), dispatcher.compress_ratio());
//! ```
//!
//! # Custom primitives
//!
//! Any codec's primitive can be replaced, for example with a test double:
//!
//! ```rust,ignore
//! let dispatcher = DispatcherBuilder::new()
//!     .primitive(CodecKind::Blosc, Box::new(MyBlosc::default()))
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod batch;
pub mod buffer;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ntnd;

// Re-export commonly used types
pub use array::{ScalarArray, ScalarType};
pub use batch::{BatchStats, FrameQueue, StreamDecoder};
pub use codec::{CodecKind, Decompressor, PrimitiveSet};
pub use config::{DispatcherConfig, Endianness};
pub use dispatcher::{CodecDispatcher, DecodeSummary, DispatcherBuilder};
pub use error::{CodecError, Result};
pub use ntnd::{CodecDescriptor, ColorLayout, Dimension, ImageShape, NtndArray};

/// Library version information.
pub mod version {
    /// Library version string.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Library name.
    pub const NAME: &str = env!("CARGO_PKG_NAME");

    /// Get full version string.
    pub fn full_version() -> String {
        format!("{} {}", NAME, VERSION)
    }
}
