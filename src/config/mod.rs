//! Configuration for the codec dispatcher.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Initial capacity of the dispatcher's transfer buffers (10 MiB).
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Byte order used when reinterpreting decoded bytes as typed elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Byte order of the host running the decode.
    #[default]
    Native,
    /// Little-endian.
    Little,
    /// Big-endian.
    Big,
}

impl Endianness {
    /// Map `Native` onto the concrete order of this host.
    pub fn resolve(self) -> Endianness {
        match self {
            Endianness::Native if cfg!(target_endian = "big") => Endianness::Big,
            Endianness::Native => Endianness::Little,
            other => other,
        }
    }
}

/// Settings for a [`CodecDispatcher`](crate::dispatcher::CodecDispatcher).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Capacity allocated for each transfer buffer at construction.
    pub initial_buffer_size: usize,
    /// Byte order of the decoded element stream.
    pub byte_order: Endianness,
    /// Elements per bitshuffle block (0 = library default).
    pub bslz4_block_size: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            byte_order: Endianness::Native,
            bslz4_block_size: 0,
        }
    }
}

impl DispatcherConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DispatcherConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CodecError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| CodecError::Config(e.to_string()))
    }

    /// Check the settings for values the dispatcher cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.initial_buffer_size == 0 {
            return Err(CodecError::Config(
                "initial_buffer_size must be greater than zero".into(),
            ));
        }
        if self.bslz4_block_size % 8 != 0 {
            return Err(CodecError::Config(format!(
                "bslz4_block_size {} is not a multiple of 8",
                self.bslz4_block_size
            )));
        }
        Ok(())
    }
}
