//! Growable transfer buffers owned by one dispatcher.
//!
//! Buffers are sized once at construction and only ever grow, to exactly the
//! size a frame needs. Steady streams of same-sized frames therefore never
//! allocate after the first frame.

/// Byte buffer whose capacity only grows.
#[derive(Debug)]
pub struct GrowableBuffer {
    data: Vec<u8>,
}

impl GrowableBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
        }
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Reallocate to exactly `required` bytes if the buffer is smaller.
    ///
    /// Returns `true` when a reallocation happened.
    pub fn ensure_capacity(&mut self, required: usize) -> bool {
        if self.data.len() >= required {
            return false;
        }
        log::debug!(
            "growing transfer buffer from {} to {} bytes",
            self.data.len(),
            required
        );
        self.data = vec![0; required];
        true
    }

    /// The first `len` bytes.
    pub fn slice(&self, len: usize) -> &[u8] {
        &self.data[..len]
    }

    /// The first `len` bytes, mutably.
    pub fn slice_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.data[..len]
    }
}

/// Input, output and staging buffers for one decode stream.
#[derive(Debug)]
pub struct TransferBuffers {
    /// Holds the compressed bytes handed to a primitive.
    pub input: GrowableBuffer,
    /// Receives the decompressed bytes.
    pub output: GrowableBuffer,
    /// Byte copy of the payload before it moves into `input`.
    pub staging: Vec<u8>,
}

impl TransferBuffers {
    /// Allocate all three buffers at `initial_size` bytes.
    pub fn new(initial_size: usize) -> Self {
        Self {
            input: GrowableBuffer::with_capacity(initial_size),
            output: GrowableBuffer::with_capacity(initial_size),
            staging: vec![0; initial_size],
        }
    }

    /// Grow each buffer that is too small for this frame.
    pub fn reserve(&mut self, compressed_size: usize, uncompressed_size: usize) {
        self.input.ensure_capacity(compressed_size);
        self.output.ensure_capacity(uncompressed_size);
        if self.staging.len() < compressed_size {
            self.staging = vec![0; compressed_size];
        }
    }

    /// Move the first `len` staged bytes into the input buffer at offset 0.
    pub fn load_input(&mut self, len: usize) {
        self.input.slice_mut(len).copy_from_slice(&self.staging[..len]);
    }
}
