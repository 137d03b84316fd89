//! Parallel decoding of several independent streams.
//!
//! Each stream gets its own [`CodecDispatcher`], kept across calls so its
//! buffers stay sized for that stream's frames. Streams are decoded in
//! parallel on a rayon pool; frames within a stream are decoded one after
//! another in queue order.
//!
//! # Example
//!
//! ```rust,ignore
//! use ntnda_codec::batch::{FrameQueue, StreamDecoder};
//!
//! let mut decoder = StreamDecoder::new(DispatcherConfig::default()).num_threads(4);
//! let mut queues = vec![FrameQueue::new("13SIM1:Pva1:Image", frames)];
//! let stats = decoder.decode(&mut queues)?;
//! println!("{} decoded, {} failed", stats.total_decoded(), stats.total_failed());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::DispatcherConfig;
use crate::dispatcher::CodecDispatcher;
use crate::error::{CodecError, Result};
use crate::ntnd::NtndArray;

/// Frames received on one stream, oldest first.
#[derive(Debug, Clone)]
pub struct FrameQueue {
    /// Stream (channel) name.
    pub stream: String,
    /// Frames; decoded in place.
    pub frames: Vec<NtndArray>,
}

impl FrameQueue {
    /// Queue `frames` for `stream`.
    pub fn new(stream: impl Into<String>, frames: Vec<NtndArray>) -> Self {
        Self {
            stream: stream.into(),
            frames,
        }
    }
}

/// Per-stream outcome of a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamStats {
    /// Stream name.
    pub stream: String,
    /// Frames decoded (or passed through uncompressed).
    pub decoded: usize,
    /// Frames skipped after an error.
    pub failed: usize,
    /// Queue positions of the skipped frames.
    pub failed_frames: Vec<usize>,
    /// Compressed bytes of the decoded frames.
    pub compressed_bytes: usize,
    /// Uncompressed bytes of the decoded frames.
    pub uncompressed_bytes: usize,
}

/// Statistics for one call to [`StreamDecoder::decode`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    /// One entry per queue, in queue order.
    pub streams: Vec<StreamStats>,
    /// Wall time in milliseconds.
    pub total_time_ms: u64,
}

impl BatchStats {
    /// Frames decoded across all streams.
    pub fn total_decoded(&self) -> usize {
        self.streams.iter().map(|s| s.decoded).sum()
    }

    /// Frames skipped across all streams.
    pub fn total_failed(&self) -> usize {
        self.streams.iter().map(|s| s.failed).sum()
    }

    /// Overall compression ratio of the decoded frames.
    pub fn overall_ratio(&self) -> f64 {
        let compressed: usize = self.streams.iter().map(|s| s.compressed_bytes).sum();
        let uncompressed: usize = self.streams.iter().map(|s| s.uncompressed_bytes).sum();
        if compressed == 0 {
            0.0
        } else {
            uncompressed as f64 / compressed as f64
        }
    }

    /// Stats for `stream`.
    pub fn stream(&self, stream: &str) -> Option<&StreamStats> {
        self.streams.iter().find(|s| s.stream == stream)
    }
}

/// Decodes per-stream frame queues in parallel, one dispatcher per stream.
#[derive(Debug)]
pub struct StreamDecoder {
    config: DispatcherConfig,
    num_threads: usize,
    dispatchers: BTreeMap<String, CodecDispatcher>,
}

impl StreamDecoder {
    /// Create a decoder whose dispatchers use `config`.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            num_threads: rayon::current_num_threads(),
            dispatchers: BTreeMap::new(),
        }
    }

    /// Set the number of worker threads.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.num_threads
    }

    /// Dispatcher serving `stream`, if it has been seen.
    pub fn dispatcher(&self, stream: &str) -> Option<&CodecDispatcher> {
        self.dispatchers.get(stream)
    }

    /// Names of the streams seen so far.
    pub fn streams(&self) -> impl Iterator<Item = &str> {
        self.dispatchers.keys().map(String::as_str)
    }

    /// Decode every queue in place.
    ///
    /// Frames that fail are logged, counted and left as delivered; the rest
    /// of the queue is still decoded. A stream may appear only once per call.
    pub fn decode(&mut self, queues: &mut [FrameQueue]) -> Result<BatchStats> {
        let start = Instant::now();

        let mut seen = HashSet::new();
        for queue in queues.iter() {
            if !seen.insert(queue.stream.as_str()) {
                return Err(CodecError::InvalidRecord(format!(
                    "stream {} queued more than once",
                    queue.stream
                )));
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| CodecError::Config(format!("Failed to create thread pool: {}", e)))?;

        // Every dispatcher exists before any is taken out of the map.
        for queue in queues.iter() {
            if !self.dispatchers.contains_key(&queue.stream) {
                log::debug!("new stream {}", queue.stream);
                let dispatcher = CodecDispatcher::with_config(self.config.clone())?;
                self.dispatchers.insert(queue.stream.clone(), dispatcher);
            }
        }

        let mut work = Vec::with_capacity(queues.len());
        for queue in queues.iter_mut() {
            if let Some(dispatcher) = self.dispatchers.remove(&queue.stream) {
                work.push((queue, dispatcher));
            }
        }

        let streams: Vec<StreamStats> = pool.install(|| {
            work.par_iter_mut()
                .map(|(queue, dispatcher)| decode_queue(dispatcher, queue))
                .collect()
        });

        for (queue, dispatcher) in work {
            self.dispatchers.insert(queue.stream.clone(), dispatcher);
        }

        let stats = BatchStats {
            streams,
            total_time_ms: start.elapsed().as_millis() as u64,
        };
        log::info!(
            "decoded {} frames across {} streams ({} failed)",
            stats.total_decoded(),
            stats.streams.len(),
            stats.total_failed()
        );
        Ok(stats)
    }
}

fn decode_queue(dispatcher: &mut CodecDispatcher, queue: &mut FrameQueue) -> StreamStats {
    let mut stats = StreamStats {
        stream: queue.stream.clone(),
        ..Default::default()
    };
    for (index, frame) in queue.frames.iter_mut().enumerate() {
        match dispatcher.decompress_with_summary(frame) {
            Ok(summary) => {
                stats.decoded += 1;
                stats.compressed_bytes += summary.compressed_size;
                stats.uncompressed_bytes += summary.uncompressed_size;
            }
            Err(e) => {
                log::warn!("{}: skipping frame {}: {}", queue.stream, index, e);
                stats.failed += 1;
                stats.failed_frames.push(index);
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ScalarArray, ScalarType};
    use crate::codec::Lz4Primitive;

    fn lz4_frame(fill: u16, n: usize) -> NtndArray {
        let raw: Vec<u8> = std::iter::repeat(fill.to_ne_bytes()).take(n).flatten().collect();
        NtndArray::compressed(&[n], "lz4", ScalarType::UInt16, Lz4Primitive::compress(&raw), raw.len())
    }

    fn small_config() -> DispatcherConfig {
        DispatcherConfig {
            initial_buffer_size: 1024,
            ..Default::default()
        }
    }

    #[test]
    fn test_streams_decode_independently() {
        let mut decoder = StreamDecoder::new(small_config()).num_threads(2);
        let mut queues = vec![
            FrameQueue::new("a", (0..5).map(|i| lz4_frame(i, 256)).collect()),
            FrameQueue::new("b", (0..3).map(|i| lz4_frame(100 + i, 4096)).collect()),
        ];

        let stats = decoder.decode(&mut queues).unwrap();
        assert_eq!(stats.total_decoded(), 8);
        assert_eq!(stats.total_failed(), 0);
        assert!(stats.overall_ratio() > 1.0);

        for (i, frame) in queues[0].frames.iter().enumerate() {
            let values = frame.value.as_ref().unwrap().as_u16().unwrap();
            assert!(values.iter().all(|&v| v == i as u16));
        }
        assert_eq!(decoder.dispatcher("a").unwrap().output_capacity(), 1024);
        assert_eq!(decoder.dispatcher("b").unwrap().output_capacity(), 8192);
    }

    #[test]
    fn test_failed_frame_is_skipped() {
        let mut broken = lz4_frame(0, 64);
        broken.codec.name = "zfp".into();
        let mut queues = vec![FrameQueue::new(
            "det",
            vec![lz4_frame(1, 64), broken.clone(), lz4_frame(3, 64)],
        )];

        let stats = StreamDecoder::new(small_config()).decode(&mut queues).unwrap();
        let det = stats.stream("det").unwrap();
        assert_eq!(det.decoded, 2);
        assert_eq!(det.failed_frames, vec![1]);
        assert_eq!(queues[0].frames[1], broken);
        assert_eq!(
            queues[0].frames[2].value.as_ref().and_then(ScalarArray::as_u16).map(|v| v[0]),
            Some(3)
        );
    }

    #[test]
    fn test_dispatcher_kept_between_calls() {
        let mut decoder = StreamDecoder::new(small_config()).num_threads(1);
        decoder
            .decode(&mut [FrameQueue::new("s", vec![lz4_frame(7, 2048)])])
            .unwrap();
        decoder
            .decode(&mut [FrameQueue::new("s", vec![lz4_frame(7, 16)])])
            .unwrap();
        assert_eq!(decoder.streams().collect::<Vec<_>>(), vec!["s"]);
        assert_eq!(decoder.dispatcher("s").unwrap().output_capacity(), 4096);
    }

    #[test]
    fn test_invalid_config_keeps_existing_dispatchers() {
        let mut decoder = StreamDecoder::new(small_config()).num_threads(1);
        decoder
            .decode(&mut [FrameQueue::new("s", vec![lz4_frame(7, 2048)])])
            .unwrap();

        decoder.config.initial_buffer_size = 0;
        let mut queues = vec![
            FrameQueue::new("s", vec![lz4_frame(1, 16)]),
            FrameQueue::new("t", vec![lz4_frame(2, 16)]),
        ];
        let untouched = queues[0].frames.clone();
        let err = decoder.decode(&mut queues).unwrap_err();

        assert!(matches!(err, CodecError::Config(_)));
        assert_eq!(decoder.streams().collect::<Vec<_>>(), vec!["s"]);
        assert_eq!(decoder.dispatcher("s").unwrap().output_capacity(), 4096);
        assert_eq!(queues[0].frames, untouched);
    }

    #[test]
    fn test_duplicate_stream_rejected() {
        let mut queues = vec![FrameQueue::new("x", vec![]), FrameQueue::new("x", vec![])];
        assert!(StreamDecoder::new(small_config()).decode(&mut queues).is_err());
    }
}
