use std::io;

use thiserror::Error;

/// Failure reported by a [`Codec`](crate::Codec) for a single chunk.
///
/// Codec errors are chunk-local: the pipeline drops the chunk and keeps going.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("output buffer too small: bound {bound} bytes, codec produced {produced}")]
    BufferTooSmall { bound: usize, produced: usize },
    #[error("compression primitive failed: {0}")]
    Primitive(String),
    #[error("corrupt compressed payload: {0}")]
    Corrupt(String),
}

/// Errors raised while writing or parsing length-prefixed frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("frame payload of {len} bytes exceeds the u32 length prefix")]
    FrameTooLarge { len: usize },
    #[error("frame for chunk {index} written after chunk {last}")]
    OutOfOrderFrame { index: u64, last: u64 },
    #[error("truncated frame: expected {expected} bytes, found {found}")]
    TruncatedFrame { expected: usize, found: usize },
}

/// Contract violations detected by the [`OrderedCollector`](crate::OrderedCollector).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectorError {
    #[error("chunk {index} was already received (next to emit: {next})")]
    DuplicateChunk { index: u64, next: u64 },
    #[error("chunk {index} is outside the sealed total of {total}")]
    ChunkOutOfRange { index: u64, total: u64 },
    #[error("invalid chunk total {total}: {reason}")]
    InvalidTotal { total: u64, reason: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("chunk size {0} exceeds the maximum frame payload")]
    ChunkSizeTooLarge(usize),
    #[error("worker count must be greater than zero")]
    ZeroWorkers,
    #[error("in-flight window must be at least the worker count ({workers}), got {window}")]
    WindowTooSmall { window: usize, workers: usize },
}

/// Run-fatal pipeline failures. Per-chunk codec failures are not listed here;
/// they surface in [`RunReport::dropped`](crate::RunReport).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write output: {0}")]
    Write(#[source] FrameError),
    #[error("ordering violation: {0}")]
    Collector(#[from] CollectorError),
    #[error("failed to spawn {0} thread: {1}")]
    Spawn(&'static str, #[source] io::Error),
    #[error("{0} thread panicked")]
    Panicked(&'static str),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
