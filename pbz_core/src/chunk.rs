use std::io::{self, Read};

use crate::error::CodecError;

/// A raw slice of the input, tagged with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Sequence index assigned at read time, starting at 0.
    pub index: u64,
    pub data: Vec<u8>,
}

/// A chunk after successful compression. Immutable from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedChunk {
    pub index: u64,
    /// Length of the raw slice this payload was produced from.
    pub raw_len: usize,
    pub payload: Vec<u8>,
}

/// A chunk the codec could not compress.
#[derive(Debug)]
pub struct ChunkFailure {
    pub index: u64,
    pub raw_len: usize,
    pub error: CodecError,
}

/// The single message a worker produces for every chunk it processes.
#[derive(Debug)]
pub enum ChunkOutcome {
    Compressed(CompressedChunk),
    Failed(ChunkFailure),
}

impl ChunkOutcome {
    pub fn index(&self) -> u64 {
        match self {
            ChunkOutcome::Compressed(chunk) => chunk.index,
            ChunkOutcome::Failed(failure) => failure.index,
        }
    }
}

/// Splits a byte source into fixed-size [`RawChunk`]s.
///
/// Every chunk holds exactly `chunk_size` bytes except possibly the last,
/// which holds the remainder. Zero-length chunks are never produced, so an
/// empty source yields nothing. The iterator is fused: it ends for good after
/// end-of-data or after the first read error.
pub struct ChunkReader<R: Read> {
    source: R,
    chunk_size: usize,
    next_index: u64,
    bytes_read: u64,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    /// `chunk_size` must be non-zero; [`PipelineConfig::validate`] checks this
    /// before a reader is built.
    ///
    /// [`PipelineConfig::validate`]: crate::PipelineConfig::validate
    pub fn new(source: R, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            source,
            chunk_size,
            next_index: 0,
            bytes_read: 0,
            done: false,
        }
    }

    /// Chunks produced so far. Once the reader is exhausted this is the total.
    pub fn chunks_read(&self) -> u64 {
        self.next_index
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn is_exhausted(&self) -> bool {
        self.done
    }

    fn read_chunk(&mut self) -> io::Result<Option<RawChunk>> {
        let mut data = Vec::with_capacity(self.chunk_size);
        // `take` + `read_to_end` keeps reading through short reads and retries
        // `Interrupted`, stopping at `chunk_size` bytes or end-of-data.
        (&mut self.source)
            .take(self.chunk_size as u64)
            .read_to_end(&mut data)?;

        if data.is_empty() {
            return Ok(None);
        }
        if data.len() < self.chunk_size {
            // A short chunk can only come from end-of-data.
            self.done = true;
        }

        let index = self.next_index;
        self.next_index += 1;
        self.bytes_read += data.len() as u64;
        Ok(Some(RawChunk { index, data }))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = io::Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
