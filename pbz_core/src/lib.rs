pub mod chunk;
pub mod codec;
pub mod collector;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod pool;
pub mod reader;
pub mod writer;

pub use chunk::{ChunkFailure, ChunkOutcome, ChunkReader, CompressedChunk, RawChunk};
pub use codec::{Codec, CodecError};
pub use collector::{CollectorState, DroppedChunk, OrderedCollector};
pub use error::{CollectorError, ConfigError, FrameError, PipelineError, Result};
pub use format::{DEFAULT_CHUNK_SIZE, FRAME_PREFIX_SIZE};
pub use pipeline::{compress_file, compress_stream, PipelineConfig, RunReport};
pub use pool::{compress_chunk, WorkerPool, WorkerStats};
pub use reader::FrameReader;
pub use writer::FrameWriter;
