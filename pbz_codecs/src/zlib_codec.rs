use std::io::Read;

use flate2::read::ZlibDecoder;
use flate2::{Compress, Compression, FlushCompress, Status};
use pbz_core::{Codec, CodecError};

/// zlib's `Z_DEFAULT_COMPRESSION` level.
pub const DEFAULT_ZLIB_LEVEL: u32 = 6;

/// zlib stream codec (deflate with zlib header and adler32 trailer).
///
/// Each chunk becomes one complete zlib stream, as produced by zlib's
/// one-shot `compress()`. This is the default codec.
///
/// Best for: interoperability, since any zlib implementation can decode a frame.
pub struct ZlibCodec {
    level: Compression,
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self {
            level: Compression::new(DEFAULT_ZLIB_LEVEL),
        }
    }
}

impl ZlibCodec {
    /// `level` must be 0..=9.
    pub fn new(level: u32) -> anyhow::Result<Self> {
        if level > 9 {
            anyhow::bail!("zlib level must be between 0 and 9, got {}", level);
        }
        Ok(Self {
            level: Compression::new(level),
        })
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Codec for ZlibCodec {
    fn name(&self) -> &'static str {
        "zlib"
    }

    /// zlib's `compressBound()`.
    fn bound(&self, raw_len: usize) -> usize {
        raw_len + (raw_len >> 12) + (raw_len >> 14) + (raw_len >> 25) + 13
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let mut stream = Compress::new(self.level, true);
        let status = stream
            .compress(raw, dst, FlushCompress::Finish)
            .map_err(|e| CodecError::Primitive(format!("zlib compress error: {}", e)))?;
        match status {
            Status::StreamEnd => Ok(stream.total_out() as usize),
            // Output space ran out before the stream could be finished.
            _ => Err(CodecError::BufferTooSmall {
                bound: dst.len(),
                produced: stream.total_out() as usize,
            }),
        }
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut raw = Vec::new();
        ZlibDecoder::new(compressed)
            .read_to_end(&mut raw)
            .map_err(|e| CodecError::Corrupt(format!("zlib decompress error: {}", e)))?;
        Ok(raw)
    }
}
