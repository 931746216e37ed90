use pbz_core::{Codec, CodecError};

/// Default zstd compression level.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Zstandard block codec.
///
/// Each chunk is compressed into its own zstd frame at the configured level.
/// The frame records its content size, so decompression needs no hint.
///
/// Best for: general text, JSON, logs, mixed structured data.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl ZstdCodec {
    /// `level` must be 1..=22.
    pub fn new(level: i32) -> anyhow::Result<Self> {
        if !(1..=22).contains(&level) {
            anyhow::bail!("zstd level must be between 1 and 22, got {}", level);
        }
        Ok(Self { level })
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn bound(&self, raw_len: usize) -> usize {
        zstd::zstd_safe::compress_bound(raw_len)
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        zstd::bulk::compress_to_buffer(raw, dst, self.level)
            .map_err(|e| CodecError::Primitive(format!("zstd compress error: {}", e)))
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(compressed)
            .map_err(|e| CodecError::Corrupt(format!("zstd decompress error: {}", e)))
    }
}
