use lz4_flex::block::{compress_into, decompress_size_prepended, get_maximum_output_size};
use pbz_core::{Codec, CodecError};

/// Bytes used by the raw-length prefix in front of each lz4 block.
const SIZE_PREFIX: usize = 4;

/// LZ4 block codec.
///
/// Fastest of the bundled codecs. Each payload is `[raw_len: u32 LE][lz4 block]`,
/// the same layout as `lz4_flex::compress_prepend_size`, so a payload can be
/// decoded without knowing the chunk size.
///
/// Best for: hot data where throughput matters more than size reduction.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn bound(&self, raw_len: usize) -> usize {
        SIZE_PREFIX + get_maximum_output_size(raw_len)
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let raw_len = u32::try_from(raw.len())
            .map_err(|_| CodecError::Primitive(format!("lz4 input of {} bytes", raw.len())))?;
        if dst.len() < SIZE_PREFIX {
            return Err(CodecError::BufferTooSmall {
                bound: dst.len(),
                produced: SIZE_PREFIX,
            });
        }
        let (prefix, body) = dst.split_at_mut(SIZE_PREFIX);
        prefix.copy_from_slice(&raw_len.to_le_bytes());
        let written = compress_into(raw, body)
            .map_err(|e| CodecError::Primitive(format!("lz4 compress error: {}", e)))?;
        Ok(SIZE_PREFIX + written)
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        decompress_size_prepended(compressed)
            .map_err(|e| CodecError::Corrupt(format!("lz4 decompress error: {}", e)))
    }
}
