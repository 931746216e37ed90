use pbz_core::{Codec, CodecError};

/// No-op codec: stores chunks verbatim, with no compression.
///
/// Useful for:
/// - Verifying the container round-trip independently of any codec.
/// - Data that is already compressed (e.g., JPEG, MP4) where further
///   compression would expand the file.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn bound(&self, raw_len: usize) -> usize {
        raw_len
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        if dst.len() < raw.len() {
            return Err(CodecError::BufferTooSmall {
                bound: dst.len(),
                produced: raw.len(),
            });
        }
        dst[..raw.len()].copy_from_slice(raw);
        Ok(raw.len())
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(compressed.to_vec())
    }
}
