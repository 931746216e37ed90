pub use crate::error::CodecError;

/// Core compression abstraction.
///
/// Each `Codec` implementation:
/// - Compresses one chunk at a time with no state carried between chunks,
///   so chunks can be handed to any worker in any order.
/// - Reports a worst-case output size through [`bound`](Codec::bound). The
///   pipeline sizes the output buffer from it, so it must never undercount.
/// - Writes a payload that [`decompress`](Codec::decompress) can restore
///   without any side information (the container stores lengths only).
pub trait Codec: Send + Sync {
    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Upper bound on the compressed size of `raw_len` input bytes.
    fn bound(&self, raw_len: usize) -> usize;

    /// Compress `raw` into `dst`, returning the number of bytes produced.
    ///
    /// `dst` is at least `bound(raw.len())` bytes long.
    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError>;

    /// Restore the raw bytes of a payload produced by [`compress`](Codec::compress).
    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Compress a single independent chunk.
    ///
    /// Allocates `bound(raw.len())` bytes, compresses into them, and truncates
    /// to the produced length.
    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let bound = self.bound(raw.len());
        let mut dst = vec![0u8; bound];
        let produced = self.compress_into(raw, &mut dst)?;
        if produced > bound {
            return Err(CodecError::BufferTooSmall { bound, produced });
        }
        dst.truncate(produced);
        Ok(dst)
    }
}
