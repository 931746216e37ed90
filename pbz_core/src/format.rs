/// Default raw bytes per chunk: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Size of the length prefix in front of every frame payload, in bytes.
pub const FRAME_PREFIX_SIZE: usize = 4;

/// Largest payload a single frame can describe.
pub const MAX_FRAME_PAYLOAD: usize = u32::MAX as usize;

/// Chunks allowed in flight per worker when no explicit window is configured.
pub const DEFAULT_IN_FLIGHT_PER_WORKER: usize = 4;

// ── Container layout ───────────────────────────────────────────────────────
//
// A PBZ container has no header or footer. It is the concatenation of one
// frame per successfully compressed chunk, in ascending chunk order:
//
//   [len: u32 LE][payload: len bytes]  [len: u32 LE][payload]  ...
//
// Failed chunks leave no frame behind; the format carries no chunk index.

/// Encode the length prefix for a payload of `len` bytes.
///
/// Returns `None` when `len` does not fit in the prefix.
pub fn encode_prefix(len: usize) -> Option<[u8; FRAME_PREFIX_SIZE]> {
    u32::try_from(len).ok().map(u32::to_le_bytes)
}

/// Decode a length prefix back into a payload length.
pub fn decode_prefix(buf: [u8; FRAME_PREFIX_SIZE]) -> usize {
    u32::from_le_bytes(buf) as usize
}

/// Total container bytes taken by a frame carrying `payload_len` bytes.
pub fn framed_len(payload_len: usize) -> u64 {
    FRAME_PREFIX_SIZE as u64 + payload_len as u64
}
