#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use pbz_core::{Codec, CodecError, FrameReader};

/// Generate `len` deterministic bytes using a simple LCG.
pub fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
pub fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

/// Parse a container and decompress every frame with `codec`.
pub fn decode_frames(container: &[u8], codec: &dyn Codec) -> Vec<Vec<u8>> {
    FrameReader::new(container)
        .map(|frame| codec.decompress(&frame.unwrap()).unwrap())
        .collect()
}

/// Wraps a codec and fails every chunk whose first byte is `marker`.
pub struct FailOnMarker<C> {
    pub inner: C,
    pub marker: u8,
}

impl<C: Codec> Codec for FailOnMarker<C> {
    fn name(&self) -> &'static str {
        "fail-on-marker"
    }

    fn bound(&self, raw_len: usize) -> usize {
        self.inner.bound(raw_len)
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        if raw.first() == Some(&self.marker) {
            return Err(CodecError::Primitive("injected failure".to_string()));
        }
        self.inner.compress_into(raw, dst)
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.inner.decompress(compressed)
    }
}

/// Wraps a codec and sleeps before compressing. The delay is looked up by the
/// chunk's first byte, which tests set to the chunk index.
pub struct Delayed<C> {
    pub inner: C,
    pub delays_ms: Vec<u64>,
}

impl<C: Codec> Codec for Delayed<C> {
    fn name(&self) -> &'static str {
        "delayed"
    }

    fn bound(&self, raw_len: usize) -> usize {
        self.inner.bound(raw_len)
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let key = raw.first().copied().unwrap_or_default() as usize;
        if let Some(ms) = self.delays_ms.get(key) {
            thread::sleep(Duration::from_millis(*ms));
        }
        self.inner.compress_into(raw, dst)
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.inner.decompress(compressed)
    }
}

/// Input of `chunks` chunks of `chunk_size` bytes whose first byte is the chunk index.
pub fn indexed_chunks(chunks: usize, chunk_size: usize) -> Vec<u8> {
    let mut data = compressible_bytes(chunks * chunk_size);
    for i in 0..chunks {
        data[i * chunk_size] = i as u8;
    }
    data
}

/// Serves `ok` bytes of `data`, then fails every read.
pub struct BrokenReader {
    pub data: Vec<u8>,
    pub ok: usize,
    pub pos: usize,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.ok {
            return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
        }
        let n = buf.len().min(self.ok - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Accepts `limit` bytes, then fails every write.
pub struct FullDisk {
    pub written: Vec<u8>,
    pub limit: usize,
}

impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit.saturating_sub(self.written.len());
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Wraps a codec and counts how many chunks it was asked to compress.
pub struct Counting<C> {
    pub inner: C,
    pub calls: AtomicUsize,
}

impl<C> Counting<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<C: Codec> Codec for Counting<C> {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn bound(&self, raw_len: usize) -> usize {
        self.inner.bound(raw_len)
    }

    fn compress_into(&self, raw: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compress_into(raw, dst)
    }

    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.inner.decompress(compressed)
    }
}
