use std::io::{ErrorKind, Read};

use crate::error::FrameError;
use crate::format::{decode_prefix, FRAME_PREFIX_SIZE};

/// Sequential reader for PBZ containers.
///
/// Yields each frame payload in container order. Because the container stores
/// no chunk indices, the caller relies on the run report to know which chunk
/// indices were dropped.
///
/// The iterator stops after the first error.
pub struct FrameReader<R: Read> {
    inner: R,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let mut prefix = [0u8; FRAME_PREFIX_SIZE];
        let got = read_full(&mut self.inner, &mut prefix)?;
        if got == 0 {
            return Ok(None);
        }
        if got < FRAME_PREFIX_SIZE {
            return Err(FrameError::TruncatedFrame {
                expected: FRAME_PREFIX_SIZE,
                found: got,
            });
        }

        let len = decode_prefix(prefix);
        // The prefix may be corrupt, so grow the buffer with the bytes that
        // actually arrive instead of trusting `len` up front.
        let mut payload = Vec::new();
        (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut payload)?;
        if payload.len() < len {
            return Err(FrameError::TruncatedFrame {
                expected: len,
                found: payload.len(),
            });
        }
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Vec<u8>, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_frame() {
            Ok(Some(payload)) => Some(Ok(payload)),
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

/// Fill `buf` as far as the source allows, returning the bytes read.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FrameWriter;

    #[test]
    fn reads_back_written_frames() {
        let mut w = FrameWriter::new(Vec::new());
        w.write_frame(0, b"first").unwrap();
        w.write_frame(2, b"").unwrap();
        w.write_frame(5, b"third").unwrap();
        let bytes = w.finish().unwrap();

        let frames: Vec<Vec<u8>> = FrameReader::new(bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames, vec![b"first".to_vec(), Vec::new(), b"third".to_vec()]);
    }

    #[test]
    fn empty_container_has_no_frames() {
        assert_eq!(FrameReader::new(&[0u8; 0][..]).count(), 0);
    }

    #[test]
    fn truncated_prefix_is_an_error() {
        let mut frames = FrameReader::new(&[1u8, 0][..]);
        assert!(matches!(
            frames.next(),
            Some(Err(FrameError::TruncatedFrame { expected: 4, found: 2 }))
        ));
        assert!(frames.next().is_none());
    }

    #[test]
    fn oversized_prefix_is_truncation_not_allocation() {
        let bytes = [0xFF, 0xFF, 0xFF, 0x7F, b'a', b'b'];
        let mut frames = FrameReader::new(&bytes[..]);
        assert!(matches!(
            frames.next(),
            Some(Err(FrameError::TruncatedFrame {
                expected: 0x7FFF_FFFF,
                found: 2
            }))
        ));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let bytes = [5u8, 0, 0, 0, b'a', b'b'];
        let mut frames = FrameReader::new(&bytes[..]);
        assert!(matches!(
            frames.next(),
            Some(Err(FrameError::TruncatedFrame { expected: 5, found: 2 }))
        ));
    }
}
