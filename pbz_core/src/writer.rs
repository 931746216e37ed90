use std::io::Write;

use log::trace;

use crate::error::FrameError;
use crate::format::{encode_prefix, framed_len};

/// Sequential writer for PBZ containers.
///
/// # Write contract
/// Call [`write_frame`] once per compressed chunk, in ascending chunk index
/// order. Each call appends `[len: u32 LE][payload]`. Indices may skip
/// (dropped chunks leave gaps) but never repeat or go backwards.
/// Call [`finish`] to flush buffered bytes and recover the inner writer.
///
/// Any I/O failure is returned to the caller, and the writer should be
/// abandoned: a container with a partial frame cannot be resumed.
///
/// [`write_frame`]: FrameWriter::write_frame
/// [`finish`]: FrameWriter::finish
pub struct FrameWriter<W: Write> {
    inner: W,
    last_index: Option<u64>,
    frames_written: u64,
    bytes_written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            last_index: None,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    /// Append one frame for chunk `index`.
    pub fn write_frame(&mut self, index: u64, payload: &[u8]) -> Result<(), FrameError> {
        if let Some(last) = self.last_index {
            if index <= last {
                return Err(FrameError::OutOfOrderFrame { index, last });
            }
        }
        let prefix =
            encode_prefix(payload.len()).ok_or(FrameError::FrameTooLarge { len: payload.len() })?;

        self.inner.write_all(&prefix)?;
        self.inner.write_all(payload)?;

        self.last_index = Some(index);
        self.frames_written += 1;
        self.bytes_written += framed_len(payload.len());
        trace!("frame {} written ({} payload bytes)", index, payload.len());
        Ok(())
    }

    /// Number of frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Container bytes appended so far, prefixes included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> Result<W, FrameError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
