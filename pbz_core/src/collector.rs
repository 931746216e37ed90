use std::collections::BTreeMap;

use log::debug;

use crate::chunk::{ChunkFailure, ChunkOutcome, CompressedChunk};
use crate::error::CollectorError;

/// Lifecycle of an [`OrderedCollector`] over one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// The total chunk count is not known yet; more outcomes may arrive.
    Collecting,
    /// The total is known, but some chunks are still outstanding.
    Draining,
    /// Every chunk below the total was emitted or dropped.
    Complete,
}

/// A chunk that was left out of the container, with the reason.
#[derive(Debug)]
pub struct DroppedChunk {
    pub index: u64,
    pub raw_len: usize,
    pub reason: String,
}

#[derive(Debug)]
enum Slot {
    Ready(CompressedChunk),
    Failed(ChunkFailure),
}

/// Re-serializes out-of-order chunk outcomes into ascending index order.
///
/// Outcomes are parked in a `BTreeMap` until the chunk at the emission cursor
/// arrives, at which point it and every contiguous successor are released.
/// A failed chunk at the cursor is recorded as dropped and skipped, so it
/// never blocks the chunks behind it.
///
/// Every index is released at most once and strictly after all lower indices.
#[derive(Debug, Default)]
pub struct OrderedCollector {
    next_to_emit: u64,
    pending: BTreeMap<u64, Slot>,
    total: Option<u64>,
    highest_seen: Option<u64>,
    dropped: Vec<DroppedChunk>,
}

impl OrderedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one worker outcome and return the chunks now ready for writing.
    ///
    /// # Errors
    /// Returns an error if the index was already received (or already passed
    /// by the cursor), or if it lies at or beyond a sealed total.
    pub fn accept(&mut self, outcome: ChunkOutcome) -> Result<Vec<CompressedChunk>, CollectorError> {
        let index = outcome.index();
        self.check_index(index)?;

        self.highest_seen = Some(self.highest_seen.map_or(index, |h| h.max(index)));
        let slot = match outcome {
            ChunkOutcome::Compressed(chunk) => Slot::Ready(chunk),
            ChunkOutcome::Failed(failure) => {
                debug!("chunk {} failed, parked until cursor reaches it", index);
                Slot::Failed(failure)
            }
        };
        self.pending.insert(index, slot);
        Ok(self.drain())
    }

    /// Record the total chunk count once the reader is exhausted.
    ///
    /// # Errors
    /// Returns an error when called twice, or when `total` does not cover an
    /// index that was already received.
    pub fn seal(&mut self, total: u64) -> Result<(), CollectorError> {
        if self.total.is_some() {
            return Err(CollectorError::InvalidTotal {
                total,
                reason: "total already sealed",
            });
        }
        if self.highest_seen.is_some_and(|h| h >= total) {
            return Err(CollectorError::InvalidTotal {
                total,
                reason: "a received chunk index lies beyond it",
            });
        }
        self.total = Some(total);
        Ok(())
    }

    pub fn state(&self) -> CollectorState {
        match self.total {
            None => CollectorState::Collecting,
            Some(total) if self.next_to_emit >= total => CollectorState::Complete,
            Some(_) => CollectorState::Draining,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == CollectorState::Complete
    }

    /// Index the collector will release next.
    pub fn next_to_emit(&self) -> u64 {
        self.next_to_emit
    }

    /// Outcomes received but still waiting on a lower index.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Chunks resolved as dropped so far, in index order.
    pub fn dropped(&self) -> &[DroppedChunk] {
        &self.dropped
    }

    pub fn into_dropped(self) -> Vec<DroppedChunk> {
        self.dropped
    }

    fn check_index(&self, index: u64) -> Result<(), CollectorError> {
        if index < self.next_to_emit || self.pending.contains_key(&index) {
            return Err(CollectorError::DuplicateChunk {
                index,
                next: self.next_to_emit,
            });
        }
        if let Some(total) = self.total {
            if index >= total {
                return Err(CollectorError::ChunkOutOfRange { index, total });
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<CompressedChunk> {
        let mut ready = Vec::new();
        while let Some(slot) = self.pending.remove(&self.next_to_emit) {
            match slot {
                Slot::Ready(chunk) => ready.push(chunk),
                Slot::Failed(failure) => {
                    debug!(
                        "chunk {} dropped from output: {}",
                        failure.index, failure.error
                    );
                    self.dropped.push(DroppedChunk {
                        index: failure.index,
                        raw_len: failure.raw_len,
                        reason: failure.error.to_string(),
                    });
                }
            }
            self.next_to_emit += 1;
        }
        ready
    }
}
