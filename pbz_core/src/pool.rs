use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace};

use crate::chunk::{ChunkFailure, ChunkOutcome, CompressedChunk, RawChunk};
use crate::codec::Codec;
use crate::error::CodecError;

/// Per-worker counters returned when a worker thread exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub compressed: u64,
    pub failed: u64,
    /// Chunks taken off the queue after cancellation and never compressed.
    pub skipped: u64,
}

/// Fixed-size pool of compression workers.
///
/// Workers are scoped threads that pull [`RawChunk`]s from a shared job
/// channel, compress each one with the pool's codec, and send exactly one
/// [`ChunkOutcome`] per chunk to the outcome channel. Workers share nothing
/// mutable except the cancellation flag.
pub struct WorkerPool<'c> {
    codec: &'c dyn Codec,
    num_workers: usize,
    cancelled: AtomicBool,
}

impl<'c> WorkerPool<'c> {
    pub fn new(codec: &'c dyn Codec, num_workers: usize) -> Self {
        Self {
            codec,
            num_workers: num_workers.max(1),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Number of workers configured in this pool.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Stop compressing. Chunks already inside `compress` finish; chunks still
    /// queued are drained and counted as skipped.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Spawns the worker threads inside `scope`.
    ///
    /// Workers exit when the job channel is closed and empty, or when the
    /// outcome channel has no receiver left.
    pub fn spawn<'scope, 'env, T>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        jobs: Receiver<RawChunk>,
        outcomes: Sender<T>,
    ) -> io::Result<Vec<ScopedJoinHandle<'scope, WorkerStats>>>
    where
        T: From<ChunkOutcome> + Send + 'scope,
    {
        (0..self.num_workers)
            .map(|worker_id| {
                let jobs = jobs.clone();
                let outcomes = outcomes.clone();
                thread::Builder::new()
                    .name(format!("pbz-worker-{worker_id}"))
                    .spawn_scoped(scope, move || self.run_worker(worker_id, jobs, outcomes))
            })
            .collect()
    }

    fn run_worker<T: From<ChunkOutcome>>(
        &self,
        worker_id: usize,
        jobs: Receiver<RawChunk>,
        outcomes: Sender<T>,
    ) -> WorkerStats {
        let mut stats = WorkerStats {
            worker_id,
            ..WorkerStats::default()
        };

        for chunk in jobs.iter() {
            if self.is_cancelled() {
                stats.skipped += 1;
                continue;
            }

            trace!("worker {} compressing chunk {}", worker_id, chunk.index);
            let outcome = compress_chunk(self.codec, chunk);
            match &outcome {
                ChunkOutcome::Compressed(_) => stats.compressed += 1,
                ChunkOutcome::Failed(_) => stats.failed += 1,
            }

            if outcomes.send(T::from(outcome)).is_err() {
                break;
            }
        }

        debug!(
            "worker {} exiting: {} compressed, {} failed, {} skipped",
            worker_id, stats.compressed, stats.failed, stats.skipped
        );
        stats
    }
}

/// Compress one chunk, turning codec errors and codec panics into a
/// [`ChunkFailure`] for that chunk alone.
pub fn compress_chunk(codec: &dyn Codec, chunk: RawChunk) -> ChunkOutcome {
    let RawChunk { index, data } = chunk;
    let raw_len = data.len();

    let result = catch_unwind(AssertUnwindSafe(|| codec.compress(&data))).unwrap_or_else(|_| {
        Err(CodecError::Primitive(
            "codec panicked while compressing chunk".to_string(),
        ))
    });

    match result {
        Ok(payload) => ChunkOutcome::Compressed(CompressedChunk {
            index,
            raw_len,
            payload,
        }),
        Err(error) => ChunkOutcome::Failed(ChunkFailure {
            index,
            raw_len,
            error,
        }),
    }
}
