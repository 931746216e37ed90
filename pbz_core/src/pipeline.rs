use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, info};

use crate::chunk::{ChunkOutcome, ChunkReader, RawChunk};
use crate::codec::Codec;
use crate::collector::{DroppedChunk, OrderedCollector};
use crate::error::{ConfigError, PipelineError, Result};
use crate::format::{DEFAULT_CHUNK_SIZE, DEFAULT_IN_FLIGHT_PER_WORKER, MAX_FRAME_PAYLOAD};
use crate::pool::{WorkerPool, WorkerStats};
use crate::writer::FrameWriter;

/// Tunables for a compression run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Raw bytes per chunk (the last chunk may be shorter).
    pub chunk_size: usize,
    /// Maximum number of chunks compressed concurrently.
    pub workers: usize,
    /// Maximum chunks read but not yet written or dropped. `None` means
    /// `workers * DEFAULT_IN_FLIGHT_PER_WORKER`.
    pub max_in_flight: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: num_cpus::get().max(1),
            max_in_flight: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_in_flight(mut self, window: usize) -> Self {
        self.max_in_flight = Some(window);
        self
    }

    /// Effective in-flight window.
    pub fn window(&self) -> usize {
        self.max_in_flight
            .unwrap_or_else(|| self.workers.saturating_mul(DEFAULT_IN_FLIGHT_PER_WORKER))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_size > MAX_FRAME_PAYLOAD {
            return Err(ConfigError::ChunkSizeTooLarge(self.chunk_size));
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.window() < self.workers {
            return Err(ConfigError::WindowTooSmall {
                window: self.window(),
                workers: self.workers,
            });
        }
        Ok(())
    }
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub codec: &'static str,
    pub chunk_size: usize,
    pub workers: usize,
    pub chunks_read: u64,
    pub frames_written: u64,
    pub bytes_in: u64,
    /// Container bytes written, length prefixes included.
    pub bytes_out: u64,
    /// Chunks left out of the container because the codec failed on them.
    pub dropped: Vec<DroppedChunk>,
    pub elapsed: Duration,
}

impl RunReport {
    /// True when every chunk read made it into the container.
    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty()
    }

    pub fn dropped_indices(&self) -> Vec<u64> {
        self.dropped.iter().map(|d| d.index).collect()
    }

    /// Raw bytes per container byte. Zero for an empty container.
    pub fn ratio(&self) -> f64 {
        if self.bytes_out == 0 {
            0.0
        } else {
            self.bytes_in as f64 / self.bytes_out as f64
        }
    }
}

/// Everything the collector thread hears about, from the reader and workers.
#[derive(Debug)]
enum Event {
    Outcome(ChunkOutcome),
    Exhausted { total: u64, bytes: u64 },
    ReadFailed(io::Error),
}

impl From<ChunkOutcome> for Event {
    fn from(outcome: ChunkOutcome) -> Self {
        Event::Outcome(outcome)
    }
}

/// Compress `input` into a PBZ container written to `output`.
///
/// Reading happens on one thread, compression on `config.workers` threads,
/// and ordering plus writing on the calling thread. Frames land in the output
/// in input order regardless of which worker finishes first.
///
/// Codec failures drop the affected chunk and are listed in the returned
/// report. Read and write failures abort the run: chunks already being
/// compressed finish, queued chunks are skipped, and nothing else is written.
pub fn compress_stream<R, W>(
    input: R,
    output: W,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<RunReport>
where
    R: Read + Send,
    W: Write,
{
    config.validate()?;
    let started = Instant::now();
    let window = config.window();
    let pool = WorkerPool::new(codec, config.workers);
    let pool_ref = &pool;
    let mut writer = FrameWriter::new(output);
    let mut collector = OrderedCollector::new();

    debug!(
        "starting run: codec={} chunk_size={} workers={} window={}",
        codec.name(),
        config.chunk_size,
        pool.num_workers(),
        window
    );

    let (bytes_in, worker_stats) = thread::scope(|s| -> Result<(u64, Vec<WorkerStats>)> {
        let (job_tx, job_rx) = bounded::<RawChunk>(pool_ref.num_workers());
        let (event_tx, event_rx) = unbounded::<Event>();
        let (credit_tx, credit_rx) = bounded::<()>(window);

        let workers = pool_ref
            .spawn(s, job_rx, event_tx.clone())
            .map_err(|e| PipelineError::Spawn("worker", e))?;

        let chunks = ChunkReader::new(input, config.chunk_size);
        let reader = thread::Builder::new()
            .name("pbz-reader".to_string())
            .spawn_scoped(s, move || {
                read_chunks(chunks, pool_ref, job_tx, credit_tx, event_tx)
            })
            .map_err(|e| PipelineError::Spawn("reader", e))?;

        let drained = collect_ordered(&event_rx, &credit_rx, &mut collector, &mut writer);
        if drained.is_err() {
            pool_ref.cancel();
        }
        drop(event_rx);
        drop(credit_rx);

        let reader_ok = reader.join().is_ok();
        let mut stats = Vec::with_capacity(workers.len());
        let mut workers_ok = true;
        for handle in workers {
            match handle.join() {
                Ok(worker) => stats.push(worker),
                Err(_) => workers_ok = false,
            }
        }

        let bytes_in = drained?;
        if !reader_ok {
            return Err(PipelineError::Panicked("reader"));
        }
        if !workers_ok {
            return Err(PipelineError::Panicked("worker"));
        }
        Ok((bytes_in, stats))
    })?;

    let frames_written = writer.frames_written();
    let bytes_out = writer.bytes_written();
    writer.finish().map_err(PipelineError::Write)?;

    let report = RunReport {
        codec: codec.name(),
        chunk_size: config.chunk_size,
        workers: pool.num_workers(),
        chunks_read: collector.total().unwrap_or_default(),
        frames_written,
        bytes_in,
        bytes_out,
        dropped: collector.into_dropped(),
        elapsed: started.elapsed(),
    };

    for stats in &worker_stats {
        debug!(
            "worker {}: {} compressed, {} failed",
            stats.worker_id, stats.compressed, stats.failed
        );
    }
    info!(
        "compressed {} chunks ({} bytes) into {} frames ({} bytes) in {:.3}s",
        report.chunks_read,
        report.bytes_in,
        report.frames_written,
        report.bytes_out,
        report.elapsed.as_secs_f64()
    );
    if !report.is_lossless() {
        info!(
            "{} chunk(s) dropped from the container: {:?}",
            report.dropped.len(),
            report.dropped_indices()
        );
    }
    Ok(report)
}

/// Open `input`, create `output`, and run [`compress_stream`] between them.
pub fn compress_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<RunReport> {
    config.validate()?;
    let (input, output) = (input.as_ref(), output.as_ref());
    let src = File::open(input).map_err(|e| {
        PipelineError::Read(e).with_context(format!("opening input file {:?}", input))
    })?;
    let dst = File::create(output).map_err(|e| {
        PipelineError::Write(e.into()).with_context(format!("creating output file {:?}", output))
    })?;
    compress_stream(BufReader::new(src), BufWriter::new(dst), codec, config)
}

/// Reader thread: assigns indices and dispatches chunks, one window credit each.
fn read_chunks<R: Read>(
    mut chunks: ChunkReader<R>,
    pool: &WorkerPool<'_>,
    jobs: Sender<RawChunk>,
    credits: Sender<()>,
    events: Sender<Event>,
) {
    loop {
        if pool.is_cancelled() {
            debug!("reader stopping after {} chunks: run cancelled", chunks.chunks_read());
            return;
        }
        // Blocks while the in-flight window is full. Fails once the
        // collector has gone away.
        if credits.send(()).is_err() {
            return;
        }
        match chunks.next() {
            Some(Ok(chunk)) => {
                debug!("read chunk {} ({} bytes)", chunk.index, chunk.data.len());
                if jobs.send(chunk).is_err() {
                    return;
                }
            }
            Some(Err(e)) => {
                let _ = events.send(Event::ReadFailed(e));
                return;
            }
            None => {
                let _ = events.send(Event::Exhausted {
                    total: chunks.chunks_read(),
                    bytes: chunks.bytes_read(),
                });
                return;
            }
        }
    }
}

/// Collector side: order outcomes, write frames, return window credits.
///
/// Returns the number of raw bytes read once every chunk is accounted for.
fn collect_ordered<W: Write>(
    events: &Receiver<Event>,
    credits: &Receiver<()>,
    collector: &mut OrderedCollector,
    writer: &mut FrameWriter<W>,
) -> Result<u64> {
    let mut bytes_in = None;

    while !collector.is_complete() {
        let Ok(event) = events.recv() else {
            // Every sender is gone but chunks are still outstanding.
            return Err(PipelineError::Panicked("pipeline"));
        };

        match event {
            Event::Outcome(outcome) => {
                let before = collector.next_to_emit();
                for chunk in collector.accept(outcome)? {
                    writer
                        .write_frame(chunk.index, &chunk.payload)
                        .map_err(PipelineError::Write)?;
                }
                for _ in before..collector.next_to_emit() {
                    let _ = credits.try_recv();
                }
            }
            Event::Exhausted { total, bytes } => {
                debug!("reader exhausted: {} chunks, {} bytes", total, bytes);
                collector.seal(total)?;
                bytes_in = Some(bytes);
            }
            Event::ReadFailed(e) => return Err(PipelineError::Read(e)),
        }
    }

    Ok(bytes_in.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_machine_parallelism() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.workers >= 1);
        assert_eq!(config.window(), config.workers * DEFAULT_IN_FLIGHT_PER_WORKER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_window_overrides_default() {
        let config = PipelineConfig::default().with_workers(2).with_max_in_flight(3);
        assert_eq!(config.window(), 3);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let base = PipelineConfig::default().with_workers(4);
        assert_eq!(
            base.clone().with_chunk_size(0).validate(),
            Err(ConfigError::ZeroChunkSize)
        );
        assert_eq!(
            base.clone().with_workers(0).validate(),
            Err(ConfigError::ZeroWorkers)
        );
        assert_eq!(
            base.with_max_in_flight(1).validate(),
            Err(ConfigError::WindowTooSmall {
                window: 1,
                workers: 4
            })
        );
    }

    #[test]
    fn report_ratio_handles_empty_output() {
        let report = RunReport {
            codec: "test",
            chunk_size: 1,
            workers: 1,
            chunks_read: 0,
            frames_written: 0,
            bytes_in: 0,
            bytes_out: 0,
            dropped: Vec::new(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.ratio(), 0.0);
        assert!(report.is_lossless());
    }
}
