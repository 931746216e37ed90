use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use pbz_codecs::codec_by_name;
use pbz_core::{
    compress_file, Codec, FrameReader, PipelineConfig, RunReport, DEFAULT_CHUNK_SIZE,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "pbz",
    about = "Parallel block compressor: splits a file into chunks, compresses them concurrently, \
             and writes length-prefixed frames in input order",
    version
)]
struct Cli {
    /// Source file to compress
    input: PathBuf,
    /// Destination container file
    output: PathBuf,
    /// Codec to use: zlib | zstd | lz4 | passthrough
    #[arg(short, long, default_value = "zlib")]
    codec: String,
    /// Codec level (zlib 0–9, zstd 1–22); defaults to the codec's own default
    #[arg(short, long)]
    level: Option<i32>,
    /// Raw bytes per chunk (supports suffixes K/M/G, e.g. 64K, 1M)
    #[arg(short = 's', long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_size)]
    chunk_size: usize,
    /// Number of compression workers (defaults to CPU count)
    #[arg(short, long, default_value_t = num_workers_default())]
    workers: usize,
    /// Maximum chunks read but not yet written (defaults to 4 × workers)
    #[arg(long)]
    max_in_flight: Option<usize>,
    /// Re-read the container and check it decompresses to the input
    #[arg(long)]
    verify: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn num_workers_default() -> usize {
    PipelineConfig::default().workers
}

fn parse_size(value: &str) -> Result<usize, String> {
    let trimmed = value.trim();
    let split_at = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (num_part, suffix_part) = trimmed.split_at(split_at);
    if num_part.is_empty() {
        return Err(format!("invalid size: {value:?}"));
    }
    let base: usize = num_part
        .parse()
        .map_err(|_| format!("invalid size number: {value}"))?;
    let multiplier = match suffix_part.to_ascii_lowercase().as_str() {
        "" | "b" => 1usize,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        other => return Err(format!("invalid size suffix '{other}' in '{value}'")),
    };
    base.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: {value}"))
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG still wins when set.
    builder.parse_default_env();
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });
    let _ = builder.try_init();
}

fn print_report(report: &RunReport) {
    eprintln!("  codec       : {}", report.codec);
    eprintln!("  chunk size  : {}", human_bytes(report.chunk_size as u64));
    eprintln!("  workers     : {}", report.workers);
    eprintln!("  chunks      : {}", report.chunks_read);
    eprintln!("  frames      : {}", report.frames_written);
    eprintln!("  raw size    : {}", human_bytes(report.bytes_in));
    eprintln!("  compressed  : {}", human_bytes(report.bytes_out));
    eprintln!("  ratio       : {:.2}x", report.ratio());
    let secs = report.elapsed.as_secs_f64();
    if secs > 0.0 {
        eprintln!(
            "  throughput  : {}/s",
            human_bytes((report.bytes_in as f64 / secs) as u64)
        );
    }
    eprintln!("  elapsed     : {:.3}s", secs);
}

/// One stderr line per chunk left out of the container. The container has no
/// index field, so this is the only place a consumer learns about gaps.
fn dropped_warnings(report: &RunReport) -> Vec<String> {
    report
        .dropped
        .iter()
        .map(|dropped| {
            format!(
                "warning: chunk {} ({} bytes) was dropped from the output: {}",
                dropped.index, dropped.raw_len, dropped.reason
            )
        })
        .collect()
}

/// Decode every frame of `output` and compare against `input`, skipping the
/// raw ranges of dropped chunks.
fn verify(input: &Path, output: &Path, codec: &dyn Codec, report: &RunReport) -> anyhow::Result<()> {
    let original =
        std::fs::read(input).with_context(|| format!("re-reading input file {:?}", input))?;
    let container =
        File::open(output).with_context(|| format!("opening output file {:?}", output))?;

    let dropped = report.dropped_indices();
    let mut expected = original
        .chunks(report.chunk_size)
        .enumerate()
        .filter(|(i, _)| !dropped.contains(&(*i as u64)))
        .map(|(_, raw)| raw);

    for (n, frame) in FrameReader::new(BufReader::new(container)).enumerate() {
        let payload = frame.with_context(|| format!("reading frame {}", n))?;
        let raw = codec
            .decompress(&payload)
            .with_context(|| format!("decompressing frame {}", n))?;
        match expected.next() {
            Some(want) if want == raw.as_slice() => {}
            Some(_) => anyhow::bail!("frame {} does not match the input", n),
            None => anyhow::bail!("container holds more frames than expected"),
        }
    }
    if expected.next().is_some() {
        anyhow::bail!("container holds fewer frames than expected");
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn run(cli: Cli) -> anyhow::Result<()> {
    let codec = codec_by_name(&cli.codec, cli.level)?;
    let mut config = PipelineConfig::default()
        .with_chunk_size(cli.chunk_size)
        .with_workers(cli.workers);
    if let Some(window) = cli.max_in_flight {
        config = config.with_max_in_flight(window);
    }

    let report = compress_file(&cli.input, &cli.output, codec.as_ref(), &config)
        .with_context(|| format!("compressing {:?} into {:?}", cli.input, cli.output))?;

    for line in dropped_warnings(&report) {
        eprintln!("{}", line);
    }
    print_report(&report);

    if cli.verify {
        verify(&cli.input, &cli.output, codec.as_ref(), &report)?;
        eprintln!("  verified    : ok");
    }

    println!(
        "Compression complete. {} chunks processed.",
        report.chunks_read
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
