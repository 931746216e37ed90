/// Property tests: output must be a pure function of the input, whatever
/// order the workers finish in.
mod common;

use pbz_codecs::{PassThroughCodec, ZlibCodec};
use pbz_core::{
    compress_stream, ChunkFailure, ChunkOutcome, CodecError, CompressedChunk, OrderedCollector,
    PipelineConfig,
};
use proptest::prelude::*;

use common::*;

fn outcome(index: u64, failed: bool) -> ChunkOutcome {
    if failed {
        ChunkOutcome::Failed(ChunkFailure {
            index,
            raw_len: 1,
            error: CodecError::Primitive("injected".to_string()),
        })
    } else {
        ChunkOutcome::Compressed(CompressedChunk {
            index,
            raw_len: 1,
            payload: index.to_le_bytes().to_vec(),
        })
    }
}

/// A permutation of `0..n` plus a failure flag per index.
fn arrival_order() -> impl Strategy<Value = (Vec<u64>, Vec<bool>)> {
    (1usize..64).prop_flat_map(|n| {
        (
            Just((0..n as u64).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec(prop::bool::weighted(0.2), n),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn collector_emits_each_index_once_in_order((order, failures) in arrival_order()) {
        let total = order.len() as u64;
        let mut collector = OrderedCollector::new();
        let mut emitted = Vec::new();

        for (n, &index) in order.iter().enumerate() {
            if n == order.len() / 2 {
                collector.seal(total).unwrap();
            }
            let ready = collector.accept(outcome(index, failures[index as usize])).unwrap();
            emitted.extend(ready.into_iter().map(|c| c.index));
        }
        if collector.total().is_none() {
            collector.seal(total).unwrap();
        }

        let expected: Vec<u64> = (0..total).filter(|&i| !failures[i as usize]).collect();
        let dropped: Vec<u64> = collector.dropped().iter().map(|d| d.index).collect();
        let expected_dropped: Vec<u64> = (0..total).filter(|&i| failures[i as usize]).collect();

        prop_assert_eq!(emitted, expected);
        prop_assert_eq!(dropped, expected_dropped);
        prop_assert!(collector.is_complete());
        prop_assert_eq!(collector.pending_len(), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn output_is_independent_of_completion_order(
        delays_ms in prop::collection::vec(0u64..4, 1..12),
        workers in 1usize..6,
    ) {
        let chunk_size = 64;
        let data = indexed_chunks(delays_ms.len(), chunk_size);
        let config = PipelineConfig::default()
            .with_chunk_size(chunk_size)
            .with_workers(workers);

        let mut baseline = Vec::new();
        compress_stream(
            data.as_slice(),
            &mut baseline,
            &ZlibCodec::default(),
            &config.clone().with_workers(1),
        )
        .unwrap();

        let jittered = Delayed { inner: ZlibCodec::default(), delays_ms };
        let mut out = Vec::new();
        let report = compress_stream(data.as_slice(), &mut out, &jittered, &config).unwrap();

        prop_assert!(report.is_lossless());
        prop_assert_eq!(out, baseline);
    }

    #[test]
    fn chunks_cover_the_input_exactly(
        len in 0usize..5000,
        chunk_size in 1usize..700,
    ) {
        let data = pseudo_random_bytes(len, len as u64);
        let config = PipelineConfig::default()
            .with_chunk_size(chunk_size)
            .with_workers(3);
        let mut out = Vec::new();
        let report = compress_stream(data.as_slice(), &mut out, &PassThroughCodec, &config).unwrap();

        prop_assert_eq!(report.chunks_read, len.div_ceil(chunk_size) as u64);
        let frames = decode_frames(&out, &PassThroughCodec);
        prop_assert!(frames.iter().all(|f| !f.is_empty() && f.len() <= chunk_size));
        prop_assert_eq!(frames.concat(), data);
    }
}
