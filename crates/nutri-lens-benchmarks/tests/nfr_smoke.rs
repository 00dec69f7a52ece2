//! Benchmark smoke test for the deterministic frame/encode/fingerprint loop.

use std::time::Instant;

use nutri_lens_core::PhotoFrame;
use nutri_lens_photo::encode_still;
use nutri_lens_upload::image_fingerprint;

#[test]
fn benchmark_pipeline_smoke_prints_latency() {
    let frame = PhotoFrame::new(64, 64, vec![130; 64 * 64 * 4]).expect("frame should be valid");

    let start = Instant::now();
    let mut fingerprint_lengths = 0usize;

    for _ in 0..100 {
        let photo = encode_still(&frame).expect("still should encode");
        fingerprint_lengths += image_fingerprint(&photo.data_url.to_string()).len();
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_pipeline_elapsed_ms={elapsed_ms}");
    println!("benchmark_fingerprint_total_len={fingerprint_lengths}");

    // This is a lightweight guardrail; strict NFR checks are environment-specific.
    assert!(
        elapsed_ms < 5_000,
        "pipeline smoke benchmark should stay bounded"
    );
}
