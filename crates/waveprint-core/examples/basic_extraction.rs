//! Basic fingerprint extraction and comparison example.
//!
//! Run with: cargo run --example basic_extraction

use waveprint_core::{compare_fingerprints, extract_fingerprint, FingerprintProperties};

fn main() -> waveprint_core::Result<()> {
    let props = FingerprintProperties::default();

    // three seconds of a 440 Hz tone
    let samples: Vec<i16> = (0..props.sample_rate * 3)
        .map(|i| {
            let t = i as f32 / props.sample_rate as f32;
            ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 16384.0) as i16
        })
        .collect();

    let fingerprint = extract_fingerprint(&samples)?;
    println!(
        "Extracted {} fingerprint bytes ({} frames)",
        fingerprint.len(),
        fingerprint.frame_count(&props)
    );

    let result = compare_fingerprints(&fingerprint, &fingerprint);
    println!(
        "Self comparison: position {}, score {}, similarity {}",
        result.most_similar_frame_position, result.score, result.similarity
    );

    Ok(())
}
