//! CLI command implementations.

use std::path::{Path, PathBuf};

use anyhow::Result;
use waveprint_core::{
    compare_fingerprints, extract_fingerprint_from_raw_file, extract_fingerprint_from_wav_file,
    Fingerprint, FingerprintProperties,
};

fn extract(path: &Path, wav: bool) -> waveprint_core::Result<Fingerprint> {
    if wav {
        extract_fingerprint_from_wav_file(path)
    } else {
        extract_fingerprint_from_raw_file(path)
    }
}

/// Extract and print one fingerprint per input file.
///
/// A failing input is reported and the remaining inputs are still
/// processed.
pub fn fingerprint(inputs: &[PathBuf], wav: bool, json: bool) -> Result<()> {
    for path in inputs {
        println!("Extracting fingerprint: '{}'", path.display());

        match extract(path, wav) {
            Ok(fp) => print_fingerprint(&fp, json)?,
            Err(err) => eprintln!("Error generating fingerprint: {err}"),
        }
    }

    Ok(())
}

fn print_fingerprint(fp: &Fingerprint, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(fp.data())?);
    } else {
        let bytes: Vec<String> = fp.data().iter().map(|b| b.to_string()).collect();
        println!("Fingerprint: [ {} ]", bytes.join(", "));
    }
    Ok(())
}

/// Compare the fingerprints of two audio files.
pub fn compare(first: &Path, second: &Path, wav: bool, json: bool) -> Result<()> {
    let props = FingerprintProperties::default();

    let fp1 = extract(first, wav)?;
    let fp2 = extract(second, wav)?;

    let result = compare_fingerprints(&fp1, &fp2);
    if result.is_invalid() {
        anyhow::bail!(
            "fingerprints are not comparable ({} vs {} bytes)",
            fp1.len(),
            fp2.len()
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Frame position: {}", result.most_similar_frame_position);
        println!("Score:          {}", result.score);
        println!("Similarity:     {:.4}", result.similarity);
        println!(
            "Start time:     {:.3}s",
            result.most_similar_start_time(&props)
        );
    }

    Ok(())
}
