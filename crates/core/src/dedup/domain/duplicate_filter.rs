use super::fingerprinter::Fingerprint;

/// Positions of frames that look like their immediate predecessor.
///
/// Each fingerprint is compared with the one directly before it in capture
/// order, never with the last kept frame. Position 0 is never returned.
/// Pairs whose distance is below `threshold` mark the later frame.
pub fn find_duplicates(fingerprints: &[Fingerprint], threshold: u32) -> Vec<usize> {
    fingerprints
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].distance(&pair[1]) < threshold)
        .map(|(i, _)| i + 1)
        .collect()
}
