//! Fault injection for captured streams.

use rand::Rng;

use bcas_proto::ecm::ECM_REQUEST_TAG;

/// Random bytes that can never form or complete a request tag.
///
/// Excludes the tag's first byte, so prepending the result to a stream does
/// not create an anchor the clean stream lacks.
pub fn tag_free_garbage(rng: &mut impl Rng, len: usize) -> Vec<u8> {
    (0..len)
        .map(|_| loop {
            let byte: u8 = rng.r#gen();
            if byte != ECM_REQUEST_TAG[0] {
                break byte;
            }
        })
        .collect()
}

/// Flip bit `bit` of `bytes`, counting from the first byte's LSB.
///
/// Out-of-range bits wrap around.
pub fn flip_bit(bytes: &mut [u8], bit: usize) {
    if bytes.is_empty() {
        return;
    }
    let bit = bit % (bytes.len() * 8);
    bytes[bit / 8] ^= 1 << (bit % 8);
}

/// Remove `len` bytes starting at `at`, as a lossy transport would.
pub fn drop_span(bytes: &mut Vec<u8>, at: usize, len: usize) {
    let start = at.min(bytes.len());
    let end = start.saturating_add(len).min(bytes.len());
    bytes.drain(start..end);
}
