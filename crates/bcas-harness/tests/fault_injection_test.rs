//! Fault injection tests.
//!
//! Damaged captures (line noise, flipped bits, lost spans) must never yield a
//! wrong key. At worst the affected exchange is lost.

use bcas_core::{CorrelatorEvent, PseudoCard};
use bcas_harness::{
    CaptureBuilder, SimEnv,
    faults::{drop_span, flip_bit, tag_free_garbage},
};
use bcas_proto::ScrambleKey;
use bytes::Bytes;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const BODY_A: [u8; 20] = [0x41; 20];
const BODY_B: [u8; 20] = [0x42; 20];

/// Request frame size for a 20-byte body.
const REQUEST_LEN: usize = 30;
/// Response frame size.
const RESPONSE_LEN: usize = 29;

fn two_exchanges() -> Vec<u8> {
    CaptureBuilder::new()
        .exchange(&BODY_A, 0x0400, ScrambleKey::new([0x50; 16]))
        .exchange(&BODY_B, 0x0800, ScrambleKey::new([0x60; 16]))
        .build()
        .unwrap()
        .bytes
}

#[test]
fn line_noise_before_capture_is_skipped() {
    let mut rng = ChaCha8Rng::seed_from_u64(12345);
    let mut bytes = tag_free_garbage(&mut rng, 300);
    bytes.extend(two_exchanges());

    let mut card = PseudoCard::new(SimEnv::new());
    card.push(&bytes);

    assert_eq!(card.codec_stats().discarded, 300);
    assert_eq!(card.codec_stats().syncs, 1);
    assert_eq!(card.process_ecm(&BODY_A).unwrap().return_code, 0x0400);
    assert_eq!(card.process_ecm(&BODY_B).unwrap().return_code, 0x0800);
}

#[test]
fn flipped_response_bit_loses_only_that_exchange() {
    let mut bytes = two_exchanges();
    // First key byte of the first response.
    let key_offset = REQUEST_LEN + 3 + 6;
    flip_bit(&mut bytes, key_offset * 8);

    let mut card = PseudoCard::new(SimEnv::new());
    let split = REQUEST_LEN + RESPONSE_LEN;
    assert!(card.push(&bytes[..split]).is_empty());

    // The request stays pending until the stream resynchronises.
    let pending = card.correlator().pending().map(|p| p.body().clone());
    assert_eq!(pending, Some(Bytes::copy_from_slice(&BODY_A)));

    let events = card.push(&bytes[split..]);
    assert_eq!(
        events[0],
        CorrelatorEvent::PendingDiscarded { body: Bytes::copy_from_slice(&BODY_A) }
    );
    assert!(matches!(events[1], CorrelatorEvent::Recorded { .. }));

    let stats = card.codec_stats();
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.syncs, 2);
    assert_eq!(stats.discarded, RESPONSE_LEN as u64);

    assert!(card.process_ecm(&BODY_A).is_err());
    assert_eq!(card.process_ecm(&BODY_B).unwrap().key, ScrambleKey::new([0x60; 16]));
}

#[test]
fn lost_response_supersedes_its_request() {
    let mut bytes = two_exchanges();
    drop_span(&mut bytes, REQUEST_LEN, RESPONSE_LEN);

    let mut card = PseudoCard::new(SimEnv::new());
    let events = card.push(&bytes);

    assert!(matches!(events[0], CorrelatorEvent::RequestSuperseded { frames: 1, .. }));
    assert_eq!(card.history().len(), 1);
    assert!(card.process_ecm(&BODY_A).is_err());
    assert!(card.process_ecm(&BODY_B).is_ok());
}

#[test]
fn session_marker_does_not_affect_matching() {
    let bytes = CaptureBuilder::new()
        .marker(0x0000)
        .exchange(&BODY_A, 0x0200, ScrambleKey::new([0x70; 16]))
        .build()
        .unwrap()
        .bytes;

    let mut card = PseudoCard::new(SimEnv::new());
    card.push(&bytes);

    let latest = card.history().latest().map(|record| record.flag());
    assert_eq!(latest, Some(0x0200));
    assert_eq!(card.process_ecm(&BODY_A).unwrap().return_code, 0x0200);
}
