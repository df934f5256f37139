//! Property tests for framing and resynchronisation.

use bcas_proto::{EcmRequest, Frame, FrameCodec, FrameHeader};
use proptest::prelude::*;

/// Bytes that can never take part in a request tag, even after one bit flip.
fn filler() -> impl Strategy<Value = u8> {
    0x40u8..=0x7f
}

fn request(body: &[u8]) -> Frame {
    let payload = EcmRequest::encode_payload(body).unwrap();
    Frame::new(FrameHeader::DEFAULT_MARKER, payload).unwrap()
}

fn arb_request() -> impl Strategy<Value = Frame> {
    prop::collection::vec(filler(), 17..=64).prop_map(|body| request(&body))
}

fn arb_other() -> impl Strategy<Value = Frame> {
    prop::collection::vec(filler(), 1..=64)
        .prop_map(|payload| Frame::new(FrameHeader::DEFAULT_MARKER, payload).unwrap())
}

fn arb_stream() -> impl Strategy<Value = Vec<Frame>> {
    (
        arb_request(),
        prop::collection::vec(prop_oneof![arb_request(), arb_other()], 0..8),
        arb_request(),
    )
        .prop_map(|(first, middle, last)| {
            let mut frames = vec![first];
            frames.extend(middle);
            frames.push(last);
            frames
        })
}

fn encode(frames: &[Frame]) -> Vec<u8> {
    frames.iter().flat_map(Frame::to_vec).collect()
}

fn decode_all(codec: &mut FrameCodec, bytes: &[u8]) -> Vec<Frame> {
    codec.push(bytes).map(|decoded| decoded.frame).collect()
}

proptest! {
    #[test]
    fn any_frame_round_trips_between_anchors(
        marker in any::<u16>(),
        payload in prop::collection::vec(any::<u8>(), 1..=255),
        lead in arb_request(),
        tail in arb_request(),
    ) {
        let frame = Frame::new(marker, payload.clone()).unwrap();
        let frames = vec![lead, frame, tail];

        let mut codec = FrameCodec::new();
        let decoded = decode_all(&mut codec, &encode(&frames));

        prop_assert_eq!(&decoded, &frames);
        prop_assert_eq!(decoded[1].marker(), marker);
        prop_assert_eq!(decoded[1].payload().as_ref(), payload.as_slice());
        prop_assert_eq!(codec.buffered(), 0);
    }

    #[test]
    fn leading_garbage_is_discarded_exactly(
        garbage in prop::collection::vec(
            any::<u8>().prop_filter("no tag start", |b| *b != 0x90),
            0..300,
        ),
        frames in arb_stream(),
    ) {
        let clean = encode(&frames);
        let mut dirty = garbage.clone();
        dirty.extend_from_slice(&clean);

        let mut codec = FrameCodec::new();
        let decoded = decode_all(&mut codec, &dirty);

        prop_assert_eq!(decoded, frames);
        prop_assert_eq!(codec.stats().discarded, garbage.len() as u64);
        prop_assert_eq!(codec.buffered(), 0);
    }

    #[test]
    fn flipped_payload_bit_rejects_frame_and_resyncs(
        lead in arb_request(),
        broken in arb_request(),
        middle in prop::collection::vec(arb_other(), 0..4),
        after in prop::collection::vec(arb_request(), 1..4),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut damaged = broken.to_vec();
        let at = FrameHeader::SIZE + index.index(broken.payload().len());
        damaged[at] ^= 1 << bit;

        let mut bytes = lead.to_vec();
        bytes.extend(damaged);
        bytes.extend(encode(&middle));
        bytes.extend(encode(&after));

        let mut codec = FrameCodec::new();
        let decoded: Vec<_> = codec.push(&bytes).collect();

        prop_assert_eq!(codec.stats().malformed, 1);
        prop_assert_eq!(codec.stats().syncs, 2);
        prop_assert!(decoded[1].first_after_sync);

        let mut expected = vec![lead];
        expected.extend(after);
        let frames: Vec<Frame> = decoded.into_iter().map(|d| d.frame).collect();
        prop_assert_eq!(frames, expected);
    }

    #[test]
    fn chunking_does_not_change_output(
        frames in arb_stream(),
        noise in prop::collection::vec(
            (any::<prop::sample::Index>(), prop::collection::vec(any::<u8>(), 1..16)),
            0..4,
        ),
        cuts in prop::collection::vec(1usize..48, 1..64),
    ) {
        let mut bytes = encode(&frames);
        for (at, junk) in noise {
            let tail = bytes.split_off(at.index(bytes.len() + 1));
            bytes.extend(junk);
            bytes.extend(tail);
        }

        let mut whole = FrameCodec::new();
        let expected: Vec<_> = whole.push(&bytes).collect();

        let mut single = FrameCodec::new();
        let mut by_byte = Vec::new();
        for byte in &bytes {
            by_byte.extend(single.push(std::slice::from_ref(byte)));
        }

        let mut chunked = FrameCodec::new();
        let mut by_chunk = Vec::new();
        let mut rest = bytes.as_slice();
        for cut in cuts.iter().cycle() {
            if rest.is_empty() {
                break;
            }
            let (head, tail) = rest.split_at((*cut).min(rest.len()));
            by_chunk.extend(chunked.push(head));
            rest = tail;
        }

        prop_assert_eq!(&by_byte, &expected);
        prop_assert_eq!(&by_chunk, &expected);
        prop_assert_eq!(single.stats(), whole.stats());
        prop_assert_eq!(chunked.buffered(), whole.buffered());
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let mut codec = FrameCodec::new();
        for frame in codec.push(&bytes) {
            prop_assert!(frame.frame.encoded_len() > FrameHeader::SIZE);
        }
        prop_assert!(codec.buffered() <= bytes.len());
    }
}
