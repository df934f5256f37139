//! Replay captures through the codec and the card.

use bcas_core::{CorrelatorEvent, Environment, PseudoCard};
use bcas_proto::{DecodedFrame, FrameCodec};
use tracing::trace;

use crate::chunking::ChunkPlan;

/// Decode `bytes` cut up by `plan`, returning the frames and the codec.
pub fn decode_frames(bytes: &[u8], plan: &ChunkPlan) -> (Vec<DecodedFrame>, FrameCodec) {
    let mut codec = FrameCodec::new();
    let mut frames = Vec::new();
    for chunk in plan.split(bytes) {
        frames.extend(codec.push(chunk));
    }
    trace!(frames = frames.len(), buffered = codec.buffered(), "replayed into codec");
    (frames, codec)
}

/// Feed `bytes` cut up by `plan` into `card`.
pub fn feed_card<E: Environment>(
    card: &mut PseudoCard<E>,
    bytes: &[u8],
    plan: &ChunkPlan,
) -> Vec<CorrelatorEvent> {
    plan.split(bytes).into_iter().flat_map(|chunk| card.push(chunk)).collect()
}

#[cfg(test)]
mod tests {
    use bcas_proto::ScrambleKey;

    use super::*;
    use crate::{CaptureBuilder, SimEnv};

    #[test]
    fn replay_matches_capture() {
        let capture = CaptureBuilder::new()
            .exchange(&[7; 20], 0x0400, ScrambleKey::new([1; 16]))
            .status()
            .request(&[8; 20])
            .build()
            .unwrap();

        let (frames, codec) = decode_frames(&capture.bytes, &ChunkPlan::Fixed(5));
        let decoded: Vec<_> = frames.into_iter().map(|d| d.frame).collect();
        assert_eq!(decoded, capture.frames);
        assert_eq!(codec.buffered(), 0);
    }

    #[test]
    fn feed_card_records_exchange() {
        let capture = CaptureBuilder::new()
            .exchange(&[9; 20], 0x0800, ScrambleKey::new([3; 16]))
            .build()
            .unwrap();

        let mut card = PseudoCard::new(SimEnv::new());
        let events = feed_card(&mut card, &capture.bytes, &ChunkPlan::BYTEWISE);

        assert!(matches!(&events[..], [CorrelatorEvent::Recorded { .. }]));
        assert_eq!(card.process_ecm(&[9; 20]).unwrap().return_code, 0x0800);
    }
}
