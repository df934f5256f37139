#![no_main]

use bcas_proto::{Frame, FrameKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((frame, consumed)) = Frame::decode(data) {
        assert_eq!(consumed, frame.encoded_len());
        assert_eq!(frame.to_vec(), &data[..consumed]);
        let _ = FrameKind::classify(&frame);
    }
});
