#![no_main]

use arbitrary::Arbitrary;
use bcas_proto::FrameCodec;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    stream: Vec<u8>,
    cuts: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut whole = FrameCodec::new();
    let expected: Vec<_> = whole.push(&input.stream).collect();

    // Any chunking of the same bytes must decode identically.
    let mut chunked = FrameCodec::new();
    let mut actual = Vec::new();
    let mut rest = input.stream.as_slice();
    let mut cuts = input.cuts.iter().map(|c| usize::from(*c).max(1)).cycle();
    while !rest.is_empty() {
        let take = cuts.next().unwrap_or(rest.len()).min(rest.len());
        let (head, tail) = rest.split_at(take);
        actual.extend(chunked.push(head));
        rest = tail;
    }

    assert_eq!(actual, expected);
    assert_eq!(chunked.buffered(), whole.buffered());
    assert_eq!(chunked.stats(), whole.stats());
});
