//! Synthetic card captures.

use bcas_proto::{
    EcmRequest, EcmResponse, Frame, FrameHeader, ProtocolError, ScrambleKey,
};

/// 11-byte status command seen between ECM exchanges on real captures.
pub const STATUS_FRAME: [u8; 11] =
    [0x00, 0x00, 0x07, 0x90, 0x80, 0x00, 0x00, 0x01, 0x00, 0x00, 0x16];

/// Encoded stream plus the frames a clean decode must yield.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    /// Wire bytes
    pub bytes: Vec<u8>,
    /// Valid frames in stream order
    pub frames: Vec<Frame>,
}

/// Declarative capture builder.
///
/// ```
/// use bcas_harness::CaptureBuilder;
/// use bcas_proto::ScrambleKey;
///
/// let capture = CaptureBuilder::new()
///     .exchange(&[0x11; 20], 0x0800, ScrambleKey::new([0xaa; 16]))
///     .status()
///     .build()
///     .unwrap();
/// assert_eq!(capture.frames.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureBuilder {
    marker: u16,
    capture: Capture,
    error: Option<ProtocolError>,
}

impl CaptureBuilder {
    /// Empty capture using the default marker.
    pub fn new() -> Self {
        Self { marker: FrameHeader::DEFAULT_MARKER, capture: Capture::default(), error: None }
    }

    /// Marker for subsequent ECM frames.
    pub fn marker(mut self, marker: u16) -> Self {
        self.marker = marker;
        self
    }

    /// Append an already built frame.
    pub fn frame(mut self, frame: Frame) -> Self {
        frame.encode(&mut self.capture.bytes);
        self.capture.frames.push(frame);
        self
    }

    /// Append an ECM request carrying `body`.
    pub fn request(self, body: &[u8]) -> Self {
        let marker = self.marker;
        self.try_frame(|| Frame::new(marker, EcmRequest::encode_payload(body)?))
    }

    /// Append an ECM response.
    pub fn response(self, flag: u16, key: ScrambleKey) -> Self {
        let marker = self.marker;
        self.try_frame(|| Frame::new(marker, EcmResponse::new(flag, key).encode_payload()))
    }

    /// Append a request immediately answered by a response.
    pub fn exchange(self, body: &[u8], flag: u16, key: ScrambleKey) -> Self {
        self.request(body).response(flag, key)
    }

    /// Append the status command frame.
    pub fn status(self) -> Self {
        self.try_frame(|| Frame::decode(&STATUS_FRAME).map(|(frame, _)| frame))
    }

    /// Append bytes that are not part of any frame.
    pub fn garbage(mut self, bytes: &[u8]) -> Self {
        self.capture.bytes.extend_from_slice(bytes);
        self
    }

    /// Append an ECM request with one bit of its body flipped.
    ///
    /// The codec must reject it, so it is not listed in [`Capture::frames`].
    pub fn corrupt_request(mut self, body: &[u8], bit: usize) -> Self {
        let built = EcmRequest::encode_payload(body).and_then(|p| Frame::new(self.marker, p));
        match built {
            Ok(frame) if !body.is_empty() => {
                let mut bytes = frame.to_vec();
                let body_start = FrameHeader::SIZE + 5;
                let bit = bit % (body.len() * 8);
                bytes[body_start + bit / 8] ^= 1 << (bit % 8);
                self.capture.bytes.extend_from_slice(&bytes);
            },
            Ok(_) => {},
            Err(error) => self.error = self.error.take().or(Some(error)),
        }
        self
    }

    fn try_frame(self, build: impl FnOnce() -> Result<Frame, ProtocolError>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match build() {
            Ok(frame) => self.frame(frame),
            Err(error) => Self { error: Some(error), ..self },
        }
    }

    /// Finish, failing if any frame could not be encoded.
    pub fn build(self) -> Result<Capture, ProtocolError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.capture),
        }
    }
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
