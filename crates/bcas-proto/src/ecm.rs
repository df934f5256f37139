//! ECM request and response payload shapes.
//!
//! Only two commands matter to the pseudo card:
//!
//! ```text
//! request  := 90 34 00 00 | data_len(1) | data[data_len] | ...
//! response := 00 15 00 00 | flag(2) | KSo_odd(8) | KSo_even(8) | unknown(3)
//! ```
//!
//! The request `data` is the ECM body the descrambler later presents to the
//! card; the response carries the scramble key pair for it. Everything else
//! on the stream is [`FrameKind::Other`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    Frame,
    errors::{ProtocolError, Result},
};

/// Command tag opening an ECM request payload.
pub const ECM_REQUEST_TAG: [u8; 4] = [0x90, 0x34, 0x00, 0x00];

/// Command tag opening an ECM response payload.
pub const ECM_RESPONSE_TAG: [u8; 4] = [0x00, 0x15, 0x00, 0x00];

/// Payload length of an ECM response (`declared_length = 0x19`).
pub const ECM_RESPONSE_PAYLOAD_LEN: usize = 25;

/// Size of the odd + even scramble key pair.
pub const SCRAMBLE_KEY_SIZE: usize = 16;

const DATA_LEN_INDEX: usize = 4;
const DATA_INDEX: usize = 5;
const FLAG_INDEX: usize = 4;
const KEY_INDEX: usize = 6;
const TRAILER_INDEX: usize = KEY_INDEX + SCRAMBLE_KEY_SIZE;

/// Trailing bytes seen on real captures after the key pair.
pub const DEFAULT_RESPONSE_TRAILER: [u8; 3] = [0x01, 0x90, 0x00];

/// `KSo_odd` followed by `KSo_even`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrambleKey([u8; SCRAMBLE_KEY_SIZE]);

impl ScrambleKey {
    /// Wrap a raw 16-byte key pair.
    pub const fn new(bytes: [u8; SCRAMBLE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Key used for odd-parity scrambled packets.
    pub fn odd(&self) -> &[u8] {
        &self.0[..8]
    }

    /// Key used for even-parity scrambled packets.
    pub fn even(&self) -> &[u8] {
        &self.0[8..]
    }

    /// All 16 bytes.
    pub fn as_bytes(&self) -> &[u8; SCRAMBLE_KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; SCRAMBLE_KEY_SIZE]> for ScrambleKey {
    fn from(bytes: [u8; SCRAMBLE_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

/// ECM request as sent from the receiver to the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcmRequest {
    body: Bytes,
}

impl EcmRequest {
    /// Parse a request payload. `Ok(None)` if the tag does not match.
    pub fn from_payload(payload: &Bytes) -> Result<Option<Self>> {
        if !has_request_tag(payload) {
            return Ok(None);
        }

        let Some(&declared) = payload.get(DATA_LEN_INDEX) else {
            return Err(ProtocolError::TruncatedEcmRequest { declared: 0, available: 0 });
        };
        let declared = declared as usize;
        let available = payload.len() - DATA_INDEX;
        if declared > available {
            return Err(ProtocolError::TruncatedEcmRequest { declared, available });
        }

        Ok(Some(Self { body: payload.slice(DATA_INDEX..DATA_INDEX + declared) }))
    }

    /// Build the payload for a request carrying `body`.
    ///
    /// Appends the trailing `Le = 00` byte real receivers send.
    pub fn encode_payload(body: &[u8]) -> Result<Bytes> {
        let max = Frame::MAX_PAYLOAD_SIZE - DATA_INDEX - 1;
        if body.len() > max {
            return Err(ProtocolError::PayloadTooLarge { size: body.len(), max });
        }

        let mut out = BytesMut::with_capacity(DATA_INDEX + body.len() + 1);
        out.put_slice(&ECM_REQUEST_TAG);
        out.put_u8(body.len() as u8);
        out.put_slice(body);
        out.put_u8(0x00);
        Ok(out.freeze())
    }

    /// ECM body, the lookup key for the matching response.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// ECM response as returned by the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcmResponse {
    flag: u16,
    key: ScrambleKey,
    trailer: [u8; 3],
}

impl EcmResponse {
    /// Build a response with the default trailer.
    pub fn new(flag: u16, key: ScrambleKey) -> Self {
        Self { flag, key, trailer: DEFAULT_RESPONSE_TRAILER }
    }

    /// Parse a response payload. `Ok(None)` if the tag does not match.
    pub fn from_payload(payload: &[u8]) -> Result<Option<Self>> {
        if !payload.starts_with(&ECM_RESPONSE_TAG) {
            return Ok(None);
        }
        if payload.len() != ECM_RESPONSE_PAYLOAD_LEN {
            return Err(ProtocolError::InvalidEcmResponse { len: payload.len() });
        }

        let flag = u16::from_be_bytes([payload[FLAG_INDEX], payload[FLAG_INDEX + 1]]);
        let mut key = [0u8; SCRAMBLE_KEY_SIZE];
        key.copy_from_slice(&payload[KEY_INDEX..TRAILER_INDEX]);
        let mut trailer = [0u8; 3];
        trailer.copy_from_slice(&payload[TRAILER_INDEX..]);

        Ok(Some(Self { flag, key: ScrambleKey(key), trailer }))
    }

    /// Build the 25-byte response payload.
    pub fn encode_payload(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(ECM_RESPONSE_PAYLOAD_LEN);
        out.put_slice(&ECM_RESPONSE_TAG);
        out.put_u16(self.flag);
        out.put_slice(self.key.as_bytes());
        out.put_slice(&self.trailer);
        out.freeze()
    }

    /// Key usage / contract tier indicator.
    ///
    /// `0x0200` payment-deferred PPV, `0x0400` prepaid PPV, `0x0800` tier.
    pub fn flag(&self) -> u16 {
        self.flag
    }

    /// Scramble key pair.
    pub fn key(&self) -> &ScrambleKey {
        &self.key
    }

    /// Unused trailing bytes.
    pub fn trailer(&self) -> [u8; 3] {
        self.trailer
    }
}

/// What a decoded frame carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// ECM request command
    EcmRequest(EcmRequest),
    /// ECM response with key material
    EcmResponse(EcmResponse),
    /// Any other card traffic
    Other,
}

impl FrameKind {
    /// Classify a frame by its payload tag.
    ///
    /// Errors only when the tag matches but the rest of the payload is not
    /// the expected shape.
    pub fn classify(frame: &Frame) -> Result<Self> {
        if let Some(request) = EcmRequest::from_payload(frame.payload())? {
            return Ok(Self::EcmRequest(request));
        }
        if let Some(response) = EcmResponse::from_payload(frame.payload())? {
            return Ok(Self::EcmResponse(response));
        }
        Ok(Self::Other)
    }
}

/// Whether `payload` starts with the ECM request tag.
pub fn has_request_tag(payload: &[u8]) -> bool {
    payload.starts_with(&ECM_REQUEST_TAG)
}
