//! Frame encoding and decoding for the touchIt protocol.
//!
//! Request frame (host to device):
//! - MARKER (1 byte): `'#'`
//! - OPCODE (1 byte): command code
//! - LENGTH (1 byte): payload length (0 or 1)
//! - PAYLOAD (0-1 bytes)
//! - CHECKSUM (1 byte): XOR of every preceding byte, marker included
//!
//! Reply frame (device to host) has the same layout, opens with `'$'`, and carries
//! up to 4 payload bytes. The opcode and length fields of a reply are echoes the
//! host never checks.

use heapless::Vec;

use crate::constants::{
    FRAME_OVERHEAD, MAX_BLOCK_LEN, MAX_REQUEST_LEN, MAX_REQUEST_PAYLOAD, MAX_RESPONSE_LEN,
    MAX_RESPONSE_PAYLOAD, REQUEST_MARKER, RESPONSE_MARKER,
};
use crate::error::{FrameError, InvalidArgument};

/// Command codes understood by the device.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    GetVersion = 0x00,
    SetConfig = 0x01,
    SetAddress = 0x02,
    GetPosition = 0x03,
    GetTouch = 0x04,
}

impl Opcode {
    /// Number of payload bytes the request carries.
    pub const fn request_len(self) -> usize {
        match self {
            Opcode::SetConfig | Opcode::SetAddress => 1,
            Opcode::GetVersion | Opcode::GetPosition | Opcode::GetTouch => 0,
        }
    }

    /// Number of payload bytes in the reply, or `None` when the device does not reply.
    pub const fn response_len(self) -> Option<usize> {
        match self {
            Opcode::GetVersion => Some(2),
            Opcode::SetConfig => Some(1),
            Opcode::SetAddress => None,
            Opcode::GetPosition => Some(4),
            Opcode::GetTouch => Some(1),
        }
    }

    /// Whether the device needs the settle delay between the write and the read.
    ///
    /// Position and touch queries are issued back to back from the polling loop
    /// without it.
    pub const fn settles(self) -> bool {
        matches!(
            self,
            Opcode::GetVersion | Opcode::SetConfig | Opcode::SetAddress
        )
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Opcode::GetVersion),
            0x01 => Ok(Opcode::SetConfig),
            0x02 => Ok(Opcode::SetAddress),
            0x03 => Ok(Opcode::GetPosition),
            0x04 => Ok(Opcode::GetTouch),
            _ => Err(InvalidArgument),
        }
    }
}

// Frame buffers must hold the overhead plus the largest payload of their kind.
const _: () = assert!(MAX_REQUEST_LEN >= FRAME_OVERHEAD + MAX_REQUEST_PAYLOAD);
const _: () = assert!(MAX_BLOCK_LEN >= FRAME_OVERHEAD - 1 + MAX_REQUEST_PAYLOAD);
const _: () = assert!(MAX_RESPONSE_LEN >= FRAME_OVERHEAD + MAX_RESPONSE_PAYLOAD);

/// Concatenate `parts` into a bounded frame buffer.
///
/// Callers pass at most the frame overhead plus a capacity-bounded payload, which the
/// assertions above keep within `N`.
fn assemble<const N: usize>(parts: &[&[u8]]) -> Vec<u8, N> {
    let mut bytes = Vec::new();
    for part in parts {
        let pushed = bytes.extend_from_slice(part);
        debug_assert!(pushed.is_ok(), "frame exceeds buffer capacity");
    }
    bytes
}

/// XOR of every byte in `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// A command frame sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub opcode: Opcode,
    pub payload: Vec<u8, MAX_REQUEST_PAYLOAD>,
}

impl RequestFrame {
    /// Create a request, rejecting a payload of the wrong arity for `opcode`.
    pub fn new(opcode: Opcode, payload: &[u8]) -> Result<Self, InvalidArgument> {
        if payload.len() != opcode.request_len() {
            return Err(InvalidArgument);
        }

        let payload = Vec::from_slice(payload).map_err(|_| InvalidArgument)?;
        Ok(Self { opcode, payload })
    }

    /// The length field: number of payload bytes.
    pub fn length(&self) -> u8 {
        self.payload.len() as u8
    }

    /// XOR of marker, opcode, length and payload.
    pub fn checksum(&self) -> u8 {
        REQUEST_MARKER ^ u8::from(self.opcode) ^ self.length() ^ checksum(&self.payload)
    }

    /// The full frame, marker first.
    pub fn to_bytes(&self) -> Vec<u8, MAX_REQUEST_LEN> {
        assemble(&[&[REQUEST_MARKER], &self.block()])
    }

    /// The frame split for the bus: the marker as the register byte, the rest as the block.
    pub fn to_wire(&self) -> (u8, Vec<u8, MAX_BLOCK_LEN>) {
        (REQUEST_MARKER, self.block())
    }

    fn block(&self) -> Vec<u8, MAX_BLOCK_LEN> {
        assemble(&[
            &[u8::from(self.opcode), self.length()],
            &self.payload,
            &[self.checksum()],
        ])
    }
}

/// Encode a request as `[marker, opcode, length, payload..., checksum]`.
pub fn encode_request(
    opcode: Opcode,
    payload: &[u8],
) -> Result<Vec<u8, MAX_REQUEST_LEN>, InvalidArgument> {
    Ok(RequestFrame::new(opcode, payload)?.to_bytes())
}

/// Encode a request as `(register byte, data block)` for the bus transport.
pub fn encode_wire_request(
    opcode: Opcode,
    payload: &[u8],
) -> Result<(u8, Vec<u8, MAX_BLOCK_LEN>), InvalidArgument> {
    Ok(RequestFrame::new(opcode, payload)?.to_wire())
}

/// A reply frame received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub opcode_echo: u8,
    pub length_echo: u8,
    pub payload: Vec<u8, MAX_RESPONSE_PAYLOAD>,
    pub checksum: u8,
}

impl ResponseFrame {
    /// Build a well-formed reply, the way the device would.
    pub fn new(opcode_echo: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload: Vec<u8, MAX_RESPONSE_PAYLOAD> =
            Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        let length_echo = payload.len() as u8;
        let checksum = RESPONSE_MARKER ^ opcode_echo ^ length_echo ^ checksum(&payload);

        Ok(Self {
            opcode_echo,
            length_echo,
            payload,
            checksum,
        })
    }

    /// The full frame, marker first.
    pub fn to_bytes(&self) -> Vec<u8, MAX_RESPONSE_LEN> {
        assemble(&[
            &[RESPONSE_MARKER, self.opcode_echo, self.length_echo],
            &self.payload,
            &[self.checksum],
        ])
    }
}

/// Decode and validate a reply carrying `expected_payload_len` payload bytes.
///
/// Checks run in order: marker, length, checksum.
pub fn decode_response(
    bytes: &[u8],
    expected_payload_len: usize,
) -> Result<ResponseFrame, FrameError> {
    if expected_payload_len > MAX_RESPONSE_PAYLOAD {
        return Err(FrameError::PayloadTooLarge);
    }

    match bytes.first() {
        None => return Err(FrameError::LengthMismatch),
        Some(&b) if b != RESPONSE_MARKER => return Err(FrameError::BadMarker),
        Some(_) => {}
    }

    if bytes.len() != FRAME_OVERHEAD + expected_payload_len {
        return Err(FrameError::LengthMismatch);
    }

    let (body, trailer) = bytes.split_at(bytes.len() - 1);
    if checksum(body) != trailer[0] {
        return Err(FrameError::ChecksumMismatch);
    }

    let payload =
        Vec::from_slice(&body[3..]).map_err(|_| FrameError::PayloadTooLarge)?;

    Ok(ResponseFrame {
        opcode_echo: body[1],
        length_echo: body[2],
        payload,
        checksum: trailer[0],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPCODES: [Opcode; 5] = [
        Opcode::GetVersion,
        Opcode::SetConfig,
        Opcode::SetAddress,
        Opcode::GetPosition,
        Opcode::GetTouch,
    ];

    #[test]
    fn test_encode_get_version() {
        let bytes = encode_request(Opcode::GetVersion, &[]).unwrap();
        assert_eq!(&bytes[..], &[b'#', 0x00, 0x00, b'#']);
    }

    #[test]
    fn test_encode_set_config() {
        let bytes = encode_request(Opcode::SetConfig, &[0x03]).unwrap();
        // 0x23 ^ 0x01 ^ 0x01 ^ 0x03
        assert_eq!(&bytes[..], &[0x23, 0x01, 0x01, 0x03, 0x20]);
    }

    #[test]
    fn test_encode_wire_set_address() {
        let (register, block) = encode_wire_request(Opcode::SetAddress, &[0x72]).unwrap();
        assert_eq!(register, b'#');
        assert_eq!(&block[..], &[0x02, 0x01, 0x72, 0x52]);
    }

    #[test]
    fn test_encode_wire_get_position() {
        let (register, block) = encode_wire_request(Opcode::GetPosition, &[]).unwrap();
        assert_eq!(register, b'#');
        assert_eq!(&block[..], &[0x03, 0x00, 0x20]);
    }

    #[test]
    fn test_request_checksum_covers_marker() {
        for opcode in ALL_OPCODES {
            let payload: &[u8] = if opcode.request_len() == 1 { &[0x5A] } else { &[] };
            let bytes = encode_request(opcode, payload).unwrap();
            let (body, trailer) = bytes.split_at(bytes.len() - 1);
            assert_eq!(checksum(body), trailer[0]);
            assert_eq!(bytes[2] as usize, payload.len());
        }
    }

    #[test]
    fn test_encode_rejects_wrong_arity() {
        assert_eq!(encode_request(Opcode::GetVersion, &[0x01]), Err(InvalidArgument));
        assert_eq!(encode_request(Opcode::SetConfig, &[]), Err(InvalidArgument));
        assert_eq!(
            encode_wire_request(Opcode::SetAddress, &[0x01, 0x02]),
            Err(InvalidArgument)
        );
    }

    #[test]
    fn test_opcode_from_u8() {
        for opcode in ALL_OPCODES {
            assert_eq!(Opcode::try_from(u8::from(opcode)), Ok(opcode));
        }
        assert_eq!(Opcode::try_from(0x05), Err(InvalidArgument));
    }

    #[test]
    fn test_decode_position_reply() {
        let bytes = [0x24, 0x03, 0x04, 0x01, 0x2C, 0x00, 0x50, 0x5E];
        let frame = decode_response(&bytes, 4).unwrap();
        assert_eq!(frame.opcode_echo, 0x03);
        assert_eq!(frame.length_echo, 0x04);
        assert_eq!(&frame.payload[..], &[0x01, 0x2C, 0x00, 0x50]);
        assert_eq!(frame.checksum, 0x5E);
    }

    #[test]
    fn test_decode_accepts_synthetic_replies() {
        for opcode in ALL_OPCODES {
            let Some(len) = opcode.response_len() else {
                continue;
            };
            let payload = [0xA5u8, 0x00, 0xFF, 0x7E];
            let reply = ResponseFrame::new(opcode.into(), &payload[..len]).unwrap();
            let decoded = decode_response(&reply.to_bytes(), len).unwrap();
            assert_eq!(&decoded.payload[..], &payload[..len]);
        }
    }

    #[test]
    fn test_single_bit_flip_fails_checksum() {
        let bytes = ResponseFrame::new(0x03, &[0x01, 0x2C, 0x00, 0x50])
            .unwrap()
            .to_bytes();

        for index in 1..bytes.len() {
            for bit in 0..8 {
                let mut corrupted = bytes.clone();
                corrupted[index] ^= 1 << bit;
                assert_eq!(
                    decode_response(&corrupted, 4),
                    Err(FrameError::ChecksumMismatch),
                    "byte {} bit {}",
                    index,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_bad_marker_wins_over_valid_checksum() {
        // Checksum recomputed for the wrong marker, still rejected.
        let mut bytes = [b'#', 0x00, 0x02, 0x02, 0x05, 0x00];
        bytes[5] = checksum(&bytes[..5]);
        assert_eq!(decode_response(&bytes, 2), Err(FrameError::BadMarker));

        for bit in 0..8 {
            let mut corrupted = ResponseFrame::new(0x00, &[0x02, 0x05]).unwrap().to_bytes();
            corrupted[0] ^= 1 << bit;
            assert_eq!(decode_response(&corrupted, 2), Err(FrameError::BadMarker));
        }
    }

    #[test]
    fn test_length_checked_before_checksum() {
        let bytes = ResponseFrame::new(0x00, &[0x02, 0x05]).unwrap().to_bytes();

        // Shorter, with a garbage trailer.
        assert_eq!(decode_response(&bytes[..4], 2), Err(FrameError::LengthMismatch));

        // Longer, with a trailing byte that breaks the checksum.
        let mut longer = bytes.clone();
        longer.push(0xFF).unwrap();
        assert_eq!(decode_response(&longer, 2), Err(FrameError::LengthMismatch));

        assert_eq!(decode_response(&[], 2), Err(FrameError::LengthMismatch));
    }

    #[test]
    fn test_decode_rejects_oversized_expectation() {
        let bytes = [0u8; 16];
        assert_eq!(
            decode_response(&bytes, MAX_RESPONSE_PAYLOAD + 1),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_largest_frames_keep_every_byte() {
        let payload = [0x11u8; MAX_RESPONSE_PAYLOAD];
        let bytes = ResponseFrame::new(0x03, &payload).unwrap().to_bytes();
        assert_eq!(bytes.len(), FRAME_OVERHEAD + MAX_RESPONSE_PAYLOAD);
        assert_eq!(&bytes[3..3 + MAX_RESPONSE_PAYLOAD], &payload[..]);
        assert_eq!(
            decode_response(&bytes, MAX_RESPONSE_PAYLOAD).map(|f| f.payload.len()),
            Ok(MAX_RESPONSE_PAYLOAD)
        );

        let request = encode_request(Opcode::SetConfig, &[0x0F]).unwrap();
        assert_eq!(request.len(), FRAME_OVERHEAD + MAX_REQUEST_PAYLOAD);
        let (_, block) = encode_wire_request(Opcode::SetConfig, &[0x0F]).unwrap();
        assert_eq!(block.len(), MAX_BLOCK_LEN);
    }

    #[test]
    fn test_echo_fields_not_validated() {
        let reply = ResponseFrame {
            opcode_echo: 0x7F,
            length_echo: 0x09,
            payload: Vec::from_slice(&[0x02, 0x05]).unwrap(),
            checksum: 0,
        };
        let mut bytes = reply.to_bytes();
        let last = bytes.len() - 1;
        bytes[last] = checksum(&bytes[..last]);

        let frame = decode_response(&bytes, 2).unwrap();
        assert_eq!(frame.opcode_echo, 0x7F);
        assert_eq!(frame.length_echo, 0x09);
    }
}
