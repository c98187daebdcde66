//! # VESC motor controller packet protocol
//!
//! This module builds and validates the framed packets spoken to the VESC
//! motor controllers driving the thrusters. One controller is attached
//! directly over the local serial link, the remaining controllers hang off
//! the CAN bus behind it and are reached by wrapping a command in a CAN
//! forwarding packet addressed to their node id.
//!
//! The frame format is:
//!
//! `START(1) | LENGTH(1) | PAYLOAD(LENGTH) | CHECKSUM(2) | STOP(1)`
//!
//! where the checksum is computed over the payload bytes only and is placed
//! on the wire high byte first. The first payload byte is always a
//! [`CommPacketId`]; any arguments follow as big-endian integers.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Byte marking the start of a frame.
pub const FRAME_START_BYTE: u8 = 0x02;

/// Byte marking the end of a frame.
pub const FRAME_STOP_BYTE: u8 = 0x03;

/// Maximum number of payload bytes in a single frame.
///
/// The controllers have a fixed-size receive buffer, so no frame built here
/// may ever exceed this. The largest payload currently constructed is the
/// CAN-forwarded set duty command at 7 bytes.
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Number of framing bytes wrapped around a payload (start, length, two
/// checksum bytes and stop).
pub const FRAME_OVERHEAD_LEN: usize = 5;

/// Maximum number of bytes in a single frame.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + FRAME_OVERHEAD_LEN;

/// Scale factor between a duty cycle fraction and its wire representation.
const DUTY_CYCLE_SCALE: f32 = 100000.0;

/// Scale factor between a current in amps and its wire representation in
/// milliamps.
const CURRENT_SCALE: f32 = 1000.0;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Command ids understood by the motor controller firmware.
///
/// The values follow the firmware revision flashed on the vehicle's
/// controllers and must not be renumbered independently of it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum CommPacketId {
    /// Set the duty cycle of the local controller.
    SetDuty = 0,

    /// Set the motor current of the local controller.
    SetCurrent = 1,

    /// Set the braking current of the local controller.
    SetCurrentBrake = 2,

    /// Request the telemetry value block from the controller.
    GetValues = 4,

    /// Forward the rest of the payload over the CAN bus to a specific node.
    ForwardCan = 34,

    /// Set the motor current of a controller on the CAN bus.
    CanSetCurrent = 35,
}

/// Errors which can occur when validating a received frame.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum VescFrameError {
    #[error("Frame of {0} bytes is too short to be valid")]
    TooShort(usize),

    #[error("Frame does not begin with the start byte")]
    InvalidStartByte,

    #[error("Frame does not end with the stop byte")]
    InvalidStopByte,

    #[error("Frame length field is {field} but {actual} payload bytes are present")]
    LengthMismatch { field: usize, actual: usize },

    #[error("Frame length field of {0} exceeds the maximum payload length")]
    PayloadTooLong(usize),

    #[error("Frame checksum is {found:#06X} but {expected:#06X} was computed from the payload")]
    ChecksumMismatch { expected: u16, found: u16 },
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A complete frame ready to be handed to a transport.
///
/// Frames are built in place in a buffer sized for the worst case, no
/// allocation is performed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VescFrame {
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl VescFrame {
    /// Build a set duty cycle frame for the local controller.
    ///
    /// The duty cycle must be in the range -1.0 to +1.0, the caller is
    /// responsible for clamping before calling.
    pub fn set_duty(duty: f32) -> Self {
        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        payload[0] = CommPacketId::SetDuty as u8;
        BigEndian::write_i32(&mut payload[1..5], (duty * DUTY_CYCLE_SCALE) as i32);

        Self::wrap(&payload[..5])
    }

    /// Build a set duty cycle frame for a controller on the CAN bus.
    ///
    /// The frame is addressed to the given node id and forwarded by the
    /// local controller.
    pub fn set_duty_forwarded(node_id: u8, duty: f32) -> Self {
        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        payload[0] = CommPacketId::ForwardCan as u8;
        payload[1] = node_id;
        payload[2] = CommPacketId::SetDuty as u8;
        BigEndian::write_i32(&mut payload[3..7], (duty * DUTY_CYCLE_SCALE) as i32);

        Self::wrap(&payload[..7])
    }

    /// Build a set motor current frame for the local controller.
    pub fn set_current(amps: f32) -> Self {
        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        payload[0] = CommPacketId::SetCurrent as u8;
        BigEndian::write_i32(&mut payload[1..5], (amps * CURRENT_SCALE) as i32);

        Self::wrap(&payload[..5])
    }

    /// Build a set motor current frame for a controller on the CAN bus.
    pub fn set_current_forwarded(node_id: u8, amps: f32) -> Self {
        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        payload[0] = CommPacketId::CanSetCurrent as u8;
        payload[1] = node_id;
        BigEndian::write_i32(&mut payload[2..6], (amps * CURRENT_SCALE) as i32);

        Self::wrap(&payload[..6])
    }

    /// Build a set braking current frame for the local controller.
    pub fn set_current_brake(amps: f32) -> Self {
        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        payload[0] = CommPacketId::SetCurrentBrake as u8;
        BigEndian::write_i32(&mut payload[1..5], (amps * CURRENT_SCALE) as i32);

        Self::wrap(&payload[..5])
    }

    /// Build a telemetry request frame for the local controller.
    pub fn get_values() -> Self {
        Self::wrap(&[CommPacketId::GetValues as u8])
    }

    /// Get the bytes of the frame as they go on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Get the number of bytes in the frame.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Validate a received frame, returning its payload bytes.
    pub fn parse(bytes: &[u8]) -> Result<&[u8], VescFrameError> {
        if bytes.len() < FRAME_OVERHEAD_LEN + 1 {
            return Err(VescFrameError::TooShort(bytes.len()));
        }
        if bytes[0] != FRAME_START_BYTE {
            return Err(VescFrameError::InvalidStartByte);
        }
        if bytes[bytes.len() - 1] != FRAME_STOP_BYTE {
            return Err(VescFrameError::InvalidStopByte);
        }

        let payload_len = bytes[1] as usize;

        if payload_len > MAX_PAYLOAD_LEN {
            return Err(VescFrameError::PayloadTooLong(payload_len));
        }
        if payload_len != bytes.len() - FRAME_OVERHEAD_LEN {
            return Err(VescFrameError::LengthMismatch {
                field: payload_len,
                actual: bytes.len() - FRAME_OVERHEAD_LEN,
            });
        }

        let payload = &bytes[2..2 + payload_len];

        let expected = crc16(payload);
        let found = BigEndian::read_u16(&bytes[2 + payload_len..4 + payload_len]);

        if expected != found {
            return Err(VescFrameError::ChecksumMismatch { expected, found });
        }

        Ok(payload)
    }

    /// Wrap a payload in the start/length/checksum/stop framing.
    fn wrap(payload: &[u8]) -> Self {
        // Payloads are built in this module only, a too-long payload is a
        // programming error rather than a runtime condition.
        debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);

        let mut buf = [0u8; MAX_FRAME_LEN];
        let mut idx = 0;

        buf[idx] = FRAME_START_BYTE;
        idx += 1;
        buf[idx] = payload.len() as u8;
        idx += 1;

        buf[idx..idx + payload.len()].copy_from_slice(payload);
        idx += payload.len();

        BigEndian::write_u16(&mut buf[idx..idx + 2], crc16(payload));
        idx += 2;

        buf[idx] = FRAME_STOP_BYTE;
        idx += 1;

        Self { buf, len: idx }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the 16 bit checksum of a frame payload.
///
/// This is the reflected 0xA001 polynomial with an initial value of 0xFFFF.
/// Controller firmware revisions also exist which use the non-reflected
/// CCITT 0x1021 polynomial with an initial value of 0x0000; the two are not
/// interchangeable and the controllers fitted to the vehicle reject frames
/// checksummed with the CCITT variant.
pub fn crc16(payload: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for byte in payload {
        crc ^= *byte as u16;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_duty_frame_layout() {
        let frame = VescFrame::set_duty(0.5);

        // 0.5 * 100000 = 50000 = 0x0000C350
        assert_eq!(
            frame.as_bytes(),
            &[
                FRAME_START_BYTE,
                5,
                0x00,
                0x00,
                0x00,
                0xC3,
                0x50,
                0xCC,
                0x74,
                FRAME_STOP_BYTE
            ]
        );
    }

    #[test]
    fn test_negative_duty_encoding() {
        let frame = VescFrame::set_duty(-1.0);

        // -100000 = 0xFFFE7960 as a two's complement i32
        assert_eq!(
            &frame.as_bytes()[2..7],
            &[CommPacketId::SetDuty as u8, 0xFF, 0xFE, 0x79, 0x60]
        );
    }

    #[test]
    fn test_forwarded_duty_frame_layout() {
        let frame = VescFrame::set_duty_forwarded(3, -1.0);

        let bytes = frame.as_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes[1], 7);
        assert_eq!(
            &bytes[2..9],
            &[
                CommPacketId::ForwardCan as u8,
                3,
                CommPacketId::SetDuty as u8,
                0xFF,
                0xFE,
                0x79,
                0x60
            ]
        );
        // Known checksum for this payload
        assert_eq!(&bytes[9..11], &[0x6D, 0x6B]);
    }

    #[test]
    fn test_current_frame_scaling() {
        let frame = VescFrame::set_current(2.5);
        let payload = VescFrame::parse(frame.as_bytes()).unwrap();

        assert_eq!(payload[0], CommPacketId::SetCurrent as u8);
        assert_eq!(BigEndian::read_i32(&payload[1..5]), 2500);

        let frame = VescFrame::set_current_brake(1.0);
        let payload = VescFrame::parse(frame.as_bytes()).unwrap();

        assert_eq!(payload[0], CommPacketId::SetCurrentBrake as u8);
        assert_eq!(BigEndian::read_i32(&payload[1..5]), 1000);

        let frame = VescFrame::set_current_forwarded(5, -0.5);
        let payload = VescFrame::parse(frame.as_bytes()).unwrap();

        assert_eq!(payload[0], CommPacketId::CanSetCurrent as u8);
        assert_eq!(payload[1], 5);
        assert_eq!(BigEndian::read_i32(&payload[2..6]), -500);
    }

    #[test]
    fn test_get_values_frame() {
        let frame = VescFrame::get_values();

        assert_eq!(frame.len(), 6);
        assert_eq!(frame.as_bytes()[1], 1);
        assert_eq!(frame.as_bytes()[2], CommPacketId::GetValues as u8);
        // Known checksum for the single-byte payload [4]
        assert_eq!(&frame.as_bytes()[3..5], &[0x83, 0xBE]);
    }

    #[test]
    fn test_checksum_stable() {
        let payload = [0u8, 0x12, 0x34, 0x56, 0x78];

        let first = crc16(&payload);
        for _ in 0..10 {
            assert_eq!(crc16(&payload), first);
        }
    }

    #[test]
    fn test_checksum_single_bit_sensitivity() {
        let payload = [0u8, 0x12, 0x34, 0x56, 0x78];
        let reference = crc16(&payload);

        // Flipping any single bit of the payload must change the checksum
        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut mutated = payload;
                mutated[byte] ^= 1 << bit;
                assert_ne!(
                    crc16(&mutated),
                    reference,
                    "checksum unchanged for bit {} of byte {}",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_parse_round_trip() {
        let frame = VescFrame::set_duty(0.123);
        let payload = VescFrame::parse(frame.as_bytes()).unwrap();

        assert_eq!(payload[0], CommPacketId::SetDuty as u8);
        assert_eq!(BigEndian::read_i32(&payload[1..5]), 12300);
    }

    #[test]
    fn test_parse_rejects_corruption() {
        let frame = VescFrame::set_duty(0.5);
        let good = frame.as_bytes();

        // Corrupt a payload byte, leaving the checksum stale
        let mut bad = good.to_vec();
        bad[4] ^= 0x01;
        assert!(matches!(
            VescFrame::parse(&bad),
            Err(VescFrameError::ChecksumMismatch { .. })
        ));

        // Wrong start byte
        let mut bad = good.to_vec();
        bad[0] = 0x55;
        assert_eq!(VescFrame::parse(&bad), Err(VescFrameError::InvalidStartByte));

        // Wrong stop byte
        let mut bad = good.to_vec();
        let end = bad.len() - 1;
        bad[end] = 0x55;
        assert_eq!(VescFrame::parse(&bad), Err(VescFrameError::InvalidStopByte));

        // Truncated
        assert_eq!(
            VescFrame::parse(&good[..3]),
            Err(VescFrameError::TooShort(3))
        );

        // Length field not matching the payload
        let mut bad = good.to_vec();
        bad[1] = 6;
        assert_eq!(
            VescFrame::parse(&bad),
            Err(VescFrameError::LengthMismatch { field: 6, actual: 5 })
        );
    }

    #[test]
    fn test_frames_fit_receive_buffer() {
        // Every constructor must stay within the controller's fixed receive
        // buffer
        assert!(VescFrame::set_duty(1.0).len() <= MAX_FRAME_LEN);
        assert!(VescFrame::set_duty_forwarded(255, -1.0).len() <= MAX_FRAME_LEN);
        assert!(VescFrame::set_current(50.0).len() <= MAX_FRAME_LEN);
        assert!(VescFrame::set_current_forwarded(255, -50.0).len() <= MAX_FRAME_LEN);
        assert!(VescFrame::set_current_brake(50.0).len() <= MAX_FRAME_LEN);
        assert!(VescFrame::get_values().len() <= MAX_FRAME_LEN);
    }
}
