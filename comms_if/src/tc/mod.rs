//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. A telecommand is a single 6DOF motion instruction sent to the
//! vehicle by the surface control station.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod bitmask;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use bitmask::{AxisBitmask, BitmaskField};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A motion command sent to the vehicle by the surface control station.
///
/// The six axis values are signed fractions of full scale (-128 to +127).
/// Commands are immutable once constructed and are consumed exactly once by
/// the setpoint store.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RovCmd {
    /// Monotonically increasing command sequence number.
    pub sequence: u32,

    /// Fore/aft translation demand.
    pub surge: i8,

    /// Lateral translation demand.
    pub sway: i8,

    /// Vertical translation demand.
    pub heave: i8,

    /// Rotation demand about the longitudinal axis.
    pub roll: i8,

    /// Rotation demand about the lateral axis.
    pub pitch: i8,

    /// Rotation demand about the vertical axis.
    pub yaw: i8,

    /// Light intensity demand (0 = off, 255 = full).
    pub light: u8,

    /// Manipulator position demand.
    pub manipulator: u8,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RovCmd {
    /// Parse a new command from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Build a command from a received axis bitmask payload.
    ///
    /// Axis fields travel as offset-binary bytes (0 = full negative, 128 =
    /// neutral, 255 = full positive), light and manipulator fields are plain
    /// unsigned bytes.
    pub fn from_bitmask(sequence: u32, bm: &AxisBitmask) -> Self {
        Self {
            sequence,
            surge: axis_from_byte(bm.field(BitmaskField::Surge)),
            sway: axis_from_byte(bm.field(BitmaskField::Sway)),
            heave: axis_from_byte(bm.field(BitmaskField::Heave)),
            roll: axis_from_byte(bm.field(BitmaskField::Roll)),
            pitch: axis_from_byte(bm.field(BitmaskField::Pitch)),
            yaw: axis_from_byte(bm.field(BitmaskField::Yaw)),
            light: bm.field(BitmaskField::Light),
            manipulator: bm.field(BitmaskField::Manipulator),
        }
    }

    /// Pack this command's fields into an axis bitmask snapshot.
    ///
    /// The sequence number is not part of the bitmask.
    pub fn to_bitmask(&self) -> AxisBitmask {
        let mut bm = AxisBitmask::default();

        bm.set_field(BitmaskField::Surge, axis_to_byte(self.surge));
        bm.set_field(BitmaskField::Sway, axis_to_byte(self.sway));
        bm.set_field(BitmaskField::Heave, axis_to_byte(self.heave));
        bm.set_field(BitmaskField::Roll, axis_to_byte(self.roll));
        bm.set_field(BitmaskField::Pitch, axis_to_byte(self.pitch));
        bm.set_field(BitmaskField::Yaw, axis_to_byte(self.yaw));
        bm.set_field(BitmaskField::Light, self.light);
        bm.set_field(BitmaskField::Manipulator, self.manipulator);

        bm
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an offset-binary axis byte into a signed axis value.
fn axis_from_byte(byte: u8) -> i8 {
    byte.wrapping_sub(128) as i8
}

/// Convert a signed axis value into an offset-binary axis byte.
fn axis_to_byte(axis: i8) -> u8 {
    (axis as u8).wrapping_add(128)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
