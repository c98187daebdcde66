//! # Axis bitmask snapshot
//!
//! A compact 64 bit view of the vehicle's current axis demands, with eight
//! independent 8 bit fields at fixed offsets. Collaborators which only need
//! a non-authoritative view of the current demands (telemetry lines, debug
//! displays) read this instead of the setpoint store.
//!
//! The snapshot is a single-writer value: the command producer owns it and
//! overwrites it whole (last write wins). Readers must not assume per-field
//! atomicity if they observe it across threads without further
//! synchronisation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Bit offsets of the eight fields within the bitmask.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum BitmaskField {
    Surge = 0,
    Sway = 8,
    Heave = 16,
    Roll = 24,
    Pitch = 32,
    Yaw = 40,
    Light = 48,
    Manipulator = 56,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A 64 bit axis snapshot, eight 8 bit fields wide.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AxisBitmask(pub u64);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisBitmask {
    /// Set a single field of the bitmask, leaving all others unchanged.
    pub fn set_field(&mut self, field: BitmaskField, value: u8) {
        let offset = field as u64;
        let mask = 0xFFu64 << offset;

        self.0 = (self.0 & !mask) | ((value as u64) << offset);
    }

    /// Get a single field of the bitmask.
    pub fn field(&self, field: BitmaskField) -> u8 {
        ((self.0 >> field as u64) & 0xFF) as u8
    }

    /// Export the bitmask as 8 little-endian bytes.
    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Import a bitmask from 8 little-endian bytes.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_field_isolation() {
        let mut bm = AxisBitmask::default();

        bm.set_field(BitmaskField::Surge, 0xAA);
        bm.set_field(BitmaskField::Yaw, 0x55);

        assert_eq!(bm.field(BitmaskField::Surge), 0xAA);
        assert_eq!(bm.field(BitmaskField::Yaw), 0x55);
        assert_eq!(bm.field(BitmaskField::Sway), 0);
        assert_eq!(bm.field(BitmaskField::Manipulator), 0);

        // Overwriting a field must not disturb its neighbours
        bm.set_field(BitmaskField::Surge, 0x01);

        assert_eq!(bm.field(BitmaskField::Surge), 0x01);
        assert_eq!(bm.field(BitmaskField::Yaw), 0x55);
    }

    #[test]
    fn test_little_endian_bytes() {
        let mut bm = AxisBitmask::default();
        bm.set_field(BitmaskField::Surge, 0x01);
        bm.set_field(BitmaskField::Sway, 0x02);
        bm.set_field(BitmaskField::Manipulator, 0xFF);

        // Surge sits at bit offset 0, so it must be the first byte on the
        // wire
        assert_eq!(bm.to_bytes(), [0x01, 0x02, 0, 0, 0, 0, 0, 0xFF]);

        assert_eq!(AxisBitmask::from_bytes(bm.to_bytes()), bm);
    }
}
