//! # Setpoint store
//!
//! The setpoint store holds the control loop's authoritative actuation
//! target. It is shared between the command producer (which applies newly
//! arrived commands to it) and the control thread (which reads a stable
//! snapshot of it once per control period).
//!
//! The store is the only mutable structure shared between the two threads
//! and is always accessed under its single lock, which is held only for the
//! duration of the field copies. It is never held across a transport call.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

// Internal
use comms_if::tc::RovCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop's current actuation target.
///
/// Same fields as [`RovCmd`] minus the sequence number. Initialised to the
/// all-zero neutral target, which commands no motion.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct Setpoint {
    pub surge: i8,
    pub sway: i8,
    pub heave: i8,
    pub roll: i8,
    pub pitch: i8,
    pub yaw: i8,
    pub light: u8,
    pub manipulator: u8,
}

/// Lock-guarded holder of the current [`Setpoint`].
#[derive(Debug, Default)]
pub struct SetpointStore {
    setpoint: Mutex<Setpoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SetpointStore {
    /// Create a new store holding the neutral setpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command to the store.
    ///
    /// The lock is held for the field copies only.
    pub fn apply(&self, cmd: &RovCmd) {
        let mut setpoint = self.lock();

        setpoint.surge = cmd.surge;
        setpoint.sway = cmd.sway;
        setpoint.heave = cmd.heave;
        setpoint.roll = cmd.roll;
        setpoint.pitch = cmd.pitch;
        setpoint.yaw = cmd.yaw;
        setpoint.light = cmd.light;
        setpoint.manipulator = cmd.manipulator;
    }

    /// Get a stable snapshot of the current setpoint.
    pub fn snapshot(&self) -> Setpoint {
        *self.lock()
    }

    /// Acquire the setpoint lock.
    ///
    /// A poisoned lock still holds the last fully written setpoint (writes
    /// are plain field copies), so recover the guard rather than panicking
    /// the control thread.
    fn lock(&self) -> MutexGuard<Setpoint> {
        self.setpoint.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn cmd_with_surge(sequence: u32, surge: i8) -> RovCmd {
        RovCmd {
            sequence,
            surge,
            sway: 0,
            heave: 0,
            roll: 0,
            pitch: 0,
            yaw: 0,
            light: 0,
            manipulator: 0,
        }
    }

    #[test]
    fn test_initially_neutral() {
        let store = SetpointStore::new();

        assert_eq!(store.snapshot(), Setpoint::default());
    }

    #[test]
    fn test_apply_copies_all_fields() {
        let store = SetpointStore::new();

        let cmd = RovCmd {
            sequence: 1,
            surge: 1,
            sway: -2,
            heave: 3,
            roll: -4,
            pitch: 5,
            yaw: -6,
            light: 7,
            manipulator: 8,
        };

        store.apply(&cmd);

        let setpoint = store.snapshot();
        assert_eq!(setpoint.surge, 1);
        assert_eq!(setpoint.sway, -2);
        assert_eq!(setpoint.heave, 3);
        assert_eq!(setpoint.roll, -4);
        assert_eq!(setpoint.pitch, 5);
        assert_eq!(setpoint.yaw, -6);
        assert_eq!(setpoint.light, 7);
        assert_eq!(setpoint.manipulator, 8);
    }

    #[test]
    fn test_last_applied_command_wins() {
        let store = SetpointStore::new();

        store.apply(&cmd_with_surge(1, 10));
        store.apply(&cmd_with_surge(2, 20));
        store.apply(&cmd_with_surge(3, 30));

        assert_eq!(store.snapshot().surge, 30);
    }
}
