//! Thrust control module
//!
//! Maps the 6 axis setpoint onto the vehicle's fixed set of thrusters using
//! the vehicle-specific mixing matrix.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of thrusters on the vehicle.
pub const NUM_THRUSTERS: usize = 8;

/// The number of controlled axes (surge, sway, heave, roll, pitch, yaw).
pub const NUM_AXES: usize = 6;

/// Divisor used to normalise a signed 8 bit axis value into [-1.0, 1.0].
///
/// With 127.0 a demand of +127 maps to exactly +1.0; a demand of -128
/// normalises fractionally beyond full scale and is absorbed by the output
/// clamp.
pub const AXIS_NORM_DIVISOR: f64 = 127.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ThrustCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ThrustCtrlError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),
}
