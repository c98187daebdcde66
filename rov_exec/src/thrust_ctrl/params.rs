//! Parameters structure for ThrustCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use super::{NUM_AXES, NUM_THRUSTERS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Thrust control.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----

    /// Contribution of each axis to each thruster.
    ///
    /// Rows are axes in the order surge, sway, heave, roll, pitch, yaw,
    /// columns are thrusters. Coefficients are normally in {-1, 0, +1} but
    /// general weights are accepted.
    pub mixing_matrix: [[f64; NUM_THRUSTERS]; NUM_AXES],

    /// Sign correction for each thruster's physical mounting direction.
    ///
    /// +1 if a positive duty cycle produces forward thrust, -1 if the motor
    /// is mounted reversed.
    pub direction: [f64; NUM_THRUSTERS],

    // ---- CAPABILITIES ----

    /// Maximum duty cycle magnitude that may be demanded from any thruster.
    ///
    /// Units: duty cycle fraction, must be in (0, 1].
    pub max_duty: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("max_duty must be in (0, 1] but is {0}")]
    InvalidMaxDuty(f64),

    #[error("Direction correction for thruster {0} must be +1 or -1 but is {1}")]
    InvalidDirection(usize, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.max_duty > 0.0 && self.max_duty <= 1.0) {
            return Err(ParamsError::InvalidMaxDuty(self.max_duty));
        }

        for (i, dir) in self.direction.iter().enumerate() {
            if *dir != 1.0 && *dir != -1.0 {
                return Err(ParamsError::InvalidDirection(i, *dir));
            }
        }

        Ok(())
    }
}
