//! Implementations for the ThrustCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Params, ThrustCtrlError, AXIS_NORM_DIVISOR, NUM_AXES, NUM_THRUSTERS};
use crate::setpoint_store::Setpoint;
use util::{maths::clamp, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Thrust control module state
#[derive(Default)]
pub struct ThrustCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
}

/// Output demands from ThrustCtrl that the VESC driver must execute.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct ThrusterDems {
    /// Duty cycle demand for each thruster.
    ///
    /// Units: duty cycle fraction, magnitude bounded by the max_duty
    /// parameter.
    pub duty: [f64; NUM_THRUSTERS],
}

/// Status report for ThrustCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Flags raised for each thruster whose raw mixed demand exceeded the
    /// duty ceiling and was clamped.
    pub duty_clamped: [bool; NUM_THRUSTERS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ThrustCtrl {
    type InitData = &'static str;
    type InitError = ThrustCtrlError;

    type InputData = Setpoint;
    type OutputData = ThrusterDems;
    type StatusReport = StatusReport;
    type ProcError = ThrustCtrlError;

    /// Initialise the ThrustCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(ThrustCtrlError::ParamLoadError(e)),
        };

        // Check parameters are valid
        match self.params.are_valid() {
            Ok(_) => (),
            Err(e) => return Err(ThrustCtrlError::ParamsInvalid(e)),
        }

        Ok(())
    }

    /// Perform cyclic processing of Thrust Control.
    ///
    /// Mixing is a pure function of the input setpoint: the same setpoint
    /// always produces the same demands. Out of range raw demands are
    /// silently clamped and flagged in the status report, never rejected.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Normalise the axis demands into [-1.0, 1.0]
        let axes = [
            input_data.surge as f64 / AXIS_NORM_DIVISOR,
            input_data.sway as f64 / AXIS_NORM_DIVISOR,
            input_data.heave as f64 / AXIS_NORM_DIVISOR,
            input_data.roll as f64 / AXIS_NORM_DIVISOR,
            input_data.pitch as f64 / AXIS_NORM_DIVISOR,
            input_data.yaw as f64 / AXIS_NORM_DIVISOR,
        ];

        let mut output = ThrusterDems::default();

        for i in 0..NUM_THRUSTERS {
            // Sum the contribution of each axis to this thruster
            let mut raw = 0f64;
            for axis in 0..NUM_AXES {
                raw += self.params.mixing_matrix[axis][i] * axes[axis];
            }

            // Apply the mounting direction correction and scale to the duty
            // ceiling
            let duty = self.params.direction[i] * raw * self.params.max_duty;

            if duty.abs() > self.params.max_duty {
                self.report.duty_clamped[i] = true;
            }

            output.duty[i] = clamp(&duty, &-self.params.max_duty, &self.params.max_duty);
        }

        trace!("ThrustCtrl output: {:?}", output.duty);

        Ok((output, self.report))
    }
}

impl ThrustCtrl {
    /// Build a module from explicit parameters, without touching the
    /// parameter files.
    pub fn with_params(params: Params) -> Result<Self, ThrustCtrlError> {
        match params.are_valid() {
            Ok(_) => (),
            Err(e) => return Err(ThrustCtrlError::ParamsInvalid(e)),
        }

        Ok(Self {
            params,
            report: StatusReport::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// The vehicle's vectored 8 thruster geometry, as shipped in
    /// `params/thrust_ctrl.toml`.
    fn vehicle_params() -> Params {
        Params {
            mixing_matrix: [
                [1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0],
                [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0],
                [1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0],
                [-1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0],
            ],
            direction: [1.0; NUM_THRUSTERS],
            max_duty: 0.5,
        }
    }

    /// Parameters in which thruster 0 is driven purely by surge and no other
    /// thruster responds to any axis.
    fn surge_only_params() -> Params {
        let mut mixing_matrix = [[0.0; NUM_THRUSTERS]; NUM_AXES];
        mixing_matrix[0][0] = 1.0;

        Params {
            mixing_matrix,
            direction: [1.0; NUM_THRUSTERS],
            max_duty: 0.5,
        }
    }

    fn setpoint_with_axes(axes: [i8; NUM_AXES]) -> Setpoint {
        Setpoint {
            surge: axes[0],
            sway: axes[1],
            heave: axes[2],
            roll: axes[3],
            pitch: axes[4],
            yaw: axes[5],
            light: 0,
            manipulator: 0,
        }
    }

    #[test]
    fn test_neutral_setpoint_gives_zero_duty() {
        let mut tc = ThrustCtrl {
            params: vehicle_params(),
            ..Default::default()
        };

        let (dems, report) = tc.proc(&Setpoint::default()).unwrap();

        assert!(dems.duty.iter().all(|d| *d == 0.0));
        assert!(report.duty_clamped.iter().all(|c| !c));
    }

    #[test]
    fn test_duty_never_exceeds_ceiling() {
        let mut tc = ThrustCtrl {
            params: vehicle_params(),
            ..Default::default()
        };

        // Drive each axis to both extremes on its own
        for axis in 0..NUM_AXES {
            for extreme in &[-128i8, 127i8] {
                let mut axes = [0i8; NUM_AXES];
                axes[axis] = *extreme;

                let (dems, _) = tc.proc(&setpoint_with_axes(axes)).unwrap();

                for duty in dems.duty.iter() {
                    assert!(
                        duty.abs() <= tc.params.max_duty,
                        "duty {} exceeds ceiling for axis {} at {}",
                        duty,
                        axis,
                        extreme
                    );
                }
            }
        }

        // All axes saturated at once must still respect the ceiling
        let (dems, _) = tc.proc(&setpoint_with_axes([127; NUM_AXES])).unwrap();
        for duty in dems.duty.iter() {
            assert!(duty.abs() <= tc.params.max_duty);
        }
    }

    #[test]
    fn test_mixing_is_deterministic() {
        let mut tc = ThrustCtrl {
            params: vehicle_params(),
            ..Default::default()
        };

        let setpoint = setpoint_with_axes([53, -12, 127, -128, 1, -90]);

        let (first, _) = tc.proc(&setpoint).unwrap();
        for _ in 0..10 {
            let (next, _) = tc.proc(&setpoint).unwrap();
            assert_eq!(next, first);
        }
    }

    #[test]
    fn test_surge_only_thruster_reaches_full_duty() {
        let mut tc = ThrustCtrl {
            params: surge_only_params(),
            ..Default::default()
        };

        let (dems, report) = tc.proc(&setpoint_with_axes([127, 0, 0, 0, 0, 0])).unwrap();

        // +127 normalises to exactly +1.0, so thruster 0 sits exactly on the
        // ceiling and the remaining thrusters are untouched
        assert!((dems.duty[0] - tc.params.max_duty).abs() < 1e-12);
        assert!(dems.duty[1..].iter().all(|d| *d == 0.0));
        assert!(report.duty_clamped.iter().all(|c| !c));
    }

    #[test]
    fn test_direction_correction_flips_sign() {
        let mut params = surge_only_params();
        params.direction[0] = -1.0;

        let mut tc = ThrustCtrl {
            params,
            ..Default::default()
        };

        let (dems, _) = tc.proc(&setpoint_with_axes([127, 0, 0, 0, 0, 0])).unwrap();

        assert!((dems.duty[0] + tc.params.max_duty).abs() < 1e-12);
    }

    #[test]
    fn test_saturated_demand_is_clamped_and_flagged() {
        // Two axes both fully driving thruster 0 gives a raw demand of 2.0,
        // which must be clamped to the ceiling
        let mut mixing_matrix = [[0.0; NUM_THRUSTERS]; NUM_AXES];
        mixing_matrix[0][0] = 1.0;
        mixing_matrix[1][0] = 1.0;

        let mut tc = ThrustCtrl {
            params: Params {
                mixing_matrix,
                direction: [1.0; NUM_THRUSTERS],
                max_duty: 0.5,
            },
            ..Default::default()
        };

        let (dems, report) = tc.proc(&setpoint_with_axes([127, 127, 0, 0, 0, 0])).unwrap();

        assert_eq!(dems.duty[0], tc.params.max_duty);
        assert!(report.duty_clamped[0]);
        assert!(report.duty_clamped[1..].iter().all(|c| !c));
    }

    #[test]
    fn test_full_negative_axis_is_absorbed_by_clamp() {
        let mut tc = ThrustCtrl {
            params: surge_only_params(),
            ..Default::default()
        };

        // -128 normalises slightly beyond -1.0 and must be clamped to the
        // ceiling rather than exceeding it
        let (dems, report) = tc.proc(&setpoint_with_axes([-128, 0, 0, 0, 0, 0])).unwrap();

        assert_eq!(dems.duty[0], -tc.params.max_duty);
        assert!(report.duty_clamped[0]);
    }
}
