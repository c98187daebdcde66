//! # VESC driver module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;
use thiserror::Error;

// Internal
use super::{Params, ParamsError, Transport};
use crate::thrust_ctrl::{ThrusterDems, NUM_THRUSTERS};
use comms_if::eqpt::vesc::VescFrame;
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// VESC driver module state
#[derive(Default)]
pub struct VescDriver {
    pub(crate) params: Params,
    pub(crate) report: StatusReport,

    local: Option<Box<dyn Transport>>,
    bus: Option<Box<dyn Transport>>,
}

/// Status report for VescDriver processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Flags raised for each thruster whose frame could not be sent this
    /// cycle.
    pub send_failed: [bool; NUM_THRUSTERS],

    /// Number of frames successfully handed to the transports this cycle.
    pub num_frames_sent: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),

    #[error("Failed to open the transports: {0}")]
    TransportOpenError(super::TransportError),
}

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("The transports have not been initialised")]
    TransportsNotInitialised,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for VescDriver {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = ThrusterDems;
    type OutputData = ();
    type StatusReport = StatusReport;
    type ProcError = ProcError;

    /// Initialise the VESC driver.
    ///
    /// Expected init data is the path to the module parameters file. With
    /// the `uart` feature the serial link named in the parameters is opened,
    /// without it frames are discarded.
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        // Load parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e)),
        };

        // Check parameters are valid
        match self.params.are_valid() {
            Ok(_) => (),
            Err(e) => return Err(InitError::ParamsInvalid(e)),
        }

        // Open the transports. The CAN bus is reached through the local
        // controller's forwarding, so both adapters share the serial link.
        #[cfg(feature = "uart")]
        {
            let local = super::SerialTransport::open(&self.params.serial_port, self.params.baud_rate)
                .map_err(InitError::TransportOpenError)?;
            let bus = local.try_clone().map_err(InitError::TransportOpenError)?;

            self.local = Some(Box::new(local));
            self.bus = Some(Box::new(bus));
        }

        #[cfg(not(feature = "uart"))]
        {
            self.local = Some(Box::new(super::SinkTransport::default()));
            self.bus = Some(Box::new(super::SinkTransport::default()));
        }

        Ok(())
    }

    /// Cyclic processing for the VESC driver.
    ///
    /// Takes the output data from ThrustCtrl and sends the duty cycle frames
    /// to the motor controllers. Each send is independent: a transport
    /// failure on one thruster is flagged and logged but never blocks
    /// dispatch to the remaining thrusters, and failed frames are not
    /// retried - the next cycle's dispatch supersedes them.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let local = match self.local.as_mut() {
            Some(t) => t,
            None => return Err(ProcError::TransportsNotInitialised),
        };
        let bus = match self.bus.as_mut() {
            Some(t) => t,
            None => return Err(ProcError::TransportsNotInitialised),
        };

        for (i, duty) in input_data.duty.iter().enumerate() {
            // Thruster 0 is attached directly to the serial link, all others
            // are forwarded onto the CAN bus
            let send_result = if i == 0 {
                let frame = VescFrame::set_duty(*duty as f32);
                local.send(frame.as_bytes())
            } else {
                let frame =
                    VescFrame::set_duty_forwarded(self.params.bus_node_ids[i - 1], *duty as f32);
                bus.send(frame.as_bytes())
            };

            match send_result {
                Ok(_) => self.report.num_frames_sent += 1,
                Err(e) => {
                    warn!("Could not send duty frame to thruster {}: {}", i, e);
                    self.report.send_failed[i] = true;
                }
            }
        }

        trace!(
            "VescDriver sent {} of {} frames",
            self.report.num_frames_sent,
            NUM_THRUSTERS
        );

        Ok(((), self.report))
    }
}

impl VescDriver {
    /// Build a driver from explicit parameters and transports, without
    /// touching the parameter files or the hardware.
    #[cfg(test)]
    pub(crate) fn with_transports(
        params: Params,
        local: Box<dyn Transport>,
        bus: Box<dyn Transport>,
    ) -> Self {
        Self {
            params,
            report: StatusReport::default(),
            local: Some(local),
            bus: Some(bus),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
