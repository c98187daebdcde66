//! # VESC driver module
//!
//! This module interfaces with the vehicle's thruster motor controllers. It
//! takes in a `thrust_ctrl::ThrusterDems` struct with the duty cycle demands
//! and issues each one as a framed packet: thruster 0 goes directly over the
//! local serial link, the remaining thrusters are forwarded across the CAN
//! bus by the local controller.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;
pub mod transport;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
pub use transport::*;
