//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the
//! telecommands sent to the vehicle by the surface control station, and the
//! wire protocol spoken to the thruster motor controllers.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Command and frame definitions for equipment (like the motor controllers)
pub mod eqpt;
