//! # VESC driver parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use crate::thrust_ctrl::NUM_THRUSTERS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Serial device of the local motor controller.
    pub serial_port: String,

    /// Baud rate of the local serial link.
    pub baud_rate: u32,

    /// CAN node ids of the bus-attached motor controllers.
    ///
    /// Element `i` is the node id of thruster `i + 1`; thruster 0 is on the
    /// local serial link and has no node id.
    pub bus_node_ids: [u8; NUM_THRUSTERS - 1],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Not all bus-attached thrusters have a unique node id")]
    NonUniqueNodeId,

    #[error("Baud rate may not be zero")]
    ZeroBaudRate,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.baud_rate == 0 {
            return Err(ParamsError::ZeroBaudRate);
        }

        // Non unique node ids
        for id in self.bus_node_ids.iter() {
            if self.bus_node_ids.iter().filter(|n| *n == id).count() > 1 {
                return Err(ParamsError::NonUniqueNodeId);
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_validation() {
        let mut params = Params {
            serial_port: "/dev/ttyS1".into(),
            baud_rate: 115200,
            bus_node_ids: [1, 2, 3, 4, 5, 6, 7],
        };

        assert!(params.are_valid().is_ok());

        params.bus_node_ids[6] = 1;
        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::NonUniqueNodeId)
        ));

        params.bus_node_ids[6] = 7;
        params.baud_rate = 0;
        assert!(matches!(params.are_valid(), Err(ParamsError::ZeroBaudRate)));
    }
}
