//! # Transport adapters for the motor controller links
//!
//! A transport accepts complete frames from the VESC driver and performs the
//! byte transfer. Two adapters exist on the vehicle: the local serial link
//! to the directly-attached controller, and the CAN bus view reached through
//! that same controller's forwarding. Both are used through the [`Transport`]
//! trait so the driver never depends on the physical link.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Trait to provide a unified API for sending frames to the motor
/// controllers.
pub trait Transport: Send {
    /// Send a single frame's bytes over the link.
    ///
    /// A send is a bounded operation: it either transfers the whole frame or
    /// fails, it must not block the control thread indefinitely.
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error on the transport: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "uart")]
    #[error("Could not open the serial port: {0}")]
    OpenError(serialport::Error),
}

// ---------------------------------------------------------------------------
// SERIAL TRANSPORT
// ---------------------------------------------------------------------------

/// Transport over the local serial link to the directly-attached motor
/// controller.
#[cfg(feature = "uart")]
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

#[cfg(feature = "uart")]
impl SerialTransport {
    /// Open the serial port with the controller's link settings.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(std::time::Duration::from_millis(10))
            .open()
            .map_err(TransportError::OpenError)?;

        Ok(Self { port })
    }

    /// Get a second handle onto the same serial port.
    ///
    /// The CAN bus adapter is a view through the local controller's
    /// forwarding, so it shares the physical link with the local adapter.
    pub fn try_clone(&self) -> Result<Self, TransportError> {
        let port = self.port.try_clone().map_err(TransportError::OpenError)?;

        Ok(Self { port })
    }
}

#[cfg(feature = "uart")]
impl Transport for SerialTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        use std::io::Write;

        self.port.write_all(frame)?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SINK TRANSPORT
// ---------------------------------------------------------------------------

/// A transport which discards all frames.
///
/// Used for dry runs and benchmarks on hosts without the thruster hardware
/// attached.
#[derive(Default)]
pub struct SinkTransport {
    num_frames: u64,
}

impl Transport for SinkTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.num_frames += 1;
        trace!("Discarding frame {} of {} bytes", self.num_frames, frame.len());

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TEST TRANSPORTS
// ---------------------------------------------------------------------------

/// A transport which records every frame handed to it, shared with the test
/// through an `Arc`.
#[cfg(test)]
pub struct RecordingTransport {
    frames: std::sync::Arc<std::sync::Mutex<Vec<Vec<u8>>>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn new() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<Vec<u8>>>>) {
        let frames = std::sync::Arc::new(std::sync::Mutex::new(vec![]));

        (
            Self {
                frames: frames.clone(),
            },
            frames,
        )
    }
}

#[cfg(test)]
impl Transport for RecordingTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames.lock().unwrap().push(frame.to_vec());

        Ok(())
    }
}

/// A transport whose sends always fail.
#[cfg(test)]
pub struct FailingTransport;

#[cfg(test)]
impl Transport for FailingTransport {
    fn send(&mut self, _frame: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::IoError(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "transport failed",
        )))
    }
}
