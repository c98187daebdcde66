//! # Control loop module
//!
//! The control loop owns the vehicle's actuation cadence. A dedicated thread
//! runs at a fixed 50 Hz: each cycle it drains all commands queued by the
//! producer (the network decoder or the script interpreter), applies them to
//! the setpoint store in arrival order, then mixes the resulting setpoint
//! and dispatches the duty cycle frames to the motor controllers.
//!
//! The dispatch happens every cycle even when no new command has arrived:
//! the motor controllers fail safe and stop unless they are refreshed
//! periodically, so an unchanged setpoint is re-sent as a heartbeat.
//!
//! The inbound queue is bounded and non-blocking on both ends. When it is
//! full the newest command is dropped and counted - losing one command is
//! preferred over stalling the producer or the real-time cadence.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{info, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// Internal
use crate::setpoint_store::SetpointStore;
use crate::thrust_ctrl::ThrustCtrl;
use crate::vesc_driver::VescDriver;
use comms_if::tc::RovCmd;
use util::{maths::lin_map, module::State};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one control cycle.
pub const CTRL_PERIOD_S: f64 = 0.02;

/// Number of control cycles per second.
pub const CTRL_FREQUENCY_HZ: f64 = 1.0 / CTRL_PERIOD_S;

/// Capacity of the inbound command queue.
pub const CMD_QUEUE_CAPACITY: usize = 10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Producer-side handle onto the inbound command queue.
pub struct CmdSender {
    tx: Sender<RovCmd>,
    num_dropped: Arc<AtomicU64>,
}

/// The control loop state, owned by the control thread once spawned.
pub struct CtrlLoop {
    pub(crate) cmd_rx: Receiver<RovCmd>,
    pub(crate) setpoint_store: Arc<SetpointStore>,
    pub(crate) thrust_ctrl: ThrustCtrl,
    pub(crate) vesc_driver: VescDriver,

    stop: Arc<AtomicBool>,

    // Monitoring counters
    num_cycles: u64,
    num_cmds_applied: u64,
    num_cycle_overruns: u64,
    num_send_failures: u64,
}

/// Handle used to stop the control loop thread.
///
/// The loop is expected to run for the process lifetime; the handle exists
/// for clean shutdown at end of script and in tests.
pub struct CtrlLoopHandle {
    stop: Arc<AtomicBool>,
    join_handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Create the bounded inbound command queue.
pub fn cmd_channel() -> (CmdSender, Receiver<RovCmd>) {
    let (tx, rx) = bounded(CMD_QUEUE_CAPACITY);

    (
        CmdSender {
            tx,
            num_dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdSender {
    /// Push a command into the queue without blocking.
    ///
    /// If the queue is full the newest command (the one being pushed) is
    /// dropped and counted. Commands already queued are preferred over new
    /// ones so that the drain order is never disturbed.
    pub fn send(&self, cmd: RovCmd) {
        match self.tx.try_send(cmd) {
            Ok(_) => (),
            Err(TrySendError::Full(cmd)) => {
                self.num_dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Command queue full, command #{} dropped", cmd.sequence);
            }
            Err(TrySendError::Disconnected(cmd)) => {
                warn!(
                    "Control loop has stopped, command #{} discarded",
                    cmd.sequence
                );
            }
        }
    }

    /// Number of commands dropped because the queue was full.
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped.load(Ordering::Relaxed)
    }
}

impl CtrlLoop {
    /// Create a new control loop over the given queue, store and modules.
    ///
    /// The modules must already be initialised.
    pub fn new(
        cmd_rx: Receiver<RovCmd>,
        setpoint_store: Arc<SetpointStore>,
        thrust_ctrl: ThrustCtrl,
        vesc_driver: VescDriver,
    ) -> Self {
        Self {
            cmd_rx,
            setpoint_store,
            thrust_ctrl,
            vesc_driver,
            stop: Arc::new(AtomicBool::new(false)),
            num_cycles: 0,
            num_cmds_applied: 0,
            num_cycle_overruns: 0,
            num_send_failures: 0,
        }
    }

    /// Spawn the dedicated control thread, consuming the loop state.
    pub fn spawn(self) -> Result<CtrlLoopHandle, std::io::Error> {
        let stop = self.stop.clone();

        let join_handle = thread::Builder::new()
            .name("ctrl_loop".into())
            .spawn(move || self.run())?;

        Ok(CtrlLoopHandle { stop, join_handle })
    }

    /// Run the loop until the stop flag is raised.
    fn run(mut self) {
        info!("Control loop started ({:.0} Hz)", CTRL_FREQUENCY_HZ);

        let period = Duration::from_secs_f64(CTRL_PERIOD_S);

        // Deadlines are advanced from an absolute anchor rather than slept
        // relative to the end of each cycle, so timing errors do not
        // accumulate over the process lifetime.
        let mut next_cycle_instant = Instant::now() + period;

        while !self.stop.load(Ordering::Relaxed) {
            self.cycle();

            match next_cycle_instant.checked_duration_since(Instant::now()) {
                Some(d) => thread::sleep(d),
                None => {
                    self.num_cycle_overruns += 1;
                    warn!(
                        "Control cycle {} overran its {} ms period",
                        self.num_cycles,
                        period.as_millis()
                    );
                }
            }

            next_cycle_instant += period;
        }

        info!(
            "Control loop stopped after {} cycles ({} commands applied, {} overruns, {} send \
             failures)",
            self.num_cycles, self.num_cmds_applied, self.num_cycle_overruns, self.num_send_failures
        );
    }

    /// Perform one control cycle.
    pub(crate) fn cycle(&mut self) {
        // Drain every queued command in arrival order. Each one is applied
        // to the store, so the most recent command wins with no
        // interpolation between them.
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            trace!("Applying command #{}", cmd.sequence);
            self.setpoint_store.apply(&cmd);
            self.num_cmds_applied += 1;
        }

        // Take a stable snapshot under the lock, then run the mixing and the
        // dispatch with the lock released
        let setpoint = self.setpoint_store.snapshot();

        let dems = match self.thrust_ctrl.proc(&setpoint) {
            Ok((d, _)) => d,
            Err(e) => {
                warn!("Error during ThrustCtrl processing: {}", e);
                return;
            }
        };

        match self.vesc_driver.proc(&dems) {
            Ok((_, report)) => {
                self.num_send_failures += report.send_failed.iter().filter(|f| **f).count() as u64;
            }
            Err(e) => warn!("Error during VescDriver processing: {}", e),
        }

        if setpoint.light > 0 {
            trace!(
                "Light demand: {:.0}%",
                lin_map((0f64, 255f64), (0f64, 100f64), setpoint.light as f64)
            );
        }

        self.num_cycles += 1;
    }
}

impl CtrlLoopHandle {
    /// Raise the stop flag and wait for the control thread to exit.
    pub fn stop(self) -> thread::Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        self.join_handle.join()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
