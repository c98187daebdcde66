//! Main ROV-side executable entry point.
//!
//! # Architecture
//!
//! The executable runs two execution contexts:
//!
//!     - The main thread, which acts as the command producer: it drains the
//!       command source (a timed command script, or nothing at all when the
//!       vehicle should just hold station) and pushes commands into the
//!       bounded inbound queue.
//!     - The control thread, which runs the 50 Hz actuation cadence: it
//!       drains the queue into the setpoint store, mixes the setpoint into
//!       per-thruster duty cycles and dispatches the framed packets to the
//!       motor controllers.
//!
//! Network command reception is handled by a separate process which feeds
//! the same queue; it is not part of this executable.
//!
//! # Modules
//!
//! All cyclic modules (e.g. `thrust_ctrl`) shall meet the following
//! requirements:
//!     1. Provide a public struct implementing the `util::module::State`
//!        trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use rov_lib::{
    ctrl_loop::{cmd_channel, CtrlLoop},
    setpoint_store::SetpointStore,
    thrust_ctrl::ThrustCtrl,
    vesc_driver::VescDriver,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::tc::bitmask::AxisBitmask;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingCmds, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one producer cycle.
///
/// This only paces the draining of the command source, the actuation cadence
/// belongs to the control loop.
const CYCLE_PERIOD_S: f64 = 0.05;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rov_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Kraken ROV Executable\n");
    if let Some(hostname) = host::get_hostname() {
        info!("Running on: {}", hostname);
    }
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE COMMAND SOURCE ----

    // The command source determines whether we're replaying commands from a
    // script or holding station with no commands at all.
    let mut cmd_source = CmdSource::None;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} commands\n",
            si.get_duration(),
            si.get_num_cmds()
        );

        // Set the interpreter in the source
        cmd_source = CmdSource::Script(si);
    }
    // If no arguments the loop will hold the neutral setpoint
    else if args.len() == 1 {
        info!("No script provided, the control loop will hold the neutral setpoint\n");
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    }

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut thrust_ctrl = ThrustCtrl::default();
    thrust_ctrl
        .init("thrust_ctrl.toml", &session)
        .wrap_err("Failed to initialise ThrustCtrl")?;
    info!("ThrustCtrl init complete");

    let mut vesc_driver = VescDriver::default();
    vesc_driver
        .init("vesc_driver.toml", &session)
        .wrap_err("Failed to initialise VescDriver")?;
    info!("VescDriver init complete");

    info!("Module initialisation complete\n");

    // ---- START CONTROL LOOP ----

    let setpoint_store = Arc::new(SetpointStore::new());
    let (cmd_sender, cmd_rx) = cmd_channel();

    let ctrl_loop = CtrlLoop::new(cmd_rx, setpoint_store.clone(), thrust_ctrl, vesc_driver);
    let ctrl_loop_handle = ctrl_loop
        .spawn()
        .wrap_err("Failed to spawn the control loop thread")?;

    info!("Control loop running\n");

    // ---- MAIN LOOP ----

    // The producer's view of the most recent command, kept as a compact axis
    // snapshot for telemetry lines. The producer is the only writer.
    let mut current_snapshot = AxisBitmask::default();

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- COMMAND PROCESSING ----

        match cmd_source {
            // With no source there is nothing to drain, the control loop
            // refreshes the setpoint by itself
            CmdSource::None => (),

            CmdSource::Script(ref mut si) => match si.get_pending_cmds() {
                PendingCmds::None => (),
                PendingCmds::Some(cmd_vec) => {
                    for cmd in cmd_vec {
                        debug!("Command #{} pending", cmd.sequence);

                        current_snapshot = cmd.to_bitmask();

                        // Non-blocking push, drops and counts on a full
                        // queue
                        cmd_sender.send(cmd);
                    }
                }
                // Exit if end of script reached
                PendingCmds::EndOfScript => {
                    info!("End of command script reached, stopping");
                    break;
                }
            },
        };

        trace!("Axis snapshot: {:02X?}", current_snapshot.to_bytes());

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => {
                warn!(
                    "Producer cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
            }
        }
    }

    // ---- SHUTDOWN ----

    if cmd_sender.num_dropped() > 0 {
        warn!(
            "{} commands were dropped due to a full queue",
            cmd_sender.num_dropped()
        );
    }

    info!("Stopping control loop");

    match ctrl_loop_handle.stop() {
        Ok(()) => (),
        Err(_) => raise_error!("The control loop thread panicked"),
    }

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the commands incoming to the exec.
enum CmdSource {
    None,
    Script(ScriptInterpreter),
}
