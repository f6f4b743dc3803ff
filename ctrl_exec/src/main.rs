//! Main trajectory control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and parameters
//!     - Select the mission
//!     - Connect to the vehicle interface and wait for the first odometry sample
//!     - Main loop, for each odometry sample:
//!         - Vehicle state update
//!         - Arrival checking
//!         - Control law processing, when a tick is due
//!         - Command publishing
//!     - Save the mission report

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use structopt::StructOpt;

// Internal
use comms_if::{
    net::{zmq, NetParams},
    odom::OdomSample,
};
use ctrl_lib::{
    cmd_publisher::{CommandPublisher, NetCmdPublisher},
    controller::Controller,
    ctrl_law,
    frame::{FrameTransformer, PoseFrameTransformer},
    mission::MissionTable,
    odom_client::{OdomClient, OdomClientError},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum time the main loop blocks waiting for a sample before checking for shutdown.
const SAMPLE_POLL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "ctrl_exec",
    about = "Closed loop trajectory following controller for a car-like vehicle"
)]
struct Opt {
    /// Mission to run, overrides `mission_index` in missions.toml
    #[structopt(short, long)]
    mission: Option<usize>,

    /// Log at trace level, including a report for every control tick
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    let log_level = match opt.verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Debug,
    };
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Trajectory Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let ctrl_params: ctrl_law::Params =
        util::params::load("ctrl.toml").wrap_err("Could not load control params")?;
    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let mission_table: MissionTable =
        util::params::load("missions.toml").wrap_err("Could not load the mission table")?;

    info!("Exec parameters loaded");

    // ---- SELECT MISSION ----

    let mission_index = opt.mission.unwrap_or(mission_table.mission_index);
    info!("Loading goals for configuration: {}", mission_index);

    let mission = mission_table
        .select(mission_index)
        .wrap_err("Could not load the mission")?;

    info!(
        "Mission {} \"{}\" has {} waypoints",
        mission.index,
        mission.name,
        mission.len()
    );

    // ---- SHUTDOWN HANDLING ----

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .wrap_err("Could not set the Ctrl-C handler")?;

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = zmq::Context::new();

    let odom_client =
        OdomClient::new(&zmq_ctx, &net_params).wrap_err("Could not start the odometry client")?;
    let cmd_publisher = NetCmdPublisher::new(&zmq_ctx, &net_params)
        .wrap_err("Could not start the command publisher")?;

    let mut controller = Controller::new(
        ctrl_params.clone(),
        &mission,
        PoseFrameTransformer,
        cmd_publisher,
        shutdown.clone(),
    );

    info!("Initialized control node");

    // ---- WAIT FOR ODOMETRY ----

    info!("Checking for odom...");

    let first_sample = match odom_client.wait_first_sample(
        Duration::from_secs_f64(ctrl_params.first_sample_timeout_s.max(0.0)),
        &shutdown,
    ) {
        Ok(s) => s,
        Err(OdomClientError::NoOdomData(timeout_s)) => {
            error!("No odom data!");
            return Err(eyre!(
                "No odometry received within {:.1} s of startup",
                timeout_s
            ));
        }
        Err(OdomClientError::Shutdown) => {
            info!("Shutdown requested before control started");
            return Ok(());
        }
        Err(e) => return Err(e).wrap_err("Failed waiting for the first odometry sample"),
    };

    info!("Starting control!");

    // ---- MAIN LOOP ----

    let outcome = control_loop(&mut controller, &odom_client, first_sample, &shutdown);

    // ---- SHUTDOWN ----

    // The report is saved however the loop exited
    let report = controller.report();
    let saved = session
        .save_json("mission_report.json", &report)
        .wrap_err("Could not save the mission report");

    if let Err(e) = outcome {
        if let Err(save_err) = saved {
            error!("{:?}", save_err);
        }
        return Err(e);
    }
    let report_path = saved?;

    info!(
        "Mission report saved to {:?}: {:?}, {} of {} waypoints passed",
        report_path, report.mode, report.num_passed, report.num_waypoints
    );

    info!("End of execution");

    Ok(())
}

/// Feed odometry samples to the controller until the mission ends or shutdown is requested.
///
/// A tick abandoned because of shutdown ends the loop cleanly, any other tick failure is
/// returned.
fn control_loop<T, P>(
    controller: &mut Controller<T, P>,
    odom_client: &OdomClient,
    first_sample: OdomSample,
    shutdown: &AtomicBool,
) -> Result<(), Report>
where
    T: FrameTransformer,
    P: CommandPublisher,
{
    let mut pending = Some(first_sample);

    while !controller.is_ended() {
        if shutdown.load(Ordering::Relaxed) {
            warn!("Shutdown requested, stopping before the mission ended");
            break;
        }

        let sample = match pending.take() {
            Some(s) => s,
            None => match odom_client
                .recv_timeout(SAMPLE_POLL)
                .wrap_err("Lost the odometry stream")?
            {
                Some(s) => s,
                None => continue,
            },
        };

        match controller.handle_sample(&sample) {
            Ok(_) => (),
            Err(e) if e.is_shutdown() => {
                warn!("Shutdown requested during a control tick, stopping");
                break;
            }
            Err(e) => {
                error!("Control tick failed: {}", e);
                return Err(e).wrap_err("Control tick failed");
            }
        }
    }

    Ok(())
}
