//! # Command publisher
//!
//! The controller writes its demands to the vehicle through the [`CommandPublisher`] trait. Each
//! channel is fire-and-forget, no acknowledgement is waited for.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};

use comms_if::{
    cmd::{Gear, VehicleCmd},
    net::{open_socket, zmq, NetParams, SocketError, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for vehicle commands.
pub trait CommandPublisher {
    fn set_gear(&mut self, gear: Gear);

    fn set_throttle(&mut self, throttle: f64);

    /// Set the steering demand, already in the actuator's sign convention.
    fn set_steering(&mut self, steering_rad: f64);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Publishes commands as JSON over a ZMQ PUB socket.
pub struct NetCmdPublisher {
    socket: zmq::Socket,
}

/// Keeps every command it is given, in order.
///
/// Used where the commands are inspected rather than sent, such as tests and benchmarks.
#[derive(Debug, Default, Clone)]
pub struct RecordingPublisher {
    pub cmds: Vec<VehicleCmd>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdPublisherError {
    #[error("Socket error: {0}")]
    SocketError(SocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetCmdPublisher {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, CmdPublisherError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 100,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = open_socket(ctx, zmq::PUB, &socket_options, &params.cmd_endpoint)
            .map_err(CmdPublisherError::SocketError)?;

        Ok(Self { socket })
    }

    fn send(&self, cmd: VehicleCmd) {
        let msg = match serde_json::to_string(&cmd) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not serialize {:?}: {}", cmd, e);
                return;
            }
        };

        trace!("Publishing {}", msg);

        if let Err(e) = self.socket.send(msg.as_str(), 0) {
            warn!("Could not publish {:?}: {}", cmd, e);
        }
    }
}

impl CommandPublisher for NetCmdPublisher {
    fn set_gear(&mut self, gear: Gear) {
        self.send(VehicleCmd::Gear(gear))
    }

    fn set_throttle(&mut self, throttle: f64) {
        self.send(VehicleCmd::Throttle(throttle))
    }

    fn set_steering(&mut self, steering_rad: f64) {
        self.send(VehicleCmd::Steering(steering_rad))
    }
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All gear commands, in order.
    pub fn gears(&self) -> Vec<Gear> {
        self.cmds
            .iter()
            .filter_map(|c| match c {
                VehicleCmd::Gear(g) => Some(*g),
                _ => None,
            })
            .collect()
    }

    /// All throttle commands, in order.
    pub fn throttles(&self) -> Vec<f64> {
        self.cmds
            .iter()
            .filter_map(|c| match c {
                VehicleCmd::Throttle(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    /// All steering commands, in order.
    pub fn steerings(&self) -> Vec<f64> {
        self.cmds
            .iter()
            .filter_map(|c| match c {
                VehicleCmd::Steering(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.cmds.clear()
    }
}

impl CommandPublisher for RecordingPublisher {
    fn set_gear(&mut self, gear: Gear) {
        self.cmds.push(VehicleCmd::Gear(gear))
    }

    fn set_throttle(&mut self, throttle: f64) {
        self.cmds.push(VehicleCmd::Throttle(throttle))
    }

    fn set_steering(&mut self, steering_rad: f64) {
        self.cmds.push(VehicleCmd::Steering(steering_rad))
    }
}
