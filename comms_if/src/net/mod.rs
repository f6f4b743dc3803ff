//! # Network Module
//!
//! This module provides networking helpers over ZMQ. Odometry arrives on a SUB socket and
//! commands leave on a PUB socket, both carrying JSON strings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::Deserialize;
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| SocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Endpoint on which odometry samples are published by the vehicle interface.
    pub odom_endpoint: String,

    /// Endpoint the controller binds to publish vehicle commands.
    pub cmd_endpoint: String,
}

/// Represents options which can be set on a socket.
///
/// Options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint rather than connect to it.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_SUBSCRIBE`: prefix filter for SUB sockets. Ignored for other socket types.
    ///
    /// The default value is empty, which subscribes to everything.
    pub subscribe: Vec<u8>,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum SocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), SocketError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        if let Ok(SocketType::SUB) = socket.get_socket_type() {
            set_sockopts!(socket, (set_subscribe, &self.subscribe));
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            subscribe: Vec::new(),
            linger: 30_000,
            reconnect_ivl: 100,
            connect_timeout: 0,
            recv_timeout: -1,
            send_timeout: -1,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a socket of the given type, configure it, and bind or connect it to `endpoint`.
pub fn open_socket(
    ctx: &Context,
    socket_type: SocketType,
    socket_options: &SocketOptions,
    endpoint: &str,
) -> Result<Socket, SocketError> {
    let socket = ctx
        .socket(socket_type)
        .map_err(SocketError::CreateSocketError)?;

    socket_options.set(&socket)?;

    match socket_options.bind {
        false => socket.connect(endpoint),
        true => socket.bind(endpoint),
    }
    .map_err(|e| SocketError::CouldNotConnect(endpoint.into(), e))?;

    debug!(
        "{:?} socket {} {}",
        socket_type,
        if socket_options.bind { "bound to" } else { "connected to" },
        endpoint
    );

    Ok(socket)
}
