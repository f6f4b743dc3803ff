//! # Odometry client
//!
//! Receives odometry samples published by the vehicle interface. A background thread reads the
//! SUB socket and forwards each decoded sample, in arrival order, over a channel to the control
//! loop. The control loop then processes one sample at a time.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::{
    net::{open_socket, zmq, NetParams, SocketError, SocketOptions},
    odom::OdomSample,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest single wait inside [`OdomClient::wait_first_sample`], so shutdown is noticed promptly.
const FIRST_SAMPLE_POLL: Duration = Duration::from_millis(100);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct OdomClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    samples: Receiver<OdomSample>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum OdomClientError {
    #[error("Socket error: {0}")]
    SocketError(SocketError),

    #[error("The odometry background thread has stopped")]
    Disconnected,

    #[error("No odometry data received within {0:.1} s")]
    NoOdomData(f64),

    #[error("Shutdown requested while waiting for odometry")]
    Shutdown,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OdomClient {
    /// Connect to the odometry endpoint and start the background thread.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, OdomClientError> {
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            ..Default::default()
        };

        let socket = open_socket(ctx, zmq::SUB, &socket_options, &params.odom_endpoint)
            .map_err(OdomClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        let (tx, rx) = mpsc::channel();

        let bg_jh = Some(thread::spawn(move || bg_thread(socket, bg_run_clone, tx)));

        Ok(Self {
            bg_jh,
            bg_run,
            samples: rx,
        })
    }

    /// Wait up to `timeout` for the next sample.
    ///
    /// Returns `Ok(None)` if no sample arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<OdomSample>, OdomClientError> {
        match self.samples.recv_timeout(timeout) {
            Ok(s) => Ok(Some(s)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(OdomClientError::Disconnected),
        }
    }

    /// Wait for the first sample of the mission.
    ///
    /// Fails with `NoOdomData` if nothing arrives within `timeout`, or `Shutdown` if `shutdown`
    /// is raised while waiting.
    pub fn wait_first_sample(
        &self,
        timeout: Duration,
        shutdown: &AtomicBool,
    ) -> Result<OdomSample, OdomClientError> {
        let start = Instant::now();

        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Err(OdomClientError::Shutdown);
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(OdomClientError::NoOdomData(timeout.as_secs_f64()));
            }

            let slice = (timeout - waited).min(FIRST_SAMPLE_POLL);

            if let Some(sample) = self.recv_timeout(slice)? {
                info!("First odometry sample at t = {:.3} s", sample.timestamp_s);
                return Ok(sample);
            }
        }
    }
}

impl Drop for OdomClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("Odometry background thread panicked");
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, forwards each sample published by the vehicle interface.
fn bg_thread(socket: zmq::Socket, run: Arc<AtomicBool>, samples: Sender<OdomSample>) {
    while run.load(Ordering::Relaxed) {
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message on the odometry socket");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving odometry: {:?}", e);
                break;
            }
        };

        let sample: OdomSample = match serde_json::from_str(&msg) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not deserialize odometry sample, dropping it: {}", e);
                continue;
            }
        };

        // Receiver gone means the controller has exited
        if samples.send(sample).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(endpoint: &str) -> NetParams {
        NetParams {
            odom_endpoint: endpoint.into(),
            cmd_endpoint: "inproc://unused".into(),
        }
    }

    #[test]
    fn test_receive_samples() {
        let ctx = zmq::Context::new();

        let publisher = open_socket(
            &ctx,
            zmq::PUB,
            &SocketOptions {
                bind: true,
                linger: 0,
                ..Default::default()
            },
            "inproc://odom_client_test",
        )
        .unwrap();

        let client = OdomClient::new(&ctx, &params("inproc://odom_client_test")).unwrap();

        // Publish until the subscription is established and the test has seen a sample
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();
        let pub_jh = thread::spawn(move || {
            let sample = OdomSample {
                position_m: [1.0, 2.0, 0.0],
                yaw_rad: 0.5,
                velocity_ms: [0.0, 0.0, 0.0],
                timestamp_s: 3.0,
            };
            let msg = serde_json::to_string(&sample).unwrap();

            while !stop_clone.load(Ordering::Relaxed) {
                publisher.send("not json", 0).unwrap();
                publisher.send(msg.as_str(), 0).unwrap();
                thread::sleep(Duration::from_millis(5));
            }
        });

        let first = client
            .wait_first_sample(Duration::from_secs(5), &AtomicBool::new(false))
            .unwrap();

        stop.store(true, Ordering::Relaxed);
        pub_jh.join().unwrap();

        assert_eq!(first.position_m, [1.0, 2.0, 0.0]);
        assert_eq!(first.timestamp_s, 3.0);
    }

    #[test]
    fn test_no_odom_data() {
        let ctx = zmq::Context::new();
        let client = OdomClient::new(&ctx, &params("inproc://odom_client_silent")).unwrap();

        match client.wait_first_sample(Duration::from_millis(50), &AtomicBool::new(false)) {
            Err(OdomClientError::NoOdomData(_)) => (),
            r => panic!("Expected NoOdomData, got {:?}", r),
        }

        match client.wait_first_sample(Duration::from_secs(60), &AtomicBool::new(true)) {
            Err(OdomClientError::Shutdown) => (),
            r => panic!("Expected Shutdown, got {:?}", r),
        }
    }
}
