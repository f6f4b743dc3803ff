//! # Controller
//!
//! Ties the parts of the control loop together. The controller owns all mission state and is
//! driven entirely by odometry samples: each sample updates the vehicle state, advances the
//! timers, checks for arrival at the active goal, and runs a control tick when one is due.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;
use std::{
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

// Internal
use crate::{
    cmd_publisher::CommandPublisher,
    ctrl_law::{ControlLawEngine, Mode, Params, TickInput, TickReport},
    frame::{transform_with_retry, FrameTransformer, TransformError},
    mission::Mission,
    odom_ingest::{OdomIngest, SampleTiming},
    vehicle::VehicleState,
    waypoint_seq::WaypointSequencer,
};
use comms_if::odom::OdomSample;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed loop trajectory following controller for a single mission.
pub struct Controller<T, P>
where
    T: FrameTransformer,
    P: CommandPublisher,
{
    mission_index: usize,
    mission_name: String,
    num_waypoints: usize,

    ingest: OdomIngest,
    sequencer: WaypointSequencer,
    engine: ControlLawEngine,

    transformer: T,
    publisher: P,

    transform_retry_delay: Duration,
    transform_timeout: Duration,
    shutdown: Arc<AtomicBool>,

    state: VehicleState,

    num_samples: usize,
    num_ticks: usize,
    last_tick: Option<TickReport>,
}

/// Summary of a mission, written to the session directory when the mission ends.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub mission_index: usize,
    pub mission_name: String,
    pub mode: Mode,

    /// Units: seconds
    pub mission_elapsed_s: f64,

    /// Units: seconds
    pub ended_at_s: Option<f64>,

    pub num_waypoints: usize,
    pub num_passed: usize,
    pub num_remaining: usize,
    pub num_samples: usize,
    pub num_ticks: usize,

    pub final_state: VehicleState,
    pub last_tick: Option<TickReport>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CtrlError {
    #[error("Could not transform the goal into the vehicle frame: {0}")]
    Transform(TransformError),

    #[error("The mission has no goal to steer towards")]
    NoGoal,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlError {
    /// True if the tick was abandoned because shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, CtrlError::Transform(TransformError::Shutdown))
    }
}

impl<T, P> Controller<T, P>
where
    T: FrameTransformer,
    P: CommandPublisher,
{
    pub fn new(
        params: Params,
        mission: &Mission,
        transformer: T,
        publisher: P,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            mission_index: mission.index,
            mission_name: mission.name.clone(),
            num_waypoints: mission.len(),
            ingest: OdomIngest::new(params.period_s, params.period_tolerance),
            sequencer: WaypointSequencer::new(mission),
            transform_retry_delay: Duration::from_secs_f64(
                params.transform_retry_delay_s.max(0.0),
            ),
            transform_timeout: Duration::from_secs_f64(params.transform_timeout_s.max(0.0)),
            engine: ControlLawEngine::new(params),
            transformer,
            publisher,
            shutdown,
            state: VehicleState::default(),
            num_samples: 0,
            num_ticks: 0,
            last_tick: None,
        }
    }

    /// Process a single odometry sample.
    ///
    /// Returns the report of the control tick run for this sample, if any. Once the mission has
    /// ended samples are ignored.
    pub fn handle_sample(
        &mut self,
        sample: &OdomSample,
    ) -> Result<Option<TickReport>, CtrlError> {
        if self.is_ended() {
            return Ok(None);
        }

        self.num_samples += 1;
        self.state = VehicleState::from(sample);

        let mut report = None;

        match self.ingest.absorb(sample.timestamp_s) {
            SampleTiming::Bootstrap => report = self.tick()?,
            SampleTiming::Advanced { dt_s } => trace!(
                "Sample at {:.3} s, step {:.3} s, {:.3} s since the last tick",
                sample.timestamp_s,
                dt_s,
                self.ingest.since_last_tick_s()
            ),
        }

        self.sequencer.check_arrival(&self.state.position_m);

        if self.ingest.tick_due() {
            report = self.tick()?;
        }

        Ok(report)
    }

    /// Run one control tick against the current vehicle state.
    fn tick(&mut self) -> Result<Option<TickReport>, CtrlError> {
        if self.engine.end_if_stopping(self.ingest.mission_elapsed_s()) {
            return Ok(None);
        }

        let goal = self.sequencer.current_goal().ok_or(CtrlError::NoGoal)?;

        let local_goal_m = transform_with_retry(
            &mut self.transformer,
            &goal.position_m,
            &self.state,
            self.transform_retry_delay,
            self.transform_timeout,
            &self.shutdown,
        )
        .map_err(CtrlError::Transform)?;

        let input = TickInput {
            local_goal_m,
            speed_ms: self.state.speed_ms(),
            goal_type: goal.goal_type,
        };

        let report = self.engine.step(&input, &mut self.publisher);

        self.num_ticks += 1;
        self.last_tick = Some(report);

        if report.mode != Mode::Moving && report.mode != Mode::NotStarted {
            debug!(
                "Entered {:?} at {:.2} m from the goal",
                report.mode, report.distance_m
            );
        }

        Ok(Some(report))
    }

    /// True once the mission has ended and no further commands will be issued.
    pub fn is_ended(&self) -> bool {
        self.engine.mode() == Mode::Ended
    }

    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    pub fn engine(&self) -> &ControlLawEngine {
        &self.engine
    }

    pub fn sequencer(&self) -> &WaypointSequencer {
        &self.sequencer
    }

    pub fn vehicle_state(&self) -> &VehicleState {
        &self.state
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Build a report of the mission so far.
    pub fn report(&self) -> MissionReport {
        MissionReport {
            mission_index: self.mission_index,
            mission_name: self.mission_name.clone(),
            mode: self.engine.mode(),
            mission_elapsed_s: self.ingest.mission_elapsed_s(),
            ended_at_s: self.engine.state().ended_at_s,
            num_waypoints: self.num_waypoints,
            num_passed: self.sequencer.num_passed(),
            num_remaining: self.sequencer.remaining(),
            num_samples: self.num_samples,
            num_ticks: self.num_ticks,
            final_state: self.state,
            last_tick: self.last_tick,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        cmd_publisher::RecordingPublisher,
        frame::{FlakyTransformer, PoseFrameTransformer},
        mission::{GoalType, Waypoint},
    };
    use comms_if::cmd::{Gear, VehicleCmd};
    use std::f64::consts::FRAC_PI_2;

    fn mission(waypoints: Vec<Waypoint>) -> Mission {
        Mission {
            index: 1,
            name: String::from("test"),
            waypoints,
        }
    }

    /// Sample for a vehicle on the Y axis, facing +Y.
    fn sample(t: f64, y: f64, speed: f64) -> OdomSample {
        OdomSample {
            position_m: [0.0, y, 0.0],
            yaw_rad: FRAC_PI_2,
            velocity_ms: [0.0, speed, 0.0],
            timestamp_s: t,
        }
    }

    fn controller<T: FrameTransformer>(
        waypoints: Vec<Waypoint>,
        transformer: T,
    ) -> Controller<T, RecordingPublisher> {
        Controller::new(
            Params::default(),
            &mission(waypoints),
            transformer,
            RecordingPublisher::new(),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn test_single_final_stop() {
        let mut ctrl = controller(
            vec![Waypoint::new(0.0, 10.0, GoalType::FinalStop)],
            PoseFrameTransformer,
        );

        // Bootstrap tick, stationary at the origin
        let first = ctrl.handle_sample(&sample(0.0, 0.0, 0.0)).unwrap().unwrap();
        assert_eq!(first.throttle, 0.5);
        assert_eq!(first.gear, Gear::Forward);
        assert_eq!(first.distance_m, 10.0);
        assert_eq!(
            &ctrl.publisher().cmds[..2],
            &[VehicleCmd::Gear(Gear::Forward), VehicleCmd::Throttle(0.5)]
        );

        // Accelerate to 3 m/s along +Y over 50 ms samples
        let mut y = 0.0;
        let mut reports = vec![first];
        let mut i = 1;
        while !ctrl.is_ended() && i < 1000 {
            let speed = (i as f64 * 0.1).min(3.0);
            y += speed * 0.05;

            if let Some(r) = ctrl.handle_sample(&sample(i as f64 * 0.05, y, speed)).unwrap() {
                reports.push(r);
            }
            i += 1;
        }
        assert!(ctrl.is_ended());

        // Steering only recalculated above 1 m/s
        assert!(reports
            .iter()
            .filter(|r| r.speed_ms <= 1.0)
            .all(|r| !r.steering_recomputed));
        assert!(reports.iter().any(|r| r.steering_recomputed));

        // Stopped inside 3 m with the throttle cut
        let last = reports.last().unwrap();
        assert_eq!(last.mode, Mode::Stopping);
        assert!(last.distance_m < 3.0);
        assert_eq!(last.throttle, 0.0);
        assert_eq!(ctrl.publisher().throttles().last(), Some(&0.0));

        // Passed the only waypoint and held it as the goal
        assert_eq!(ctrl.sequencer().num_passed(), 1);
        assert!(ctrl.sequencer().current_goal().is_some());

        let report = ctrl.report();
        assert_eq!(report.mode, Mode::Ended);
        assert!(report.ended_at_s.unwrap() > 0.0);

        // No commands once ended
        let num_cmds = ctrl.publisher().cmds.len();
        for j in 0..20 {
            let t = (i + j) as f64 * 0.05;
            assert!(ctrl.handle_sample(&sample(t, y, 0.0)).unwrap().is_none());
        }
        assert_eq!(ctrl.publisher().cmds.len(), num_cmds);
        assert_eq!(ctrl.report().ended_at_s, report.ended_at_s);
    }

    #[test]
    fn test_tick_cadence() {
        let mut ctrl = controller(
            vec![Waypoint::new(0.0, 100.0, GoalType::Straight)],
            PoseFrameTransformer,
        );

        let mut ticks = vec![];
        for i in 0..=8 {
            let t = i as f64 * 0.05;
            if ctrl.handle_sample(&sample(t, 0.0, 0.0)).unwrap().is_some() {
                ticks.push(i);
            }
        }

        assert_eq!(ticks, vec![0, 4, 8]);
        assert_eq!(ctrl.report().num_ticks, 3);
        assert_eq!(ctrl.report().num_samples, 9);
    }

    #[test]
    fn test_arrival_checked_after_bootstrap_tick() {
        let mut ctrl = controller(
            vec![
                Waypoint::new(0.0, 1.0, GoalType::Straight),
                Waypoint::new(0.0, 50.0, GoalType::FinalStop),
            ],
            PoseFrameTransformer,
        );

        // Bootstrap tick steers to the first goal, then the goal is passed
        let r = ctrl.handle_sample(&sample(0.0, 0.0, 0.0)).unwrap().unwrap();
        assert_eq!(r.distance_m, 1.0);
        assert_eq!(r.goal_type, GoalType::Straight);

        assert_eq!(ctrl.sequencer().num_passed(), 1);
        assert_eq!(
            ctrl.sequencer().current_goal(),
            Some(Waypoint::new(0.0, 50.0, GoalType::FinalStop))
        );
    }

    #[test]
    fn test_reverse_goal_gear() {
        let mut ctrl = controller(
            vec![Waypoint::new(0.0, -30.0, GoalType::ReverseStraight)],
            PoseFrameTransformer,
        );

        let r = ctrl.handle_sample(&sample(0.0, 0.0, 0.0)).unwrap().unwrap();
        assert_eq!(r.gear, Gear::Reverse);
        assert_eq!(ctrl.publisher().gears(), vec![Gear::Reverse]);
    }

    #[test]
    fn test_transient_transform_failure() {
        let mut ctrl = controller(
            vec![Waypoint::new(0.0, 10.0, GoalType::Straight)],
            FlakyTransformer {
                failures_left: 2,
                ..Default::default()
            },
        );

        let r = ctrl.handle_sample(&sample(0.0, 0.0, 0.0)).unwrap();
        assert!(r.is_some());
        assert_eq!(ctrl.transformer.num_calls, 3);
    }

    #[test]
    fn test_transform_timeout() {
        let params = Params {
            transform_timeout_s: 0.01,
            ..Default::default()
        };
        let mut ctrl = Controller::new(
            params,
            &mission(vec![Waypoint::new(0.0, 10.0, GoalType::Straight)]),
            FlakyTransformer {
                failures_left: usize::MAX,
                ..Default::default()
            },
            RecordingPublisher::new(),
            Arc::new(AtomicBool::new(false)),
        );

        match ctrl.handle_sample(&sample(0.0, 0.0, 0.0)) {
            Err(e @ CtrlError::Transform(TransformError::TimedOut(_))) => {
                assert!(!e.is_shutdown())
            }
            r => panic!("Expected a transform timeout, got {:?}", r),
        }
        assert!(ctrl.publisher().cmds.is_empty());
    }

    #[test]
    fn test_shutdown_during_transform() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut ctrl = Controller::new(
            Params::default(),
            &mission(vec![Waypoint::new(0.0, 10.0, GoalType::Straight)]),
            FlakyTransformer {
                failures_left: usize::MAX,
                ..Default::default()
            },
            RecordingPublisher::new(),
            shutdown.clone(),
        );

        shutdown.store(true, std::sync::atomic::Ordering::SeqCst);

        match ctrl.handle_sample(&OdomSample::default()) {
            Err(e) => {
                assert!(e.is_shutdown(), "Expected shutdown, got {:?}", e);
                assert!(matches!(e, CtrlError::Transform(TransformError::Shutdown)));
            }
            r => panic!("Expected shutdown, got {:?}", r),
        }
        assert_eq!(ctrl.transformer.num_calls, 1);
        assert!(ctrl.publisher().cmds.is_empty());

        // The report is still available after an abandoned tick
        let report = ctrl.report();
        assert_eq!(report.mode, Mode::NotStarted);
        assert_eq!(report.num_samples, 1);
        assert_eq!(report.num_ticks, 0);
    }

    #[test]
    fn test_empty_mission() {
        let mut ctrl = controller(vec![], PoseFrameTransformer);

        match ctrl.handle_sample(&sample(0.0, 0.0, 0.0)) {
            Err(CtrlError::NoGoal) => (),
            r => panic!("Expected NoGoal, got {:?}", r),
        }
    }
}
