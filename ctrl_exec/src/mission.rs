//! # Missions
//!
//! A mission is an ordered list of waypoints, each tagged with a [`GoalType`] describing the role
//! the waypoint plays in the path geometry. Missions are static configuration: they are stored in
//! a mission table (`missions.toml`) and one is selected by index at startup.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

// Internal
use comms_if::cmd::Gear;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Arrival radius for straight and stop-and-go goals.
///
/// Units: meters
pub const TIGHT_ARRIVAL_RADIUS_M: f64 = 3.0;

/// Arrival radius for every other goal.
///
/// Units: meters
pub const WIDE_ARRIVAL_RADIUS_M: f64 = 5.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A target point in the map frame and its role in the mission.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    /// Target position in the map frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    pub goal_type: GoalType,
}

/// A loaded, validated mission.
#[derive(Debug, Clone)]
pub struct Mission {
    pub index: usize,
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

/// The raw mission table as stored in `missions.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionTable {
    /// Index of the mission to run.
    pub mission_index: usize,

    pub missions: Vec<MissionSpec>,
}

/// A single mission entry in the table.
///
/// Coordinates and goal types are parallel lists, so they must have the same length.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionSpec {
    pub index: usize,

    #[serde(default)]
    pub name: String,

    /// Waypoint coordinates in the map frame, `[x, y]`.
    pub points: Vec<[f64; 2]>,

    /// Goal type tags, see [`GoalType`] for the numbering.
    pub goal_types: Vec<u8>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The role of a waypoint in the path.
///
/// The numbering matches the tags used in the mission table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum GoalType {
    Straight = 0,
    PreCorner = 1,
    Corner = 2,
    PostCorner = 3,
    FinalApproach = 4,
    StopAndGoA = 5,
    ReverseStraight = 6,
    FinalStop = 7,
    ReversePreCorner = 8,
    ReverseCorner = 9,
    ReversePostCorner = 10,
    StopAndGoB = 11,
}

/// Errors raised while building a mission from the table.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("No mission with index {0} in the mission table")]
    UnknownMission(usize),

    #[error("Mission {0} has no waypoints")]
    EmptyMission(usize),

    #[error("Mission {index} has {num_points} points but {num_types} goal types")]
    LengthMismatch {
        index: usize,
        num_points: usize,
        num_types: usize,
    },

    #[error("Invalid goal type tag {0}, expected 0 to 11")]
    InvalidGoalType(u8),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoalType {
    /// Gear the vehicle must be in to approach a goal of this type.
    pub fn gear(&self) -> Gear {
        match self {
            GoalType::ReverseStraight
            | GoalType::ReversePreCorner
            | GoalType::ReverseCorner
            | GoalType::ReversePostCorner
            | GoalType::StopAndGoB => Gear::Reverse,
            _ => Gear::Forward,
        }
    }

    /// Distance inside which the vehicle is considered to have arrived at a goal of this type.
    pub fn arrival_radius_m(&self) -> f64 {
        match self {
            GoalType::Straight | GoalType::StopAndGoA | GoalType::StopAndGoB => {
                TIGHT_ARRIVAL_RADIUS_M
            }
            _ => WIDE_ARRIVAL_RADIUS_M,
        }
    }

    /// True if the vehicle should slow down on its approach to this goal.
    pub fn is_stop_and_go(&self) -> bool {
        matches!(self, GoalType::StopAndGoA | GoalType::StopAndGoB)
    }
}

impl TryFrom<u8> for GoalType {
    type Error = MissionError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => GoalType::Straight,
            1 => GoalType::PreCorner,
            2 => GoalType::Corner,
            3 => GoalType::PostCorner,
            4 => GoalType::FinalApproach,
            5 => GoalType::StopAndGoA,
            6 => GoalType::ReverseStraight,
            7 => GoalType::FinalStop,
            8 => GoalType::ReversePreCorner,
            9 => GoalType::ReverseCorner,
            10 => GoalType::ReversePostCorner,
            11 => GoalType::StopAndGoB,
            t => return Err(MissionError::InvalidGoalType(t)),
        })
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u8)
    }
}

impl Waypoint {
    pub fn new(x: f64, y: f64, goal_type: GoalType) -> Self {
        Self {
            position_m: Vector2::new(x, y),
            goal_type,
        }
    }
}

impl Mission {
    /// Build a mission from a table entry, validating its contents.
    pub fn from_spec(spec: &MissionSpec) -> Result<Self, MissionError> {
        if spec.points.len() != spec.goal_types.len() {
            return Err(MissionError::LengthMismatch {
                index: spec.index,
                num_points: spec.points.len(),
                num_types: spec.goal_types.len(),
            });
        }

        if spec.points.is_empty() {
            return Err(MissionError::EmptyMission(spec.index));
        }

        let waypoints = spec
            .points
            .iter()
            .zip(spec.goal_types.iter())
            .map(|(p, t)| Ok(Waypoint::new(p[0], p[1], GoalType::try_from(*t)?)))
            .collect::<Result<Vec<_>, MissionError>>()?;

        Ok(Self {
            index: spec.index,
            name: spec.name.clone(),
            waypoints,
        })
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

impl MissionTable {
    /// Select the mission given by `mission_index`.
    pub fn selected(&self) -> Result<Mission, MissionError> {
        self.select(self.mission_index)
    }

    /// Select a mission by its index.
    pub fn select(&self, index: usize) -> Result<Mission, MissionError> {
        let spec = self
            .missions
            .iter()
            .find(|m| m.index == index)
            .ok_or(MissionError::UnknownMission(index))?;

        Mission::from_spec(spec)
    }
}
