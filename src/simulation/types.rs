//! Core types for the ring road simulation
//!
//! Identifiers, the car-following decision variants and the lane change
//! intent, plus the constants of the decision model.

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for car IDs
///
/// Car IDs index the track's vehicle arena and stay valid for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub SimId);

impl CarId {
    pub fn index(self) -> usize {
        self.0 .0
    }
}

/// Outcome of one pass through the car-following decision tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accelerate,
    Cruise,
    Decelerate,
}

/// Where a vehicle wants to go during a lane change pass
///
/// Lane 0 is the slow (rightmost) lane, so moving left increases the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneChange {
    Left,
    Stay,
    Right,
}

impl LaneChange {
    /// Signed change of lane index
    pub fn offset(self) -> isize {
        match self {
            LaneChange::Left => 1,
            LaneChange::Stay => 0,
            LaneChange::Right => -1,
        }
    }
}

/// Gaps shorter than this many seconds of travel put a vehicle in car-following mode
pub const NEAR_FIELD_HEADWAYS: f64 = 6.0;

/// A gap above this many seconds of travel is always safe to close
pub const SAFE_CLOSING_HEADWAYS: f64 = 3.0;

/// Lower bound, in seconds of travel, of the gap band in which a vehicle cruises
pub const CRUISE_HEADWAYS: f64 = 2.0;

/// Gaps in m at or below this never qualify for cruising behind a slower leader
pub const CRUISE_MIN_GAP: f64 = 7.5;

/// Speed in m/s at which the comfort acceleration drops to the high speed regime
pub const ACCELERATION_REGIME_SPEED: f64 = 12.19;

/// Comfort acceleration at low speed, in m/s^2
pub const LOW_SPEED_ACCELERATION: f64 = 1.1;

/// Comfort acceleration at high speed, in m/s^2
pub const HIGH_SPEED_ACCELERATION: f64 = 0.37;

/// Driver reaction time used by the safe speed model, in s
pub const REACTION_TIME: f64 = 1.0;

/// Noise draw used instead of a random one when vehicles are centrally coordinated
pub const CENTRAL_NOISE_DRAW: f64 = 0.5;

/// Horizon in s over which a speed push must not close the gap to the leader
pub const PUSH_HORIZON: f64 = 3.0;

/// A leader this much slower (m/s) makes the current lane unattractive
pub const OVERTAKE_SPEED_DEFICIT: f64 = 5.0;

/// Overtaking is considered when the leader is closer than this many seconds of travel
pub const OVERTAKE_HEADWAYS: f64 = 5.0;

/// A vehicle yields to the slow lane when that lane's leader is further than this, in m
pub const YIELD_CLEAR_DISTANCE: f64 = 200.0;
