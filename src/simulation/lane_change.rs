//! Lane change feasibility and intent
//!
//! Vehicles reason about copies of their neighbors taken before any lane
//! change of the current pass is applied.

use super::config::LanePolicy;
use super::types::{
    CarId, LaneChange, OVERTAKE_HEADWAYS, OVERTAKE_SPEED_DEFICIT, YIELD_CLEAR_DISTANCE,
};
use super::vehicle::VehicleAgent;

/// A copy of the fields of a neighbor that lane changing looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarSnapshot {
    pub id: CarId,
    pub position: f64,
    pub length: f64,
    pub speed: f64,
}

impl From<&VehicleAgent> for CarSnapshot {
    fn from(vehicle: &VehicleAgent) -> Self {
        Self {
            id: vehicle.id,
            position: vehicle.position,
            length: vehicle.length(),
            speed: vehicle.current_speed,
        }
    }
}

/// The state of a lane next to a vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SideLane {
    /// No lane exists on this side
    Absent,
    Empty,
    Occupied {
        front: CarSnapshot,
        back: CarSnapshot,
    },
}

impl SideLane {
    pub fn front(&self) -> Option<&CarSnapshot> {
        match self {
            SideLane::Occupied { front, .. } => Some(front),
            _ => None,
        }
    }
}

/// The lanes on both sides of a vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSides {
    /// The faster lane, index + 1
    pub left: SideLane,
    /// The slower lane, index - 1
    pub right: SideLane,
}

/// Whether two bodies `(position - length, position]` overlap on a ring of
/// the given circumference.
pub fn bodies_overlap(a_pos: f64, a_len: f64, b_pos: f64, b_len: f64, road_length: f64) -> bool {
    let ahead = (b_pos - a_pos).rem_euclid(road_length);
    ahead < b_len || road_length - ahead < a_len
}

impl VehicleAgent {
    /// Whether the vehicle fits between the neighbors it would have in `side`.
    ///
    /// A lone neighbor is checked for overlap on the ring. With two distinct
    /// neighbors, one found by wrapping around the start of the road is
    /// treated as blocking.
    pub fn can_switch_lane(&self, side: &SideLane, road_length: f64) -> bool {
        match side {
            SideLane::Absent => false,
            SideLane::Empty => true,
            SideLane::Occupied { front, back } if front.id == back.id => !bodies_overlap(
                self.position,
                self.length(),
                front.position,
                front.length,
                road_length,
            ),
            SideLane::Occupied { front, back } => {
                if self.position > front.position - front.length {
                    false
                } else {
                    self.position - self.length() >= back.position
                }
            }
        }
    }

    /// Feasibility of moving (left, right)
    pub fn can_switch_lanes(&self, sides: &LaneSides, road_length: f64) -> (bool, bool) {
        (
            self.can_switch_lane(&sides.left, road_length),
            self.can_switch_lane(&sides.right, road_length),
        )
    }

    /// Distance ahead to `other`, wrapping around the road
    fn distance_to(&self, other: &CarSnapshot, road_length: f64) -> f64 {
        (other.position - self.position).rem_euclid(road_length)
    }

    /// Whether `front` is slow and close enough that another lane is preferred
    fn is_held_up_by(&self, front: &CarSnapshot, road_length: f64) -> bool {
        let speed_difference = front.speed - self.current_speed;
        let gap = self.distance_to(front, road_length);
        speed_difference < -OVERTAKE_SPEED_DEFICIT && gap < self.current_speed * OVERTAKE_HEADWAYS
    }

    /// Leave a slow leader for any free lane, trying the left first.
    pub fn greedy_lane_switch(
        &self,
        front: &CarSnapshot,
        sides: &LaneSides,
        road_length: f64,
    ) -> LaneChange {
        match self.can_switch_lanes(sides, road_length) {
            (false, false) => LaneChange::Stay,
            _ if !self.is_held_up_by(front, road_length) => LaneChange::Stay,
            (true, _) => LaneChange::Left,
            (false, true) => LaneChange::Right,
        }
    }

    /// Pass slow leaders on the left, otherwise drift back into the slow lane
    /// when it is clear for a long stretch.
    pub fn traditional_lane_switch(
        &self,
        front: &CarSnapshot,
        sides: &LaneSides,
        road_length: f64,
    ) -> LaneChange {
        let (can_go_left, can_go_right) = self.can_switch_lanes(sides, road_length);
        if !can_go_left && !can_go_right {
            return LaneChange::Stay;
        }

        if self.is_held_up_by(front, road_length) {
            return if can_go_left {
                LaneChange::Left
            } else {
                LaneChange::Stay
            };
        }

        if can_go_right {
            match sides.right.front() {
                None => return LaneChange::Right,
                Some(front_right) if self.distance_to(front_right, road_length) > YIELD_CLEAR_DISTANCE => {
                    return LaneChange::Right;
                }
                Some(_) => {}
            }
        }

        LaneChange::Stay
    }

    /// Where this vehicle wants to be after the lane change pass.
    ///
    /// Must be resolved for every vehicle before accelerations are computed,
    /// otherwise a vehicle would not respond to its new leader.
    pub fn lane_switch(
        &self,
        policy: LanePolicy,
        front: &CarSnapshot,
        sides: &LaneSides,
        road_length: f64,
    ) -> LaneChange {
        match policy {
            LanePolicy::Traditional => self.traditional_lane_switch(front, sides, road_length),
            LanePolicy::Greedy => self.greedy_lane_switch(front, sides, road_length),
        }
    }
}
