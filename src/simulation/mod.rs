//! Ring road traffic simulation
//!
//! This module contains the vehicle decision model and the multi-lane track
//! that drives it. It runs headless and has no I/O of its own.

mod config;
mod history;
mod lane;
mod lane_change;
mod population;
mod run;
mod stats;
mod track;
mod types;
mod vehicle;

pub use config::{default_densities, LanePolicy, RunConfig, TrackConfig, VehicleParams};
pub use history::VehicleHistory;
pub use lane::Lane;
pub use lane_change::{bodies_overlap, CarSnapshot, LaneSides, SideLane};
pub use population::{initial_speed, lane_positions, split_counts, vehicle_count};
pub use run::{density_sweep, SimRun};
pub use stats::{fair_share_per_lane, mean_speed, RunSummary};
pub use track::Track;
pub use types::{
    CarId, Decision, LaneChange, SimId, ACCELERATION_REGIME_SPEED, HIGH_SPEED_ACCELERATION,
    LOW_SPEED_ACCELERATION, REACTION_TIME,
};
pub use vehicle::{CentralNudge, LeaderState, VehicleAgent};
