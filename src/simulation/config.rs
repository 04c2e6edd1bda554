//! Configuration for vehicles, the track and a simulation run

use anyhow::Result;

/// Behavioural parameters shared by every vehicle placed on a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleParams {
    /// Free-flow target speed in m/s
    pub desired_speed: f64,
    /// Hard speed ceiling in m/s
    pub max_speed: f64,
    /// Body length in m
    pub length: f64,
    /// Normal deceleration in m/s^2
    pub a_normal: f64,
    /// Maximum deceleration in m/s^2
    pub a_max: f64,
    /// Driver noise coefficient (b), in m/s
    pub noise: f64,
    /// Preferred time headway (TP) in s
    pub time_headway: f64,
    /// Probability (AC) of pushing the lane mean speed up under central control
    pub eagerness: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            desired_speed: 30.0,
            max_speed: 35.0,
            length: 5.0,
            a_normal: 3.05,
            a_max: 6.04,
            noise: 0.2,
            time_headway: 1.2,
            eagerness: 0.5,
        }
    }
}

impl VehicleParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.length > 0.0 && self.length.is_finite()) {
            anyhow::bail!("Vehicle length must be positive, got {}", self.length);
        }
        if !(self.max_speed >= 0.0) {
            anyhow::bail!("Vehicle max speed must not be negative, got {}", self.max_speed);
        }
        if !(self.a_max > 0.0) {
            anyhow::bail!("Vehicle a_max must be positive, got {}", self.a_max);
        }
        if !(0.0..=1.0).contains(&self.eagerness) {
            anyhow::bail!("Vehicle eagerness must be a probability, got {}", self.eagerness);
        }
        Ok(())
    }
}

/// The decentralized lane change policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanePolicy {
    /// Pass on the left, yield back to the slow lane when it is clear
    #[default]
    Traditional,
    /// Leave a slow leader for any free lane, left first
    Greedy,
}

/// Static configuration of a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackConfig {
    pub lane_count: usize,
    /// Circumference in m
    pub length: f64,
    /// Timestep in s
    pub dt: f64,
    pub central_control: bool,
    /// Largest correction towards the lane mean speed per step, in m/s
    pub max_accel: f64,
    /// Speed added by an eager vehicle under central control, in m/s
    pub speed_push: f64,
    pub lane_policy: LanePolicy,
    /// Number of committed steps each vehicle keeps in its history
    pub history_capacity: usize,
    pub vehicle: VehicleParams,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            lane_count: 2,
            length: 2000.0,
            dt: 1.0,
            central_control: false,
            max_accel: 1.0,
            speed_push: 0.5,
            lane_policy: LanePolicy::Traditional,
            history_capacity: 2000,
            vehicle: VehicleParams::default(),
        }
    }
}

impl TrackConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lane_count == 0 {
            anyhow::bail!("A track needs at least one lane");
        }
        if !(self.length > 0.0 && self.length.is_finite()) {
            anyhow::bail!("Track length must be positive, got {}", self.length);
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            anyhow::bail!("Timestep must be positive, got {}", self.dt);
        }
        if !(self.max_accel >= 0.0) {
            anyhow::bail!("max_accel must not be negative, got {}", self.max_accel);
        }
        if !(self.speed_push >= 0.0) {
            anyhow::bail!("speed_push must not be negative, got {}", self.speed_push);
        }
        self.vehicle.validate()
    }
}

/// Configuration of a full run over one or more densities
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub track: TrackConfig,
    /// Simulated duration of each run in s
    pub total_time: f64,
    /// Densities in vehicles per km
    pub densities: Vec<f64>,
    /// Split vehicles evenly across lanes instead of at random split points
    pub equal_lanes: bool,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            total_time: 2000.0,
            densities: default_densities(),
            equal_lanes: false,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Number of timesteps in one run
    pub fn steps(&self) -> usize {
        (self.total_time / self.track.dt) as usize
    }

    pub fn validate(&self) -> Result<()> {
        self.track.validate()?;
        if !(self.total_time >= 0.0 && self.total_time.is_finite()) {
            anyhow::bail!("Total time must not be negative, got {}", self.total_time);
        }
        Ok(())
    }
}

/// Ten evenly spaced densities from 0 to 140 vehicles per km
pub fn default_densities() -> Vec<f64> {
    const POINTS: usize = 10;
    const MAX_DENSITY: f64 = 140.0;
    (0..POINTS)
        .map(|i| MAX_DENSITY * i as f64 / (POINTS - 1) as f64)
        .collect()
}
