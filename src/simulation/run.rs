//! Thin driver that runs a track for a fixed number of timesteps
//!
//! One `SimRun` covers one density. It calls the track phases in the only
//! valid order and counts crossings for the flow statistic.

use anyhow::{Context, Result};
use log::debug;

use super::config::RunConfig;
use super::stats::{self, RunSummary};
use super::track::Track;

pub struct SimRun {
    track: Track,
    density: f64,
    /// Lane quotas for centralized lane changes, fixed at population time
    preferred_per_lane: Vec<usize>,
    steps: usize,
    tick: usize,
    crossings: usize,
}

impl SimRun {
    /// Build and populate a track for one density
    pub fn new(config: &RunConfig, density: f64) -> Result<Self> {
        config.validate()?;
        let mut track = match config.seed {
            Some(seed) => Track::with_seed(config.track.clone(), seed)?,
            None => Track::new(config.track.clone())?,
        };
        track
            .init_cars(density, config.equal_lanes)
            .with_context(|| format!("Failed to populate track at density {}", density))?;

        let preferred_per_lane =
            stats::fair_share_per_lane(track.vehicle_count(), track.lane_count());

        Ok(Self {
            track,
            density,
            preferred_per_lane,
            steps: config.steps(),
            tick: 0,
            crossings: 0,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn preferred_per_lane(&self) -> &[usize] {
        &self.preferred_per_lane
    }

    pub fn tick_count(&self) -> usize {
        self.tick
    }

    pub fn crossings(&self) -> usize {
        self.crossings
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.steps
    }

    /// Advance one timestep. Returns the crossings of this step.
    pub fn tick(&mut self) -> Result<usize> {
        if self.track.lane_count() > 1 {
            let switched = if self.track.config().central_control {
                self.track.lane_switches_central(&self.preferred_per_lane)?
            } else {
                self.track.lane_switches()?
            };
            if switched > 0 {
                debug!("Tick {}: {} lane changes", self.tick, switched);
            }
        }
        self.track.calculate_next_state();
        let crossings = self.track.update_state()?;

        self.crossings += crossings;
        self.tick += 1;
        Ok(crossings)
    }

    /// Run the remaining timesteps and summarise
    pub fn run(mut self) -> Result<RunSummary> {
        while !self.is_finished() {
            self.tick()?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            density: self.density,
            vehicles: self.track.vehicle_count(),
            steps: self.tick,
            elapsed: self.tick as f64 * self.track.dt(),
            crossings: self.crossings,
            mean_speed: self.track.mean_speed(),
        }
    }
}

/// One run per configured density, in order
///
/// With a seed, the run for the i-th density uses `seed + i`.
pub fn density_sweep(config: &RunConfig) -> Result<Vec<RunSummary>> {
    config
        .densities
        .iter()
        .enumerate()
        .map(|(i, &density)| {
            let mut run_config = config.clone();
            run_config.seed = config.seed.map(|seed| seed.wrapping_add(i as u64));
            let summary = SimRun::new(&run_config, density)?.run()?;
            summary.log();
            Ok(summary)
        })
        .collect()
}
