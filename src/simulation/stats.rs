//! Aggregate statistics for a run
//!
//! Flow is counted as vehicles crossing the start of the road, mean speed is
//! taken over the vehicles' current speeds.

use log::info;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Target occupancy per lane for centralized lane changes
///
/// Every lane gets `total / lanes`; the first `total % lanes` lanes get one
/// more.
pub fn fair_share_per_lane(total: usize, lanes: usize) -> Vec<usize> {
    if lanes == 0 {
        return Vec::new();
    }
    let mut shares = vec![total / lanes; lanes];
    for share in shares.iter_mut().take(total % lanes) {
        *share += 1;
    }
    shares
}

/// Mean of the given speeds, `None` when there are none
pub fn mean_speed(speeds: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = speeds
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), speed| (sum + speed, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Result of simulating one density
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Vehicles per km
    pub density: f64,
    pub vehicles: usize,
    pub steps: usize,
    /// Simulated time in s
    pub elapsed: f64,
    /// Lane-wrap events over the whole run
    pub crossings: usize,
    /// Mean current speed over all vehicles at the end of the run
    pub mean_speed: Option<f64>,
}

impl RunSummary {
    /// Crossings per simulated hour
    pub fn flow_per_hour(&self) -> f64 {
        if self.elapsed > 0.0 {
            self.crossings as f64 * SECONDS_PER_HOUR / self.elapsed
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!("=== RUN COMPLETE ===");
        info!("Density: {:.1} veh/km", self.density);
        info!("Vehicles: {}", self.vehicles);
        info!("Steps: {} ({:.1}s simulated)", self.steps, self.elapsed);
        info!("Crossings: {}", self.crossings);
        info!("Flow: {:.1} veh/h", self.flow_per_hour());
        match self.mean_speed {
            Some(speed) => info!("Mean speed: {:.2} m/s", speed),
            None => info!("Mean speed: undefined"),
        }
    }
}
