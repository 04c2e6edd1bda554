//! Per-vehicle trajectory history
//!
//! One entry per committed timestep, index aligned across speed, position
//! and lane. The capacity is fixed when the vehicle is created; commits past
//! it are counted but not stored.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleHistory {
    capacity: usize,
    speeds: Vec<f64>,
    positions: Vec<f64>,
    lanes: Vec<usize>,
    dropped: usize,
}

impl VehicleHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            speeds: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            lanes: Vec::with_capacity(capacity),
            dropped: 0,
        }
    }

    /// Append one committed step. Returns `false` if the buffer was full.
    pub fn record(&mut self, speed: f64, position: f64, lane: usize) -> bool {
        if self.speeds.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.speeds.push(speed);
        self.positions.push(position);
        self.lanes.push(lane);
        true
    }

    pub fn clear(&mut self) {
        self.speeds.clear();
        self.positions.clear();
        self.lanes.clear();
        self.dropped = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    /// Number of commits that arrived after the buffer filled up
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn lanes(&self) -> &[usize] {
        &self.lanes
    }
}
