//! The circular multi-lane road
//!
//! The track owns every vehicle in an arena indexed by [`CarId`] and a set of
//! lanes holding IDs. Each timestep the caller drives it in this order:
//!
//! 1. [`Track::lane_switches`] or [`Track::lane_switches_central`] (only with
//!    more than one lane)
//! 2. [`Track::calculate_next_state`]
//! 3. [`Track::update_state`]
//!
//! Every phase reads a consistent snapshot and only then mutates, so no
//! vehicle ever reacts to a partially updated neighbor.

use anyhow::{Context, Result};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::TrackConfig;
use super::lane::Lane;
use super::lane_change::{bodies_overlap, CarSnapshot, LaneSides, SideLane};
use super::population;
use super::stats;
use super::types::{CarId, LaneChange, SimId};
use super::vehicle::{CentralNudge, LeaderState, VehicleAgent};

/// Vehicles accepted into each lane during one lane change pass
struct Arrivals {
    lanes: Vec<Vec<CarSnapshot>>,
    road_length: f64,
}

impl Arrivals {
    fn new(lane_count: usize, road_length: f64) -> Self {
        Self {
            lanes: vec![Vec::new(); lane_count],
            road_length,
        }
    }

    fn conflicts(&self, lane: usize, car: &CarSnapshot) -> bool {
        self.lanes[lane].iter().any(|other| {
            bodies_overlap(
                car.position,
                car.length,
                other.position,
                other.length,
                self.road_length,
            )
        })
    }

    fn add(&mut self, lane: usize, car: CarSnapshot) {
        self.lanes[lane].push(car);
    }
}

/// A closed ring road with one or more lanes
pub struct Track {
    config: TrackConfig,
    cars: Vec<VehicleAgent>,
    lanes: Vec<Lane>,
    rng: StdRng,
    history_warned: bool,
}

impl Track {
    /// Create an empty track seeded from the thread RNG
    pub fn new(config: TrackConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_rng(&mut rand::rng()))
    }

    /// Create an empty track with a seeded RNG for reproducible runs
    pub fn with_seed(config: TrackConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: TrackConfig, rng: StdRng) -> Result<Self> {
        config.validate().context("Invalid track configuration")?;
        let lanes = vec![Lane::new(); config.lane_count];
        Ok(Self {
            config,
            cars: Vec::new(),
            lanes,
            rng,
            history_warned: false,
        })
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn length(&self) -> f64 {
        self.config.length
    }

    pub fn dt(&self) -> f64 {
        self.config.dt
    }

    /// The lanes, from the slow lane (index 0) outwards
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, lane: usize) -> Result<&Lane> {
        self.lanes
            .get(lane)
            .with_context(|| format!("Lane {} does not exist", lane))
    }

    /// All vehicles, indexed by [`CarId::index`]
    pub fn cars(&self) -> &[VehicleAgent] {
        &self.cars
    }

    pub fn car(&self, id: CarId) -> Option<&VehicleAgent> {
        self.cars.get(id.index())
    }

    pub fn vehicle_count(&self) -> usize {
        self.cars.len()
    }

    /// The vehicles of one lane in lane order
    pub fn cars_in_lane(&self, lane: usize) -> Result<impl Iterator<Item = &VehicleAgent> + '_> {
        let cars = &self.cars;
        Ok(self.lane(lane)?.car_ids().map(move |id| &cars[id.index()]))
    }

    pub fn lane_of(&self, id: CarId) -> Option<usize> {
        self.lanes.iter().position(|lane| lane.contains(id))
    }

    /// Mean current speed over every vehicle, `None` on an empty track
    pub fn mean_speed(&self) -> Option<f64> {
        stats::mean_speed(self.cars.iter().map(|car| car.current_speed))
    }

    /// Mean current speed of one lane, `None` if the lane is empty
    pub fn lane_mean_speed(&self, lane: usize) -> Result<Option<f64>> {
        Ok(stats::mean_speed(
            self.cars_in_lane(lane)?.map(|car| car.current_speed),
        ))
    }

    /// Place `density` vehicles per km at random, non-overlapping positions
    /// with random speeds.
    pub fn init_cars(&mut self, density: f64, equal_lanes: bool) -> Result<()> {
        if !self.cars.is_empty() {
            anyhow::bail!("Track is already populated with {} cars", self.cars.len());
        }

        let params = self.config.vehicle;
        let total = population::vehicle_count(density, self.config.length)?;
        let counts =
            population::split_counts(total, self.lanes.len(), equal_lanes, &mut self.rng);

        let mut placements = Vec::with_capacity(counts.len());
        for (lane, count) in counts.iter().copied().enumerate() {
            let positions =
                population::lane_positions(count, self.config.length, params.length, &mut self.rng)
                    .with_context(|| format!("Failed to populate lane {}", lane))?;
            placements.push(positions);
        }

        for (lane, positions) in placements.into_iter().enumerate() {
            for position in positions {
                let speed = population::initial_speed(params.max_speed, &mut self.rng);
                self.spawn(lane, position, speed);
            }
        }

        debug!(
            "Populated {} m track at {} veh/km: {} cars, per lane {:?}",
            self.config.length, density, total, counts
        );
        Ok(())
    }

    /// Add a single vehicle to a lane
    pub fn add_car(&mut self, lane: usize, position: f64, speed: f64) -> Result<CarId> {
        let params = self.config.vehicle;
        let road_length = self.config.length;
        if !(0.0..road_length).contains(&position) {
            anyhow::bail!("Position {} is outside the road [0, {})", position, road_length);
        }
        if !(0.0..=params.max_speed).contains(&speed) {
            anyhow::bail!("Speed {} is outside [0, {}]", speed, params.max_speed);
        }
        let clash = self.cars_in_lane(lane)?.find(|other| {
            bodies_overlap(
                position,
                params.length,
                other.position,
                other.length(),
                road_length,
            )
        });
        if let Some(other) = clash {
            anyhow::bail!(
                "Car at {} in lane {} would overlap car {:?} at {}",
                position,
                lane,
                other.id,
                other.position
            );
        }
        Ok(self.spawn(lane, position, speed))
    }

    fn spawn(&mut self, lane: usize, position: f64, speed: f64) -> CarId {
        let id = CarId(SimId(self.cars.len()));
        self.cars.push(VehicleAgent::new(
            id,
            position,
            speed,
            self.config.vehicle,
            self.config.history_capacity,
        ));
        self.lanes[lane].insert(id, position);
        id
    }

    /// Re-sort every lane by current position
    pub fn sort_lanes(&mut self) {
        let cars = &self.cars;
        for lane in &mut self.lanes {
            lane.resort(|id| cars[id.index()].position);
        }
    }

    /// The car ahead of `position` in `lane`, `None` if the lane is empty.
    /// The lane must be sorted.
    pub fn car_in_front(&self, lane: usize, position: f64) -> Result<Option<CarId>> {
        Ok(self.lane(lane)?.car_in_front(position))
    }

    /// The car behind `position` in `lane`, `None` if the lane is empty.
    /// The lane must be sorted.
    pub fn car_in_back(&self, lane: usize, position: f64) -> Result<Option<CarId>> {
        Ok(self.lane(lane)?.car_in_back(position))
    }

    fn side_lane(&self, lane: isize, position: f64) -> SideLane {
        let Some(lane) = usize::try_from(lane).ok().and_then(|i| self.lanes.get(i)) else {
            return SideLane::Absent;
        };
        match (lane.car_in_front(position), lane.car_at_or_behind(position)) {
            (Some(front), Some(back)) => SideLane::Occupied {
                front: CarSnapshot::from(&self.cars[front.index()]),
                back: CarSnapshot::from(&self.cars[back.index()]),
            },
            _ => SideLane::Empty,
        }
    }

    /// Front and back neighbors at `position` in the lanes either side of `lane`.
    /// A side car at exactly `position` is reported as the back neighbor.
    pub fn closest_cars_sides(&self, lane: usize, position: f64) -> Result<LaneSides> {
        self.lane(lane)?;
        let lane = lane as isize;
        Ok(LaneSides {
            left: self.side_lane(lane + 1, position),
            right: self.side_lane(lane - 1, position),
        })
    }

    fn target_lane(&self, lane: usize, offset: isize) -> Result<usize> {
        self.lane(lane)?;
        let target = lane as isize + offset;
        if target < 0 || target >= self.lanes.len() as isize {
            anyhow::bail!(
                "New lane {} out of bounds for a track with {} lanes",
                target,
                self.lanes.len()
            );
        }
        Ok(target as usize)
    }

    /// Move the car at exactly `position` in `lane` by `offset` lanes.
    /// Positive offsets move towards the fast lanes.
    pub fn switch_lane(&mut self, lane: usize, position: f64, offset: isize) -> Result<()> {
        let target = self.target_lane(lane, offset)?;
        if offset == 0 {
            return Ok(());
        }

        let cars = &self.cars;
        let car = self.lanes[lane]
            .remove_where(|id| cars[id.index()].position == position)
            .with_context(|| format!("No car in lane {} at position {}", lane, position))?;
        self.lanes[target].insert(car, position);
        debug!("Car {:?} at {:.2} moved from lane {} to lane {}", car, position, lane, target);
        Ok(())
    }

    /// Apply lane changes decided from one snapshot. A move is dropped if the
    /// vehicle would overlap another vehicle that already moved into the same
    /// lane during this pass.
    fn apply_lane_changes(&mut self, intents: Vec<(usize, CarId, LaneChange)>) -> Result<usize> {
        let mut arrivals = Arrivals::new(self.lanes.len(), self.config.length);
        let mut applied = 0;
        for (lane, car, change) in intents {
            let target = self.target_lane(lane, change.offset())?;
            let snapshot = CarSnapshot::from(&self.cars[car.index()]);
            if arrivals.conflicts(target, &snapshot) {
                debug!("Car {:?} lane change to {} dropped: target taken", car, target);
                continue;
            }
            self.switch_lane(lane, snapshot.position, change.offset())?;
            arrivals.add(target, snapshot);
            applied += 1;
        }
        Ok(applied)
    }

    /// Decentralized lane changes. Every vehicle decides from the same sorted
    /// snapshot and at most one change per vehicle is applied.
    /// Returns the number of vehicles that changed lane.
    pub fn lane_switches(&mut self) -> Result<usize> {
        self.sort_lanes();
        let policy = self.config.lane_policy;
        let road_length = self.config.length;

        let mut intents = Vec::new();
        for (lane_idx, lane) in self.lanes.iter().enumerate() {
            for car_id in lane.car_ids() {
                let vehicle = &self.cars[car_id.index()];
                let front = lane
                    .car_in_front(vehicle.position)
                    .context("Lane lost its own car")?;
                let front = CarSnapshot::from(&self.cars[front.index()]);
                let sides = self.closest_cars_sides(lane_idx, vehicle.position)?;
                let change = vehicle.lane_switch(policy, &front, &sides, road_length);
                if change != LaneChange::Stay {
                    intents.push((lane_idx, car_id, change));
                }
            }
        }

        self.apply_lane_changes(intents)
    }

    /// Centralized lane changes towards the per-lane quotas in
    /// `preferred_per_lane`. Lanes are processed in order; within a lane,
    /// vehicles move to a feasible neighbor lane (chosen at random if both
    /// are feasible) until the lane is down to its quota.
    /// A vehicle moved into a later lane can move again when that lane is
    /// processed, so it may change lanes twice in one pass.
    /// Returns the number of lane changes applied.
    pub fn lane_switches_central(&mut self, preferred_per_lane: &[usize]) -> Result<usize> {
        if preferred_per_lane.len() != self.lanes.len() {
            anyhow::bail!(
                "Expected {} lane quotas, got {}",
                self.lanes.len(),
                preferred_per_lane.len()
            );
        }

        let road_length = self.config.length;
        let mut applied = 0;
        for (lane_idx, &quota) in preferred_per_lane.iter().enumerate() {
            self.sort_lanes();
            let mut occupancy = self.lanes[lane_idx].len();
            let mut arrivals = Arrivals::new(self.lanes.len(), road_length);
            let mut moves = Vec::new();

            let members: Vec<CarId> = self.lanes[lane_idx].car_ids().collect();
            for car_id in members {
                if occupancy <= quota {
                    break;
                }
                let sides = self.closest_cars_sides(lane_idx, self.cars[car_id.index()].position)?;
                let vehicle = &self.cars[car_id.index()];
                let change = match vehicle.can_switch_lanes(&sides, road_length) {
                    (true, true) => {
                        if self.rng.random_range(0..2) == 0 {
                            LaneChange::Left
                        } else {
                            LaneChange::Right
                        }
                    }
                    (true, false) => LaneChange::Left,
                    (false, true) => LaneChange::Right,
                    (false, false) => continue,
                };

                let target = self.target_lane(lane_idx, change.offset())?;
                let snapshot = CarSnapshot::from(vehicle);
                if arrivals.conflicts(target, &snapshot) {
                    continue;
                }
                arrivals.add(target, snapshot);
                moves.push((snapshot.position, change));
                occupancy -= 1;
            }

            for (position, change) in moves {
                self.switch_lane(lane_idx, position, change.offset())?;
                applied += 1;
            }
        }

        Ok(applied)
    }

    /// Stage every vehicle's next speed from its leader's current state.
    /// Nothing is committed until [`Track::update_state`].
    pub fn calculate_next_state(&mut self) {
        self.sort_lanes();
        let road_length = self.config.length;

        let mut plans = Vec::with_capacity(self.cars.len());
        for lane in &self.lanes {
            let central = if self.config.central_control {
                stats::mean_speed(lane.car_ids().map(|id| self.cars[id.index()].current_speed))
                    .map(|mean_speed| CentralNudge {
                        mean_speed,
                        max_accel: self.config.max_accel,
                        speed_push: self.config.speed_push,
                    })
            } else {
                None
            };

            for car_id in lane.car_ids() {
                let vehicle = &self.cars[car_id.index()];
                let leader = match lane.car_in_front(vehicle.position) {
                    Some(leader_id) if leader_id != car_id => {
                        let leader = &self.cars[leader_id.index()];
                        let gap = (leader.position - vehicle.position).rem_euclid(road_length);
                        LeaderState {
                            gap: f64::max(0.0, gap - leader.length()),
                            speed: leader.current_speed,
                            acceleration: leader.acceleration,
                        }
                    }
                    _ => LeaderState::unobstructed(),
                };
                plans.push((car_id, leader, central));
            }
        }

        let dt = self.config.dt;
        for (car_id, leader, central) in plans {
            self.cars[car_id.index()].calculate_next_state(leader, dt, central, &mut self.rng);
        }
    }

    /// Commit every staged speed, integrate positions and wrap vehicles that
    /// passed the end of the road. Returns the number of wrap-arounds.
    pub fn update_state(&mut self) -> Result<usize> {
        let dt = self.config.dt;
        let road_length = self.config.length;
        let mut crossings = 0;
        let mut truncated = false;

        for (lane_idx, lane) in self.lanes.iter().enumerate() {
            for car_id in lane.car_ids() {
                let vehicle = &mut self.cars[car_id.index()];
                vehicle.update_state(dt, lane_idx)?;
                if vehicle.position >= road_length {
                    vehicle.position -= road_length;
                    crossings += 1;
                }
                truncated |= vehicle.history().dropped() > 0;
            }
        }

        if truncated && !self.history_warned {
            warn!(
                "Vehicle history is full after {} entries, further steps are not recorded",
                self.config.history_capacity
            );
            self.history_warned = true;
        }

        Ok(crossings)
    }
}
