//! Vehicle kinematics and the car-following decision model
//!
//! Standalone implementation: a vehicle only ever sees numbers describing its
//! leader, never the leader itself.

use anyhow::{Context, Result};
use log::trace;
use rand::Rng;

use super::config::VehicleParams;
use super::history::VehicleHistory;
use super::types::{
    CarId, Decision, ACCELERATION_REGIME_SPEED, CENTRAL_NOISE_DRAW, CRUISE_HEADWAYS,
    CRUISE_MIN_GAP, HIGH_SPEED_ACCELERATION, LOW_SPEED_ACCELERATION, NEAR_FIELD_HEADWAYS,
    PUSH_HORIZON, REACTION_TIME, SAFE_CLOSING_HEADWAYS,
};

/// What a vehicle knows about the vehicle ahead of it when deciding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderState {
    /// Distance from own front bumper to the leader's rear bumper, in m
    pub gap: f64,
    pub speed: f64,
    pub acceleration: f64,
}

impl LeaderState {
    /// The leader seen by a vehicle that is alone in its lane
    pub fn unobstructed() -> Self {
        Self {
            gap: f64::INFINITY,
            speed: f64::INFINITY,
            acceleration: f64::INFINITY,
        }
    }
}

/// Centralized control input for one decision step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralNudge {
    /// Mean current speed of the vehicle's lane
    pub mean_speed: f64,
    pub max_accel: f64,
    pub speed_push: f64,
}

/// A simulated vehicle on the ring road
#[derive(Debug, Clone)]
pub struct VehicleAgent {
    pub id: CarId,
    /// Front bumper position along the lane in m
    pub position: f64,
    pub current_speed: f64,
    /// Output of the most recent decision step, in m/s^2
    pub acceleration: f64,
    pub params: VehicleParams,
    next_speed: Option<f64>,
    history: VehicleHistory,
}

impl VehicleAgent {
    pub fn new(
        id: CarId,
        position: f64,
        current_speed: f64,
        params: VehicleParams,
        history_capacity: usize,
    ) -> Self {
        Self {
            id,
            position,
            current_speed,
            acceleration: 0.0,
            params,
            next_speed: None,
            history: VehicleHistory::with_capacity(history_capacity),
        }
    }

    pub fn length(&self) -> f64 {
        self.params.length
    }

    /// The speed staged by the last decision step, not yet committed
    pub fn staged_speed(&self) -> Option<f64> {
        self.next_speed
    }

    pub fn history(&self) -> &VehicleHistory {
        &self.history
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    /// Gap the vehicle wants to keep at its current speed, in m
    pub fn desired_gap(&self) -> f64 {
        self.current_speed * self.params.time_headway
    }

    /// Walk the decision tree for the given gap and leader speed.
    pub fn decide(&self, gap: f64, leader_speed: f64) -> Decision {
        let v_f = self.current_speed;
        let v_l = leader_speed;

        if gap < NEAR_FIELD_HEADWAYS * v_f {
            let delta = gap - self.desired_gap();
            match delta {
                d if d > 0.0 => match () {
                    _ if v_l >= v_f => Decision::Accelerate,
                    _ if gap > SAFE_CLOSING_HEADWAYS * v_f => Decision::Accelerate,
                    _ if gap > CRUISE_HEADWAYS * v_f && gap > CRUISE_MIN_GAP => Decision::Cruise,
                    _ => Decision::Decelerate,
                },
                d if d == 0.0 => {
                    if v_l >= v_f {
                        Decision::Cruise
                    } else {
                        Decision::Decelerate
                    }
                }
                _ => {
                    if v_l > v_f {
                        Decision::Cruise
                    } else {
                        Decision::Decelerate
                    }
                }
            }
        } else {
            match v_f - self.params.desired_speed {
                d if d < 0.0 => Decision::Accelerate,
                d if d == 0.0 => Decision::Cruise,
                _ => Decision::Decelerate,
            }
        }
    }

    /// Run the decision tree and store the resulting acceleration.
    pub fn compute_decision(
        &mut self,
        gap: f64,
        leader_speed: f64,
        leader_acceleration: f64,
    ) -> Decision {
        let decision = self.decide(gap, leader_speed);
        let v_f = self.current_speed;
        self.acceleration = match decision {
            Decision::Accelerate => Self::acceleration_rate(v_f),
            Decision::Cruise => 0.0,
            Decision::Decelerate => self.deceleration_rate(
                v_f,
                leader_speed,
                leader_acceleration,
                gap,
                self.desired_gap(),
            ),
        };
        decision
    }

    /// Two-regime comfort acceleration
    pub fn acceleration_rate(v_f: f64) -> f64 {
        if v_f <= ACCELERATION_REGIME_SPEED {
            LOW_SPEED_ACCELERATION
        } else {
            HIGH_SPEED_ACCELERATION
        }
    }

    /// Rate applied by the decelerate action. The first matching case wins.
    ///
    /// The result is used directly as the vehicle's acceleration.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn deceleration_rate(
        &self,
        v_f: f64,
        v_l: f64,
        a_l: f64,
        gap: f64,
        gap_desire: f64,
    ) -> f64 {
        let VehicleParams {
            desired_speed,
            a_normal,
            a_max,
            ..
        } = self.params;
        let slack = gap - gap_desire;

        match () {
            // free-flow overspeed
            _ if v_f > desired_speed => f64::min((v_f - desired_speed) / 3.0, a_normal),
            // following exactly at the desired gap
            _ if slack == 0.0 && !(v_l >= v_f) => (v_f.powi(2) - v_l.powi(2)) / (2.0 * gap),
            // emergency
            _ if slack < 0.0 && !(v_l > v_f) => a_l - 0.25 * a_normal,
            // near collision
            _ if slack > 0.0
                && !(v_l >= v_f)
                && !(gap > SAFE_CLOSING_HEADWAYS * v_f)
                && !(gap > CRUISE_HEADWAYS * v_f && gap > CRUISE_MIN_GAP) =>
            {
                f64::min(a_l + (v_f - v_l).powi(2) / (2.0 * gap), a_max)
            }
            _ => 0.0,
        }
    }

    /// Highest speed that cannot rear-end the leader within the reaction time.
    pub fn compute_safe_speed(&self, gap: f64, leader_speed: f64) -> f64 {
        if gap == f64::INFINITY {
            return f64::INFINITY;
        }
        let v_l = leader_speed;
        v_l + (gap - v_l * REACTION_TIME)
            / (REACTION_TIME + (self.current_speed + v_l) / (2.0 * self.params.a_max))
    }

    /// Stage the next speed from the leader's state. Neither `current_speed`
    /// nor `position` changes until [`VehicleAgent::update_state`].
    pub fn calculate_next_state<R: Rng + ?Sized>(
        &mut self,
        leader: LeaderState,
        dt: f64,
        central: Option<CentralNudge>,
        rng: &mut R,
    ) -> f64 {
        let decision = self.compute_decision(leader.gap, leader.speed, leader.acceleration);
        let v_safe = self.compute_safe_speed(leader.gap, leader.speed);
        let v_ideal = self
            .params
            .max_speed
            .min(self.current_speed + self.acceleration * dt)
            .min(v_safe);

        let eta = match central {
            None => rng.random::<f64>(),
            Some(_) => CENTRAL_NOISE_DRAW,
        };
        let mut next_speed = f64::max(0.0, v_ideal - self.params.noise * eta);

        if let Some(nudge) = central {
            let dif_speed =
                (nudge.mean_speed - next_speed).clamp(-nudge.max_accel, nudge.max_accel);
            next_speed += dif_speed;
            if leader.gap + PUSH_HORIZON * (leader.speed - next_speed) > 0.0
                && rng.random::<f64>() < self.params.eagerness
            {
                next_speed += nudge.speed_push;
            }
            next_speed = next_speed.clamp(0.0, self.params.max_speed);
        }

        trace!(
            "Car {:?} at {:.2}: {:?} a={:.3} v_safe={:.2} next={:.2}",
            self.id,
            self.position,
            decision,
            self.acceleration,
            v_safe,
            next_speed
        );

        self.next_speed = Some(next_speed);
        next_speed
    }

    /// Commit the staged speed and integrate position. The position may end
    /// up past the end of the road; wrap-around is the track's job.
    pub fn update_state(&mut self, dt: f64, lane: usize) -> Result<()> {
        let speed = self
            .next_speed
            .take()
            .with_context(|| format!("Car {:?} has no staged speed to commit", self.id))?;
        self.current_speed = speed;
        self.position += speed * dt;
        self.history.record(speed, self.position, lane);
        Ok(())
    }
}
