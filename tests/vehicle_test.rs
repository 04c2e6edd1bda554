//! Car-following decision model tests
//!
//! These exercise a single vehicle against hand-built leader states.

use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ring_traffic_sim::simulation::{
    CarId, CentralNudge, Decision, LeaderState, SimId, VehicleAgent, VehicleParams,
};

fn agent(position: f64, speed: f64) -> VehicleAgent {
    VehicleAgent::new(CarId(SimId(0)), position, speed, VehicleParams::default(), 16)
}

fn leader(gap: f64, speed: f64, acceleration: f64) -> LeaderState {
    LeaderState {
        gap,
        speed,
        acceleration,
    }
}

#[test]
fn test_acceleration_rate_regimes() {
    assert_eq!(VehicleAgent::acceleration_rate(0.0), 1.1);
    assert_eq!(VehicleAgent::acceleration_rate(12.19), 1.1);
    assert_eq!(VehicleAgent::acceleration_rate(12.2), 0.37);
    assert_eq!(VehicleAgent::acceleration_rate(35.0), 0.37);
}

/// Equal speeds with a gap well above the desired gap accelerates at the high speed rate
#[test]
fn test_compute_decision_same_speed_leader() {
    let mut vehicle = agent(1000.0, 25.0);
    assert_approx_eq!(vehicle.desired_gap(), 30.0);

    let decision = vehicle.compute_decision(100.0, 25.0, 0.37);
    assert_eq!(decision, Decision::Accelerate);
    assert_eq!(vehicle.acceleration, 0.37);
}

#[test]
fn test_deceleration_rate_no_case_matches() {
    let vehicle = agent(1000.0, 25.0);
    let rate = vehicle.deceleration_rate(25.0, 25.0, 0.37, 100.0, 25.0 * 1.2);
    assert_eq!(rate, 0.0);
}

#[test]
fn test_compute_safe_speed() {
    let vehicle = agent(1000.0, 25.0);
    let v_safe = vehicle.compute_safe_speed(100.0, 25.0);
    assert_approx_eq!(v_safe, 39.59, 0.1);
}

#[test]
fn test_safe_speed_unbounded_without_leader() {
    let vehicle = agent(1000.0, 25.0);
    assert_eq!(vehicle.compute_safe_speed(f64::INFINITY, f64::INFINITY), f64::INFINITY);
}

/// Slower leader at a comfortable distance: cruise
#[test]
fn test_decision_cruise_band_behind_slower_leader() {
    let mut vehicle = agent(0.0, 20.0);
    assert_eq!(vehicle.compute_decision(50.0, 10.0, 0.0), Decision::Cruise);
    assert_eq!(vehicle.acceleration, 0.0);
}

/// Slower leader but more than three seconds away: keep accelerating
#[test]
fn test_decision_closes_large_gap() {
    let mut vehicle = agent(0.0, 20.0);
    assert_eq!(vehicle.compute_decision(70.0, 10.0, 0.0), Decision::Accelerate);
    assert_eq!(vehicle.acceleration, 0.37);
}

/// Above the desired gap but closing on a slower leader: near-collision rate
#[test]
fn test_decision_near_collision_deceleration() {
    let mut vehicle = agent(0.0, 20.0);
    assert_eq!(vehicle.compute_decision(30.0, 10.0, 0.0), Decision::Decelerate);
    assert_approx_eq!(vehicle.acceleration, 100.0 / 60.0);
}

/// Below the desired gap with a leader that is not faster: emergency rate
#[test]
fn test_decision_emergency_deceleration() {
    let mut vehicle = agent(0.0, 20.0);
    assert_eq!(vehicle.compute_decision(10.0, 10.0, -1.0), Decision::Decelerate);
    assert_approx_eq!(vehicle.acceleration, -1.0 - 0.25 * 3.05);
}

#[test]
fn test_decision_too_close_but_leader_pulling_away() {
    let mut vehicle = agent(0.0, 20.0);
    assert_eq!(vehicle.compute_decision(10.0, 25.0, 0.0), Decision::Cruise);
}

/// A headway of 1.25 s makes the desired gap exactly representable
#[test]
fn test_decision_exactly_at_desired_gap() {
    let params = VehicleParams {
        time_headway: 1.25,
        ..VehicleParams::default()
    };
    let mut vehicle = VehicleAgent::new(CarId(SimId(0)), 0.0, 20.0, params, 4);
    assert_eq!(vehicle.desired_gap(), 25.0);

    assert_eq!(vehicle.compute_decision(25.0, 20.0, 0.0), Decision::Cruise);

    assert_eq!(vehicle.compute_decision(25.0, 10.0, 0.0), Decision::Decelerate);
    assert_approx_eq!(vehicle.acceleration, (400.0 - 100.0) / 50.0);
}

#[test]
fn test_free_flow_branch() {
    let mut below = agent(0.0, 25.0);
    assert_eq!(below.compute_decision(f64::INFINITY, f64::INFINITY, f64::INFINITY), Decision::Accelerate);
    assert_eq!(below.acceleration, 0.37);

    let mut at = agent(0.0, 30.0);
    assert_eq!(at.compute_decision(f64::INFINITY, f64::INFINITY, f64::INFINITY), Decision::Cruise);
    assert_eq!(at.acceleration, 0.0);

    let mut above = agent(0.0, 33.0);
    assert_eq!(above.compute_decision(f64::INFINITY, f64::INFINITY, f64::INFINITY), Decision::Decelerate);
    assert_approx_eq!(above.acceleration, 1.0);
}

/// Staging a speed must not touch the committed state
#[test]
fn test_calculate_next_state_only_stages() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut vehicle = agent(1000.0, 25.0);

    let next = vehicle.calculate_next_state(leader(100.0, 25.0, 0.37), 1.0, None, &mut rng);

    assert_eq!(vehicle.current_speed, 25.0);
    assert_eq!(vehicle.position, 1000.0);
    assert_eq!(vehicle.staged_speed(), Some(next));
    assert!(vehicle.history().is_empty());
}

/// Driver noise takes at most `b` off the ideal speed
#[test]
fn test_noise_bounds() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..100 {
        let mut vehicle = agent(0.0, 25.0);
        let next = vehicle.calculate_next_state(LeaderState::unobstructed(), 1.0, None, &mut rng);
        assert!(next <= 25.37 + 1e-9, "next speed {} above ideal", next);
        assert!(next > 25.37 - 0.2 - 1e-9, "next speed {} below noise floor", next);
    }
}

#[test]
fn test_next_speed_never_negative() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut vehicle = agent(0.0, 0.0);
    let next = vehicle.calculate_next_state(leader(0.0, 0.0, 0.0), 1.0, None, &mut rng);
    assert!(next >= 0.0);
}

#[test]
fn test_update_state_commits_staged_speed() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut vehicle = agent(1000.0, 25.0);
    let next = vehicle.calculate_next_state(leader(100.0, 25.0, 0.37), 1.0, None, &mut rng);

    vehicle.update_state(1.0, 1).expect("commit should succeed");

    assert_eq!(vehicle.current_speed, next);
    assert_approx_eq!(vehicle.position, 1000.0 + next);
    assert_eq!(vehicle.staged_speed(), None);
    assert_eq!(vehicle.history().speeds(), &[next]);
    assert_eq!(vehicle.history().lanes(), &[1]);

    // The staged speed was consumed by the commit
    assert!(vehicle.update_state(1.0, 1).is_err());
}

/// Under central control the speed is pulled towards the lane mean by at most `max_accel`
#[test]
fn test_central_nudge_without_push() {
    let mut rng = StdRng::seed_from_u64(5);
    let params = VehicleParams {
        eagerness: 0.0,
        ..VehicleParams::default()
    };
    let mut vehicle = VehicleAgent::new(CarId(SimId(0)), 0.0, 25.0, params, 4);
    let nudge = CentralNudge {
        mean_speed: 20.0,
        max_accel: 1.0,
        speed_push: 0.5,
    };

    let next = vehicle.calculate_next_state(leader(100.0, 25.0, 0.0), 1.0, Some(nudge), &mut rng);
    // 25.37 ideal, minus 0.2 * 0.5 noise, minus the clamped correction of 1
    assert_approx_eq!(next, 24.27);
}

#[test]
fn test_central_push_when_safe() {
    let mut rng = StdRng::seed_from_u64(6);
    let params = VehicleParams {
        eagerness: 1.0,
        ..VehicleParams::default()
    };
    let nudge = CentralNudge {
        mean_speed: 20.0,
        max_accel: 1.0,
        speed_push: 0.5,
    };

    let mut vehicle = VehicleAgent::new(CarId(SimId(0)), 0.0, 25.0, params, 4);
    let next = vehicle.calculate_next_state(leader(100.0, 25.0, 0.0), 1.0, Some(nudge), &mut rng);
    assert_approx_eq!(next, 24.77);

    // A push that would close the gap within three seconds is skipped
    let mut vehicle = VehicleAgent::new(CarId(SimId(0)), 0.0, 25.0, params, 4);
    let next = vehicle.calculate_next_state(leader(0.0, 0.0, 0.0), 1.0, Some(nudge), &mut rng);
    assert!(next <= 1.0 + 1e-9, "pushed despite imminent collision: {}", next);
}

#[test]
fn test_history_capacity_is_respected() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut vehicle = VehicleAgent::new(CarId(SimId(0)), 0.0, 10.0, VehicleParams::default(), 2);
    for _ in 0..3 {
        vehicle.calculate_next_state(LeaderState::unobstructed(), 1.0, None, &mut rng);
        vehicle.update_state(1.0, 0).expect("commit should succeed");
    }
    assert_eq!(vehicle.history().len(), 2);
    assert_eq!(vehicle.history().dropped(), 1);

    vehicle.reset_history();
    assert!(vehicle.history().is_empty());
    assert_eq!(vehicle.history().capacity(), 2);
}
