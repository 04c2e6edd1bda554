//! Density-driven placement of vehicles on an empty track
//!
//! This module contains the functions that decide how many vehicles a run
//! gets, how they are spread over the lanes, and where each one starts.

use anyhow::Result;
use rand::Rng;

/// Number of vehicles for a density in vehicles per km on a road of `road_length` m
pub fn vehicle_count(density: f64, road_length: f64) -> Result<usize> {
    if !(density >= 0.0 && density.is_finite()) {
        anyhow::bail!("Density must be a non-negative number, got {}", density);
    }
    Ok((road_length / 1000.0 * density) as usize)
}

/// Split `total` vehicles over `lanes` lanes
///
/// With `equal_lanes` the split points are evenly spaced, otherwise they are
/// drawn uniformly from `[0, total)` and sorted. Split points are truncated
/// to whole vehicles.
pub fn split_counts<R: Rng + ?Sized>(
    total: usize,
    lanes: usize,
    equal_lanes: bool,
    rng: &mut R,
) -> Vec<usize> {
    if lanes == 0 {
        return Vec::new();
    }

    let mut split_points: Vec<usize> = if equal_lanes {
        (1..lanes)
            .map(|k| (total as f64 * k as f64 / lanes as f64) as usize)
            .collect()
    } else {
        let mut draws: Vec<f64> = (1..lanes)
            .map(|_| rng.random::<f64>() * total as f64)
            .collect();
        draws.sort_by(f64::total_cmp);
        draws.into_iter().map(|draw| draw as usize).collect()
    };
    split_points.push(total);

    let mut past = 0;
    split_points
        .into_iter()
        .map(|point| {
            let count = point - past;
            past = point;
            count
        })
        .collect()
}

/// Sorted start positions for `count` vehicles of `car_length` on one lane
///
/// Positions are drawn on a road shortened by the total body length and then
/// spread out by one body length per rank, so consecutive vehicles (including
/// the pair across the start of the road) are at least one body length apart.
pub fn lane_positions<R: Rng + ?Sized>(
    count: usize,
    road_length: f64,
    car_length: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let span = road_length - count as f64 * car_length;
    if span < 0.0 {
        anyhow::bail!(
            "{} vehicles of length {} m do not fit on a {} m lane",
            count,
            car_length,
            road_length
        );
    }

    let mut positions: Vec<f64> = (0..count).map(|_| rng.random::<f64>() * span).collect();
    positions.sort_by(f64::total_cmp);
    for (rank, position) in positions.iter_mut().enumerate() {
        *position += rank as f64 * car_length;
    }
    Ok(positions)
}

/// A uniformly random starting speed in `[0, max_speed)`
pub fn initial_speed<R: Rng + ?Sized>(max_speed: f64, rng: &mut R) -> f64 {
    rng.random::<f64>() * max_speed
}
