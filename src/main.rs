use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use ring_traffic_sim::simulation::{
    default_densities, density_sweep, LanePolicy, RunConfig, TrackConfig,
};

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Traditional,
    Greedy,
}

impl From<PolicyArg> for LanePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Traditional => LanePolicy::Traditional,
            PolicyArg::Greedy => LanePolicy::Greedy,
        }
    }
}

#[derive(Parser)]
#[command(name = "ring_traffic_sim")]
#[command(about = "Ring road traffic simulation over a range of densities")]
struct Cli {
    /// Number of lanes
    #[arg(long, default_value = "2")]
    lanes: usize,

    /// Road circumference in meters
    #[arg(long, default_value = "2000")]
    length: f64,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "1.0")]
    dt: f64,

    /// Simulated seconds per density
    #[arg(long, default_value = "2000")]
    total_time: f64,

    /// Density in vehicles per km; repeat for several, defaults to 0..=140 in 10 steps
    #[arg(long)]
    density: Vec<f64>,

    /// Split vehicles evenly over the lanes
    #[arg(long)]
    equal_lanes: bool,

    /// Use centralized control
    #[arg(long)]
    central: bool,

    /// Largest per-step correction towards the lane mean speed
    #[arg(long, default_value = "1.0")]
    max_accel: f64,

    /// Speed added by eager vehicles under central control
    #[arg(long, default_value = "0.5")]
    speed_push: f64,

    /// Decentralized lane change policy
    #[arg(long, value_enum, default_value = "traditional")]
    policy: PolicyArg,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let steps = (self.total_time / self.dt) as usize;
        let track = TrackConfig {
            lane_count: self.lanes,
            length: self.length,
            dt: self.dt,
            central_control: self.central,
            max_accel: self.max_accel,
            speed_push: self.speed_push,
            lane_policy: self.policy.into(),
            history_capacity: steps,
            ..TrackConfig::default()
        };
        RunConfig {
            track,
            total_time: self.total_time,
            densities: if self.density.is_empty() {
                default_densities()
            } else {
                self.density
            },
            equal_lanes: self.equal_lanes,
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    info!(
        "Running {} lane(s) on {} m for {}s per density, central control: {}",
        config.track.lane_count, config.track.length, config.total_time, config.track.central_control
    );

    let summaries = density_sweep(&config)?;

    println!("density,vehicles,crossings,flow_per_hour,mean_speed");
    for summary in &summaries {
        let mean_speed = summary
            .mean_speed
            .map(|speed| format!("{:.3}", speed))
            .unwrap_or_default();
        println!(
            "{:.1},{},{},{:.1},{}",
            summary.density,
            summary.vehicles,
            summary.crossings,
            summary.flow_per_hour(),
            mean_speed
        );
    }
    info!("=== SIMULATION COMPLETE ===");
    Ok(())
}
