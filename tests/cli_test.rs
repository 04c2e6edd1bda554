use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ring_traffic_sim"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that a short density sweep runs to completion
#[test]
fn test_density_sweep_runs() {
    let output = run_cli(&[
        "--density", "0", "--density", "20", "--total-time", "50", "--seed", "3",
    ]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that run statistics are logged and the summary table is printed
#[test]
fn test_run_statistics_reported() {
    let output = run_cli(&[
        "--density", "30", "--total-time", "40", "--central", "--seed", "8",
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for key in ["Density:", "Vehicles:", "Crossings:", "Flow:", "Mean speed:"] {
        assert!(stderr.contains(key), "Missing '{}' statistic", key);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("density,vehicles,crossings,flow_per_hour,mean_speed")
    );
    let row = lines.next().expect("one row per density");
    assert!(row.starts_with("30.0,60,"), "unexpected row {}", row);
    assert_eq!(lines.next(), None);
}

#[test]
fn test_invalid_lane_count_fails() {
    let output = run_cli(&["--lanes", "0", "--density", "10", "--total-time", "5"]);
    assert!(!output.status.success());
}

#[test]
fn test_overfull_density_fails() {
    let output = run_cli(&["--lanes", "1", "--density", "500", "--total-time", "5"]);
    assert!(!output.status.success());
}
