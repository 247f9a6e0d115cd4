//! Integration tests for the `run` command.
use itertools::Itertools;
use replan::cli::{RunOpts, handle_run_command};
use replan::settings::Settings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    Path::new(file!())
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
        .join("hybrid")
}

#[derive(Debug, Deserialize)]
struct CapacityRow {
    #[allow(dead_code)]
    technology: String,
    capacity: f64,
}

/// An end-to-end test for the `run` command on the demo model.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("REPLAN_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("out");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
        save_dispatch: true,
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    // All the output files should have been written
    for file_name in [
        "metadata.toml",
        "capacities.csv",
        "lcoe_summary.csv",
        "cost_breakdown.csv",
        "debt_schedule.csv",
        "working_capital.csv",
        "asset_values.csv",
        "storage_cost.csv",
        "dispatch.csv",
        "replan_info.log",
        "replan_error.log",
    ] {
        assert!(output_dir.join(file_name).is_file(), "{file_name}");
    }

    // The sized capacities must be non-negative and cover the mean demand
    let rows: Vec<CapacityRow> = csv::Reader::from_path(output_dir.join("capacities.csv"))
        .unwrap()
        .into_deserialize()
        .try_collect()
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.capacity >= 0.0));

    // demand.csv has a mean of 237.08; generation at the sized capacities must cover it
    let generation = rows[0].capacity * 0.19 + rows[1].capacity * 0.2915;
    assert!(generation >= 237.0);
}
