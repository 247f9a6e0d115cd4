//! An hourly demand series, as supplied by the profile-ingestion step.
use crate::units::Power;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

/// The file name for the hourly demand series
const DEMAND_FILE_NAME: &str = "demand.csv";

/// A single sampled hour of demand
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DemandEntry {
    /// Hour index (chronological; the series is ordered by insertion)
    pub hour: u32,
    /// Demand for that hour
    pub demand: Power,
}

/// An ordered hourly demand series.
///
/// Insertion order is chronological order. Values are validated to be finite and non-negative on
/// construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSeries(Vec<DemandEntry>);

impl DemandSeries {
    /// Create a demand series from hourly entries, validating them.
    pub fn new(entries: Vec<DemandEntry>) -> Result<Self> {
        ensure!(!entries.is_empty(), "Demand series cannot be empty");
        for entry in &entries {
            ensure!(
                entry.demand.is_finite() && entry.demand >= Power(0.0),
                "Invalid demand value {} for hour {}",
                entry.demand.value(),
                entry.hour
            );
        }

        Ok(Self(entries))
    }

    /// Read the demand series from `demand.csv` in the given model directory.
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let file_path = model_dir.as_ref().join(DEMAND_FILE_NAME);
        let mut reader = csv::Reader::from_path(&file_path)
            .with_context(|| format!("Could not read {}", file_path.display()))?;
        let entries: Vec<DemandEntry> = reader
            .deserialize()
            .try_collect()
            .with_context(|| format!("Error reading {}", file_path.display()))?;

        Self::new(entries).with_context(|| format!("Invalid demand series in {DEMAND_FILE_NAME}"))
    }

    /// The number of sampled hours
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the series contains no entries (never true for a validated series)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the hourly entries in chronological order
    pub fn iter(&self) -> impl Iterator<Item = &DemandEntry> {
        self.0.iter()
    }

    /// The mean demand over the whole series
    pub fn mean(&self) -> Power {
        let total: f64 = self.0.iter().map(|entry| entry.demand.value()).sum();
        Power(total / self.0.len() as f64)
    }
}
