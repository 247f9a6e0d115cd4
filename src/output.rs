//! The module responsible for writing output data to disk.
use crate::finance::lcoe::TechnologyAppraisal;
use crate::finance::round2;
use crate::optimisation::SizingOutcome;
use crate::technology::Technology;
use crate::units::{Capacity, Money, MoneyPerEnergy, Power};
use anyhow::{Context, Result, bail};
use csv;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "replan_results";

/// The output file name for the sized capacities
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// The output file name for the per-technology appraisal summary
const SUMMARY_FILE_NAME: &str = "lcoe_summary.csv";

/// The output file name for the per-year cost breakdown
const BREAKDOWN_FILE_NAME: &str = "cost_breakdown.csv";

/// The output file name for the debt amortisation schedule
const DEBT_FILE_NAME: &str = "debt_schedule.csv";

/// The output file name for the working-capital schedule
const WORKING_CAPITAL_FILE_NAME: &str = "working_capital.csv";

/// The output file name for the asset-value schedule
const ASSET_VALUES_FILE_NAME: &str = "asset_values.csv";

/// The output file name for the storage cost
const STORAGE_FILE_NAME: &str = "storage_cost.csv";

/// The output file name for the estimated hourly dispatch
const DISPATCH_FILE_NAME: &str = "dispatch.csv";

/// Get the default output folder for the model at the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for a model run.
///
/// If the directory already exists it is only removed and recreated when `overwrite` is true.
///
/// # Returns
///
/// Whether an existing directory was overwritten.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let already_exists = output_dir.is_dir();
    if already_exists {
        if !overwrite {
            bail!(
                "Output directory {} already exists (pass --overwrite to replace it)",
                output_dir.display()
            );
        }

        fs::remove_dir_all(output_dir)?;
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(already_exists)
}

/// A row of the capacities CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapacityRow {
    technology: Technology,
    capacity: Capacity,
}

/// A row of the appraisal summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    technology: Technology,
    lcoe: MoneyPerEnergy,
    gross_capital_cost: Money,
    net_capital_cost: Money,
    equity: Money,
    debt: Money,
}

impl SummaryRow {
    /// Create a new [`SummaryRow`], rounding the capital figures for reporting
    fn new(appraisal: &TechnologyAppraisal) -> Self {
        Self {
            technology: appraisal.technology,
            lcoe: appraisal.lcoe,
            gross_capital_cost: round2(appraisal.capital.gross_capital_cost),
            net_capital_cost: round2(appraisal.capital.net_capital_cost),
            equity: round2(appraisal.capital.equity),
            debt: round2(appraisal.capital.debt),
        }
    }
}

/// The technology column prepended to per-year schedule rows
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TechnologyColumn {
    technology: Technology,
}

/// A row of the storage cost CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct StorageCostRow {
    lcos: MoneyPerEnergy,
}

/// A row of the estimated hourly dispatch CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DispatchRow {
    hour: u32,
    demand: Power,
    solar_generation: Power,
    wind_generation: Power,
    total_generation: Power,
}

/// An object for writing the results of a model run to CSV files
pub struct DataWriter {
    capacities_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
    breakdown_writer: csv::Writer<File>,
    debt_writer: csv::Writer<File>,
    working_capital_writer: csv::Writer<File>,
    asset_values_writer: csv::Writer<File>,
    dispatch_writer: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_dispatch` - Whether to also save the estimated hourly dispatch
    pub fn create(output_path: &Path, save_dispatch: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let dispatch_writer = if save_dispatch {
            Some(new_writer(DISPATCH_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            capacities_writer: new_writer(CAPACITIES_FILE_NAME)?,
            summary_writer: new_writer(SUMMARY_FILE_NAME)?,
            breakdown_writer: new_writer(BREAKDOWN_FILE_NAME)?,
            debt_writer: new_writer(DEBT_FILE_NAME)?,
            working_capital_writer: new_writer(WORKING_CAPITAL_FILE_NAME)?,
            asset_values_writer: new_writer(ASSET_VALUES_FILE_NAME)?,
            dispatch_writer,
        })
    }

    /// Write the sized capacities (and, optionally, the estimated dispatch) to CSV files
    pub fn write_sizing(&mut self, outcome: &SizingOutcome) -> Result<()> {
        for (technology, capacity) in [
            (Technology::Solar, outcome.solar_capacity),
            (Technology::Wind, outcome.wind_capacity),
        ] {
            self.capacities_writer.serialize(CapacityRow {
                technology,
                capacity,
            })?;
        }

        if let Some(wtr) = &mut self.dispatch_writer {
            for hour in &outcome.dispatch {
                wtr.serialize(DispatchRow {
                    hour: hour.hour,
                    demand: hour.demand,
                    solar_generation: hour.solar_generation,
                    wind_generation: hour.wind_generation,
                    total_generation: hour.total_generation,
                })?;
            }
        }

        Ok(())
    }

    /// Write the appraisal for one technology to the summary and schedule CSV files
    pub fn write_appraisal(&mut self, appraisal: &TechnologyAppraisal) -> Result<()> {
        let technology = TechnologyColumn {
            technology: appraisal.technology,
        };

        self.summary_writer.serialize(SummaryRow::new(appraisal))?;
        for year in &appraisal.years {
            self.breakdown_writer.serialize((&technology, year))?;
        }
        for year in &appraisal.debt_schedule {
            self.debt_writer.serialize((&technology, year))?;
        }
        for year in &appraisal.working_capital {
            self.working_capital_writer.serialize((&technology, year))?;
        }
        for year in &appraisal.asset_values {
            self.asset_values_writer.serialize((&technology, year))?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.capacities_writer.flush()?;
        self.summary_writer.flush()?;
        self.breakdown_writer.flush()?;
        self.debt_writer.flush()?;
        self.working_capital_writer.flush()?;
        self.asset_values_writer.flush()?;
        if let Some(wtr) = &mut self.dispatch_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

/// Write the levelized cost of storage to its own CSV file
pub fn write_storage_cost(output_path: &Path, lcos: MoneyPerEnergy) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path.join(STORAGE_FILE_NAME))?;
    writer.serialize(StorageCostRow { lcos })?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimisation::HourlyDispatch;
    use itertools::{Itertools, assert_equal};
    use std::iter;
    use tempfile::tempdir;

    fn sizing_outcome() -> SizingOutcome {
        SizingOutcome {
            solar_capacity: Capacity(500.0),
            wind_capacity: Capacity(0.0),
            dispatch: vec![HourlyDispatch {
                hour: 1,
                demand: Power(100.0),
                solar_generation: Power(100.0),
                wind_generation: Power(0.0),
                total_generation: Power(100.0),
            }],
        }
    }

    #[test]
    fn test_write_sizing() {
        let dir = tempdir().unwrap();

        // Write the sized capacities
        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_sizing(&sizing_outcome()).unwrap();
            writer.flush().unwrap();
        }

        // Read back and compare
        let records: Vec<CapacityRow> =
            csv::Reader::from_path(dir.path().join(CAPACITIES_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_equal(
            records,
            [
                CapacityRow {
                    technology: Technology::Solar,
                    capacity: Capacity(500.0),
                },
                CapacityRow {
                    technology: Technology::Wind,
                    capacity: Capacity(0.0),
                },
            ],
        );

        // No dispatch file should have been written
        assert!(!dir.path().join(DISPATCH_FILE_NAME).exists());
    }

    #[test]
    fn test_write_sizing_with_dispatch() {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), true).unwrap();
            writer.write_sizing(&sizing_outcome()).unwrap();
            writer.flush().unwrap();
        }

        let records: Vec<DispatchRow> = csv::Reader::from_path(dir.path().join(DISPATCH_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_equal(
            records,
            iter::once(DispatchRow {
                hour: 1,
                demand: Power(100.0),
                solar_generation: Power(100.0),
                wind_generation: Power(0.0),
                total_generation: Power(100.0),
            }),
        );
    }

    #[test]
    fn test_write_appraisal() {
        use crate::finance::lcoe::appraise_technology;
        use crate::technology::TechnologyParameters;

        let params = TechnologyParameters::reference_solar();
        let appraisal = appraise_technology(Technology::Solar, &params).unwrap();
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_appraisal(&appraisal).unwrap();
            writer.flush().unwrap();
        }

        // The summary has one row per appraisal
        let records: Vec<SummaryRow> = csv::Reader::from_path(dir.path().join(SUMMARY_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_equal(records, iter::once(SummaryRow::new(&appraisal)));

        // The schedules have one row per year of plant life
        for file_name in [
            BREAKDOWN_FILE_NAME,
            DEBT_FILE_NAME,
            WORKING_CAPITAL_FILE_NAME,
            ASSET_VALUES_FILE_NAME,
        ] {
            let count = csv::Reader::from_path(dir.path().join(file_name))
                .unwrap()
                .into_records()
                .count();
            assert_eq!(count, params.plant_life as usize, "{file_name}");
        }
    }

    #[test]
    fn test_write_storage_cost() {
        let dir = tempdir().unwrap();
        write_storage_cost(dir.path(), MoneyPerEnergy(0.92)).unwrap();

        let records: Vec<StorageCostRow> =
            csv::Reader::from_path(dir.path().join(STORAGE_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_equal(
            records,
            iter::once(StorageCostRow {
                lcos: MoneyPerEnergy(0.92),
            }),
        );
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("out");

        // First creation: nothing to overwrite
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Existing directory without the overwrite flag is an error
        assert!(create_output_directory(&output_dir, false).is_err());

        // With the flag, the old contents are removed
        fs::write(output_dir.join("stale.csv"), "stale").unwrap();
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("stale.csv").exists());
    }
}
