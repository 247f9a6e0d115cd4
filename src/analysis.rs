//! The top-level analysis pipeline for a model run.
//!
//! A run sizes the generation capacities against the demand series, appraises each sized
//! technology with the discounted-cash-flow engine, prices any battery system and writes the
//! results to the output folder.
use crate::finance::lcoe::calculate_lcoe;
use crate::finance::lcos::calculate_lcos;
use crate::model::Model;
use crate::optimisation::optimise_generation_capacity;
use crate::output::{DataWriter, write_metadata, write_storage_cost};
use crate::technology::Technology;
use crate::units::Capacity;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Run the analysis for the given model.
///
/// # Arguments
///
/// * `model` - The model to run
/// * `model_path` - The path to the model folder (recorded in the run metadata)
/// * `output_path` - The folder where output files will be saved
/// * `save_dispatch` - Whether to also save the estimated hourly dispatch
pub fn run(
    model: &Model,
    model_path: &Path,
    output_path: &Path,
    save_dispatch: bool,
) -> Result<()> {
    write_metadata(output_path, model_path).context("Failed to write metadata")?;

    let solar_cuf = model.technologies[&Technology::Solar].cuf;
    let wind_cuf = model.technologies[&Technology::Wind].cuf;
    let outcome = optimise_generation_capacity(&model.demand, solar_cuf, wind_cuf, &model.sizing)
        .context("Capacity sizing failed")?;
    info!(
        "Sized capacities: solar {:.2}, wind {:.2}",
        outcome.solar_capacity.value(),
        outcome.wind_capacity.value()
    );

    let mut writer = DataWriter::create(output_path, save_dispatch)?;
    writer.write_sizing(&outcome)?;

    // Appraise each technology at its sized capacity. A technology the sizing excluded has no
    // plant to appraise.
    let mut parameters = model.technologies.clone();
    parameters.retain(|&technology, params| {
        let capacity = match technology {
            Technology::Solar => outcome.solar_capacity,
            Technology::Wind => outcome.wind_capacity,
        };
        if capacity > Capacity(0.0) {
            params.plant_size = capacity;
            true
        } else {
            info!("{technology} was excluded by the capacity sizing; skipping its appraisal");
            false
        }
    });

    let appraisals = calculate_lcoe(&parameters)?;
    for appraisal in appraisals.values() {
        info!("{} LCOE: {}", appraisal.technology, appraisal.lcoe.value());
        writer.write_appraisal(appraisal)?;
    }

    if let Some(storage) = &model.storage {
        let lcos = calculate_lcos(storage)?;
        info!("Storage LCOS: {}", lcos.value());
        write_storage_cost(output_path, lcos)?;
    }

    writer.flush()?;
    info!("Analysis complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::{DemandEntry, DemandSeries};
    use crate::finance::lcos::StorageParameters;
    use crate::optimisation::SizingPolicy;
    use crate::technology::TechnologyParameters;
    use crate::units::Power;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    fn test_model(storage: Option<StorageParameters>) -> Model {
        let entries = (0..24)
            .map(|hour| DemandEntry {
                hour,
                demand: Power(100.0),
            })
            .collect();
        Model {
            technologies: IndexMap::from([
                (Technology::Solar, TechnologyParameters::reference_solar()),
                (Technology::Wind, TechnologyParameters::reference_wind()),
            ]),
            storage,
            sizing: SizingPolicy::default(),
            demand: DemandSeries::new(entries).unwrap(),
        }
    }

    #[test]
    fn test_run() {
        let model = test_model(Some(StorageParameters::reference()));
        let dir = tempdir().unwrap();
        run(&model, Path::new("model"), dir.path(), true).unwrap();

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
        ] {
            assert!(dir.path().join(file_name).is_file(), "{file_name}");
        }
    }

    #[test]
    fn test_run_without_storage() {
        let model = test_model(None);
        let dir = tempdir().unwrap();
        run(&model, Path::new("model"), dir.path(), false).unwrap();

        assert!(!dir.path().join("storage_cost.csv").exists());
        assert!(!dir.path().join("dispatch.csv").exists());
    }
}
