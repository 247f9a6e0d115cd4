//! Code for project models.
//!
//! A model is a directory containing a `model.toml` file and an hourly `demand.csv` series. Every
//! section of the model file is optional; a missing `[solar]` or `[wind]` section falls back to
//! the reference parameter set, so an empty model file with a demand series is a complete,
//! runnable model. A section that is present must be a complete parameter set.
use crate::demand::DemandSeries;
use crate::finance::lcos::StorageParameters;
use crate::input::read_toml;
use crate::optimisation::SizingPolicy;
use crate::technology::{Technology, TechnologyParameters, validate_for_technology};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use strum::IntoEnumIterator;

const MODEL_FILE_NAME: &str = "model.toml";

/// Model definition
pub struct Model {
    /// Parameter sets for the generation technologies, in appraisal order
    pub technologies: IndexMap<Technology, TechnologyParameters>,
    /// Parameters for a battery system, if the project includes one
    pub storage: Option<StorageParameters>,
    /// Heuristics for the capacity-sizing problem
    pub sizing: SizingPolicy,
    /// The hourly demand series the plant is sized against
    pub demand: DemandSeries,
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
struct ModelFile {
    solar: Option<TechnologyParameters>,
    wind: Option<TechnologyParameters>,
    storage: Option<StorageParameters>,
    #[serde(default)]
    sizing: SizingPolicy,
}

impl ModelFile {
    /// Read a model file from the specified directory.
    fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelFile> {
        read_toml(&model_dir.as_ref().join(MODEL_FILE_NAME))
    }
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing the model file and demand series
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_file = ModelFile::from_path(&model_dir)?;

        let mut technologies = IndexMap::new();
        for technology in Technology::iter() {
            let params = match technology {
                Technology::Solar => &model_file.solar,
                Technology::Wind => &model_file.wind,
            };
            let params = params
                .clone()
                .unwrap_or_else(|| TechnologyParameters::reference(technology));
            validate_for_technology(&params, technology)?;
            technologies.insert(technology, params);
        }

        if let Some(storage) = &model_file.storage {
            storage
                .validate()
                .context("Invalid storage parameters")?;
        }

        let demand = DemandSeries::from_path(model_dir.as_ref())?;

        Ok(Model {
            technologies,
            storage: model_file.storage,
            sizing: model_file.sizing,
            demand,
        })
    }
}
