/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use geo_util::raster::{DEFAULT_CHUNK_SIZE, DEFAULT_NO_DATA, DEFAULT_NUM_WORKERS, DEFAULT_TARGET_RESOLUTION, REFERENCE_EPSG};
use geo_util::vector::{BoundingBox, DEFAULT_FIT_STEP};

/// FORCE grid extent for Germany in EPSG:3035, needs expanding when working outside of Germany
pub const FORCE_GERMANY_BOUNDS: [f64; 4] = [4016026.363042, 2654919.607965, 4676026.363042001, 3554919.607965];

pub const CLEANED_RASTER_NAME: &str = "_vegetation_damaged_noneg_50cm.tif";
pub const AGGREGATED_RASTER_NAME: &str = "_vegetation_damaged_average_10m_FORCE.tif";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Polygons of damaged vegetation
    pub input_vector: Option<PathBuf>,

    /// Where the rasterized polygons are written
    pub raster_output: PathBuf,

    /// Existing damage raster, rasterizing is skipped when set
    pub damage_raster: Option<PathBuf>,

    /// Defaults to the directory of the damage raster
    pub output_dir: Option<PathBuf>,

    pub resolution: f64,
    pub fill_value: u8,
    pub chunk_size: usize,
    pub num_workers: usize,
    pub no_data_value: f64,

    pub target_resolution: f64,
    pub fit_step: f64,
    pub reference_epsg: u32,
    pub reference_bounds: BoundingBox,

    pub cleaned_name: String,
    pub aggregated_name: String,

    /// Replace existing outputs
    pub overwrite: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_vector: None,
            raster_output: PathBuf::from("vegetation_damaged.tif"),
            damage_raster: None,
            output_dir: None,
            resolution: 1.0,
            fill_value: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_workers: DEFAULT_NUM_WORKERS,
            no_data_value: DEFAULT_NO_DATA,
            target_resolution: DEFAULT_TARGET_RESOLUTION,
            fit_step: DEFAULT_FIT_STEP,
            reference_epsg: REFERENCE_EPSG,
            reference_bounds: BoundingBox::from_array(FORCE_GERMANY_BOUNDS),
            cleaned_name: CLEANED_RASTER_NAME.to_string(),
            aggregated_name: AGGREGATED_RASTER_NAME.to_string(),
            overwrite: false,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<PipelineConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading config {:?}", path))?;
        Self::parse(&text).with_context(|| format!("Parsing config {:?}", path))
    }

    pub fn parse(text: &str) -> Result<PipelineConfig> {
        let config: PipelineConfig = toml::from_str(text)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_vector.is_none() && self.damage_raster.is_none() {
            bail!("Either input_vector or damage_raster must be set");
        }
        if !self.reference_bounds.is_finite() || self.reference_bounds.is_empty() {
            bail!("Reference bounds {} are not a valid box", self.reference_bounds);
        }
        Ok(())
    }

    /// Raster the cleaning starts from
    pub fn damage_raster_path(&self) -> &Path {
        self.damage_raster.as_deref().unwrap_or(&self.raster_output)
    }

    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(d) => d.clone(),
            None => self.damage_raster_path().parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir().join(&self.cleaned_name)
    }

    pub fn aggregated_path(&self) -> PathBuf {
        self.output_dir().join(&self.aggregated_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = PipelineConfig::parse("").unwrap();
        assert_eq!(c, PipelineConfig::default());

        assert_eq!(c.chunk_size, 64);
        assert_eq!(c.num_workers, 16);
        assert_eq!(c.no_data_value, -9999.0);
        assert_eq!(c.reference_epsg, 3035);
        assert_eq!(c.reference_bounds.to_array(), FORCE_GERMANY_BOUNDS);

        assert_eq!(c.cleaned_path(), PathBuf::from("_vegetation_damaged_noneg_50cm.tif"));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_parse() {
        let c = PipelineConfig::parse(r#"
            input_vector = "data/combined_shapefile_2018.shp"
            raster_output = "out/combined_shapefile_2018.tif"
            chunk_size = 32
            reference_bounds = { left = 0.0, bottom = 0.0, right = 100.0, top = 50.0 }
        "#).unwrap();

        assert_eq!(c.chunk_size, 32);
        assert_eq!(c.resolution, 1.0);
        assert_eq!(c.reference_bounds, BoundingBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(c.aggregated_path(), PathBuf::from("out/_vegetation_damaged_average_10m_FORCE.tif"));
        c.validate().unwrap();

        let c = PipelineConfig { damage_raster: Some("d/veg.tif".into()), output_dir: Some("o".into()), ..c };
        assert_eq!(c.damage_raster_path(), Path::new("d/veg.tif"));
        assert_eq!(c.cleaned_path(), PathBuf::from("o/_vegetation_damaged_noneg_50cm.tif"));
    }

    #[test]
    fn test_unknown_field() {
        assert!(PipelineConfig::parse("chunksize = 32").is_err());
    }
}
