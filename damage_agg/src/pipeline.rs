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
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use geo_util::raster::{aggregate_to_grid, export_raster, open_damage_raster, rasterize_polygon_file,
                       AggregateOptions, ExportOptions, Raster};
use geo_util::util::format_duration;
use geo_util::vector::{fit_box_with_step, BoundingBox};

use crate::config::PipelineConfig;

#[derive(Debug)]
pub struct PipelineOutputs {
    pub damage_raster: PathBuf,
    pub cleaned_raster: PathBuf,
    pub aggregated_raster: PathBuf,
    pub fitted_box: BoundingBox,
}

/// Rasterize, clean, fit the reference box onto the raster, export the cleaned
/// raster then aggregate it to the 10m grid and export that
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutputs> {
    let now = Instant::now();

    config.validate()?;

    let export_options = ExportOptions {
        chunk_size: config.chunk_size,
        num_workers: config.num_workers,
        no_data_value: config.no_data_value,
        overwrite: config.overwrite,
    };

    if let (None, Some(input_vector)) = (&config.damage_raster, &config.input_vector) {
        info!("Rasterizing {:?} at resolution {}", input_vector, config.resolution);
        rasterize_polygon_file(input_vector, &config.raster_output, config.resolution,
                               config.fill_value, config.overwrite)
            .with_context(|| format!("Rasterizing {:?}", input_vector))?;
    }

    let damage_raster = config.damage_raster_path().to_path_buf();

    let info = open_damage_raster(&damage_raster, config.reference_epsg, config.no_data_value)
        .with_context(|| format!("Opening {:?}", damage_raster))?;

    let fitted_box = fit_box_with_step(&config.reference_bounds, &info.bounds, config.fit_step)?;
    info!("Aggregation box {} fitted from {} onto {}", fitted_box, config.reference_bounds, info.bounds);

    let cleaned_raster = config.cleaned_path();
    info!("Exporting cleaned raster to {:?}", cleaned_raster);
    export_raster(&info.raster, &cleaned_raster, &export_options)
        .with_context(|| format!("Exporting {:?}", cleaned_raster))?;

    let aggregate_options = AggregateOptions {
        resolution: config.target_resolution,
        chunk_size: config.chunk_size,
        no_data_value: config.no_data_value,
        target_epsg: config.reference_epsg,
    };

    let aggregated = {
        let cleaned = Raster::read(&cleaned_raster)?;
        aggregate_to_grid(&cleaned, &fitted_box, &aggregate_options)?
    };

    let aggregated_raster = config.aggregated_path();
    info!("Exporting aggregated raster to {:?}", aggregated_raster);
    export_raster(&aggregated, &aggregated_raster, &export_options)
        .with_context(|| format!("Exporting {:?}", aggregated_raster))?;

    info!("Pipeline finished in {}", format_duration(now.elapsed()));

    Ok(PipelineOutputs {
        damage_raster,
        cleaned_raster,
        aggregated_raster,
        fitted_box,
    })
}
