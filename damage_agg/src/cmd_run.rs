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

use anyhow::Result;
use log::info;
use structopt::StructOpt;

use crate::config::PipelineConfig;
use crate::pipeline::run_pipeline;

#[derive(StructOpt)]
pub struct RunArgs {
    /// TOML pipeline configuration, flags below override it
    #[structopt(parse(from_os_str), long)]
    config: Option<PathBuf>,

    /// Polygon vector file (shapefile, GeoJSON, GPKG, ...)
    #[structopt(parse(from_os_str), long)]
    input: Option<PathBuf>,

    /// Where the rasterized polygons are written
    #[structopt(parse(from_os_str), long)]
    raster_output: Option<PathBuf>,

    /// Use an existing damage raster instead of rasterizing
    #[structopt(parse(from_os_str), long)]
    damage_raster: Option<PathBuf>,

    #[structopt(parse(from_os_str), long)]
    output_dir: Option<PathBuf>,

    #[structopt(long)]
    resolution: Option<f64>,

    #[structopt(long, help="Block and tile size, a multiple of 16.  Decrease for small rasters")]
    chunk_size: Option<usize>,

    #[structopt(long)]
    num_workers: Option<usize>,

    /// Replace existing outputs
    #[structopt(long)]
    clean: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(i) = &self.input {
            config.input_vector = Some(i.clone());
        }
        if let Some(r) = &self.raster_output {
            config.raster_output = r.clone();
        }
        if let Some(d) = &self.damage_raster {
            config.damage_raster = Some(d.clone());
        }
        if let Some(d) = &self.output_dir {
            config.output_dir = Some(d.clone());
        }
        if let Some(r) = self.resolution {
            config.resolution = r;
        }
        if let Some(c) = self.chunk_size {
            config.chunk_size = c;
        }
        if let Some(n) = self.num_workers {
            config.num_workers = n;
        }
        if self.clean {
            config.overwrite = true;
        }
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    args.apply(&mut config);

    let outputs = run_pipeline(&config)?;

    info!("Cleaned raster: {:?}", outputs.cleaned_raster);
    info!("Aggregated raster: {:?}", outputs.aggregated_raster);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = PipelineConfig::parse("chunk_size = 32\nresolution = 0.5").unwrap();

        let args = RunArgs::from_iter(&["run", "--chunk-size", "128", "--input", "a.shp", "--clean"]);
        args.apply(&mut config);

        assert_eq!(config.chunk_size, 128);
        assert_eq!(config.resolution, 0.5);
        assert_eq!(config.input_vector, Some(PathBuf::from("a.shp")));
        assert!(config.overwrite);
    }
}
