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

use anyhow::{bail, Result};
use log::info;
use structopt::StructOpt;
use structopt::clap::AppSettings;

use geo_util::raster::{aggregate_to_grid, export_raster, AggregateOptions, ExportOptions, Raster,
                       DEFAULT_NO_DATA};
use geo_util::util::format_duration;
use geo_util::vector::BoundingBox;

#[derive(StructOpt)]
#[structopt(setting = AppSettings::AllowNegativeNumbers)]
pub struct AggregateArgs {

    #[structopt(parse(from_os_str), long)]
    input: PathBuf,

    #[structopt(parse(from_os_str), long)]
    output: PathBuf,

    /// left bottom right top in the target CRS
    #[structopt(long, number_of_values = 4, required = true)]
    bbox: Vec<f64>,

    #[structopt(long, default_value="10")]
    resolution: f64,

    #[structopt(long, default_value="3035")]
    epsg: u32,

    #[structopt(long, default_value="64")]
    chunk_size: usize,

    #[structopt(long, default_value="16")]
    num_workers: usize,

    #[structopt(long)]
    clean: bool,
}

/// Average resampling of the input onto the grid over --bbox, then exported compressed
pub fn aggregate(args: &AggregateArgs) -> Result<()> {
    let now = Instant::now();

    if args.bbox.len() != 4 {
        bail!("--bbox needs left bottom right top");
    }
    let bbox = BoundingBox::new(args.bbox[0], args.bbox[1], args.bbox[2], args.bbox[3]);

    let input = Raster::read(&args.input)?;

    let aggregated = aggregate_to_grid(&input, &bbox, &AggregateOptions {
        resolution: args.resolution,
        chunk_size: args.chunk_size,
        no_data_value: DEFAULT_NO_DATA,
        target_epsg: args.epsg,
    })?;

    export_raster(&aggregated, &args.output, &ExportOptions {
        chunk_size: args.chunk_size,
        num_workers: args.num_workers,
        no_data_value: DEFAULT_NO_DATA,
        overwrite: args.clean,
    })?;

    info!("Aggregated {:?} into {:?} (EPSG:{}) in {}", args.input, args.output, args.epsg, format_duration(now.elapsed()));

    Ok(())
}
