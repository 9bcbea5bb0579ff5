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

use anyhow::Result;
use log::{debug, info};
use structopt::StructOpt;

use geo_util::raster::rasterize_polygon_file;
use geo_util::util::format_duration;

#[derive(StructOpt)]
pub struct RasterizeArgs {

    #[structopt(parse(from_os_str), long)]
    input: PathBuf,

    #[structopt(parse(from_os_str), long)]
    output: PathBuf,

    #[structopt(long, default_value="1.0", help="Pixel size in the units of the input CRS")]
    resolution: f64,

    #[structopt(long, default_value="0", help="Value of pixels not touched by any polygon")]
    fill_value: u8,

    #[structopt(long)]
    clean: bool,
}

pub fn rasterize(args: &RasterizeArgs) -> Result<()> {
    let now = Instant::now();

    debug!("GDAL version: {}", gdal::version_info("--version"));

    let stats = rasterize_polygon_file(&args.input, &args.output, args.resolution, args.fill_value, args.clean)?;

    info!("Rasterized to {}x{} (cols x rows) in {}", stats.num_cols, stats.num_rows, format_duration(now.elapsed()));

    Ok(())
}
