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

use geo_util::raster::{export_raster, open_damage_raster, ExportOptions, DEFAULT_NO_DATA, REFERENCE_EPSG};

#[derive(StructOpt)]
pub struct CleanArgs {

    #[structopt(parse(from_os_str), long)]
    input: PathBuf,

    #[structopt(parse(from_os_str), long)]
    output: PathBuf,

    #[structopt(long, default_value="64")]
    chunk_size: usize,

    #[structopt(long, default_value="16")]
    num_workers: usize,

    #[structopt(long)]
    clean: bool,
}

/// Replaces no data with -9999, sets negative values to 0 and writes the compressed result
pub fn clean(args: &CleanArgs) -> Result<()> {
    let info = open_damage_raster(&args.input, REFERENCE_EPSG, DEFAULT_NO_DATA)?;

    info!("Bounds in EPSG:{}: {}", REFERENCE_EPSG, info.bounds);

    export_raster(&info.raster, &args.output, &ExportOptions {
        chunk_size: args.chunk_size,
        num_workers: args.num_workers,
        no_data_value: info.no_data_value,
        overwrite: args.clean,
    })?;

    Ok(())
}
