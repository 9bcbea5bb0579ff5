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
use anyhow::Result;
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;
use structopt::StructOpt;
use structopt::clap::AppSettings;

use crate::cmd_aggregate::{aggregate, AggregateArgs};
use crate::cmd_clean::{clean, CleanArgs};
use crate::cmd_fit_box::{fit_box, FitBoxArgs};
use crate::cmd_rasterize::{rasterize, RasterizeArgs};
use crate::cmd_run::RunArgs;

mod cmd_aggregate;
mod cmd_clean;
mod cmd_fit_box;
mod cmd_rasterize;
mod cmd_run;
mod config;
mod pipeline;

#[derive(StructOpt)]
struct Cli {

    #[structopt(long, default_value = "Info")]
    log_level: LevelFilter,

    #[structopt(subcommand)]  // Note that we mark a field as a subcommand
    cmd: Command
}

#[derive(StructOpt)]
enum Command {
    #[structopt(help="Rasterizes, cleans and aggregates damage polygons to the FORCE 10m grid")]
    Run(RunArgs),

    #[structopt(help="Burns polygons to an 8 bit raster, all touched pixels are 1")]
    Rasterize(RasterizeArgs),

    #[structopt(help="Sets no data to -9999 and negative values to 0, writes a compressed Float32 raster")]
    Clean(CleanArgs),

    #[structopt(help="Shrinks the first box in steps until it fits in the second",
                setting = AppSettings::AllowNegativeNumbers)]
    FitBox(FitBoxArgs),

    #[structopt(help="Average resampling onto a grid over a bounding box",
                setting = AppSettings::AllowNegativeNumbers)]
    Aggregate(AggregateArgs),
}

fn run() -> Result<()> {
    let args = Cli::from_args();

    SimpleLogger::new().with_level(args.log_level).init()?;

    match &args.cmd {
        Command::Run(r) => {
            cmd_run::run(r)?;
        },
        Command::Rasterize(r) => {
            rasterize(r)?;
        },
        Command::Clean(r) => {
            clean(r)?;
        },
        Command::FitBox(r) => {
            fit_box(r)?;
        },
        Command::Aggregate(r) => {
            aggregate(r)?;
        },
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
