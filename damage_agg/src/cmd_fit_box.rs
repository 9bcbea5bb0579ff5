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
use anyhow::{bail, Result};
use structopt::StructOpt;
use structopt::clap::AppSettings;

use geo_util::vector::{fit_box_with_step, BoundingBox};

#[derive(StructOpt)]
#[structopt(setting = AppSettings::AllowNegativeNumbers)]
pub struct FitBoxArgs {
    /// left bottom right top of the box to shrink, then left bottom right top of the containing box
    #[structopt(required = true)]
    coords: Vec<f64>,

    #[structopt(long, default_value = "10")]
    step: f64,
}

/// Prints the fitted box as `left bottom right top`
pub fn fit_box(args: &FitBoxArgs) -> Result<BoundingBox> {
    if args.coords.len() != 8 {
        bail!("Expected 8 coordinates (2 boxes of left bottom right top), got {}", args.coords.len());
    }

    let c = &args.coords;
    let box1 = BoundingBox::new(c[0], c[1], c[2], c[3]);
    let box2 = BoundingBox::new(c[4], c[5], c[6], c[7]);

    let fitted = fit_box_with_step(&box1, &box2, args.step)?;

    println!("{} {} {} {}", fitted.left, fitted.bottom, fitted.right, fitted.top);

    Ok(fitted)
}
